//! Tubely Core Library
//!
//! Domain models, the unified error taxonomy, configuration and the capability
//! traits shared by the storage and processing crates.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;

// Re-export commonly used types
pub use capabilities::{Clock, EntropyError, OsRandom, RandomSource, SystemClock};
pub use config::{IngestConfig, MAX_PRESIGN_TTL_SECS};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use models::{AspectRatio, IngestStage, IngestState, Locator, MediaType, Video};
pub use repository::{InMemoryVideoRepository, VideoRepository};
