//! Tubely Media Processing Library
//!
//! The video ingestion pipeline (stage → inspect → remux → upload → record)
//! and the delivery path that turns stored locators into playback URLs.

pub mod process;
pub mod staging;
pub mod video;

// Re-export commonly used types
pub use staging::{stage_upload, StagedFile};
pub use video::{
    fast_start_output_path, DeliveryResolver, FastStartRemuxer, FfmpegRemuxer, FfprobeInspector,
    IngestOutcome, IngestRequest, IngestionOrchestrator, MediaProbe, StreamInfo, StreamInspector,
    DEFAULT_PLAYBACK_TTL,
};
