//! Video ingestion and delivery

pub mod delivery;
pub mod faststart;
pub mod inspector;
pub mod orchestration;

pub use delivery::{DeliveryResolver, DEFAULT_PLAYBACK_TTL};
pub use faststart::{fast_start_output_path, FastStartRemuxer, FfmpegRemuxer};
pub use inspector::{parse_probe_output, FfprobeInspector, MediaProbe, StreamInfo, StreamInspector};
pub use orchestration::{IngestOutcome, IngestRequest, IngestionOrchestrator};
