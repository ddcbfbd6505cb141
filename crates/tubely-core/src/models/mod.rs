pub mod aspect_ratio;
pub mod locator;
pub mod media_type;
pub mod pipeline;
pub mod video;

pub use aspect_ratio::AspectRatio;
pub use locator::Locator;
pub use media_type::MediaType;
pub use pipeline::{IngestStage, IngestState};
pub use video::Video;
