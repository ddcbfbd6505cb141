use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stage of the ingestion pipeline a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStage {
    Staging,
    Inspection,
    Remux,
    Upload,
    Recording,
}

impl Display for IngestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IngestStage::Staging => write!(f, "staging"),
            IngestStage::Inspection => write!(f, "inspection"),
            IngestStage::Remux => write!(f, "remux"),
            IngestStage::Upload => write!(f, "upload"),
            IngestStage::Recording => write!(f, "recording"),
        }
    }
}

/// States an ingestion run moves through, strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestState {
    Received,
    Staged,
    Inspected,
    Remuxed,
    Uploaded,
    Recorded,
    Failed(IngestStage),
}

impl Display for IngestState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IngestState::Received => write!(f, "received"),
            IngestState::Staged => write!(f, "staged"),
            IngestState::Inspected => write!(f, "inspected"),
            IngestState::Remuxed => write!(f, "remuxed"),
            IngestState::Uploaded => write!(f, "uploaded"),
            IngestState::Recorded => write!(f, "recorded"),
            IngestState::Failed(stage) => write!(f, "failed({})", stage),
        }
    }
}
