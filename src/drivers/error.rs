use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed sample line {line:?}: {reason}")]
    MalformedLine { line: String, reason: String },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("feature dimension mismatch: model expects {expected} values, got {actual}; the window length or channel layout changed since training")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("giving up after {limit} consecutive malformed lines")]
    TooManyMalformed { limit: usize },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{} is missing required columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("label {0:?} is not known to the model")]
    UnknownLabel(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
impl From<serialport::Error> for PipelineError {
    fn from(value: serialport::Error) -> Self {
        PipelineError::Transport(value.to_string())
    }
}
impl PipelineError {
    /// Errors that end a live stream but leave the pipeline usable.
    pub fn is_transport(&self) -> bool {
        matches!(self, PipelineError::Transport(_) | PipelineError::Io(_))
    }
}
