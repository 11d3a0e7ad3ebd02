use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Malformed table: {0}")]
    Table(String),

    #[error("Channel API error: {reason}")]
    Source { channel: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl PipelineError {
    pub fn source_error(channel: &str, reason: impl ToString) -> Self {
        PipelineError::Source {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}
