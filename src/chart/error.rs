use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid chart config: {0}")]
    InvalidConfig(String),

    #[error("invalid section {index}: {reason}")]
    InvalidSection { index: usize, reason: String },

    #[error("invalid color {0:?}, expected #RRGGBB or #RGB")]
    InvalidColor(String),

    #[error("failed to parse chart: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read chart file: {0}")]
    Io(#[from] std::io::Error),
}
