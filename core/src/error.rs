use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Complaint '{id}' not found")]
    RecordNotFound { id: String },

    #[error("Analysis for complaint '{id}' is not available yet")]
    AnalysisPending { id: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
