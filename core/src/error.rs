use thiserror::Error;

#[derive(Error, Debug)]
pub enum EconomyError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error in {path}: {reason}")]
    Config { path: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EconomyResult<T> = Result<T, EconomyError>;
