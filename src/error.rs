use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConformityError {
    #[error("Malformed specification document: {0}")]
    Extraction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConformityError>;
