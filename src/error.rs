use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum IfcError {
    #[error("Invalid hex string `{0}`")]
    InvalidHex(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Prime generation exhausted after `{0}` attempts")]
    RetriesExhausted(usize),

    #[error("{0}")]
    ConfigFailed(String),

    #[error("OAEP self check failed: {0}")]
    SelfCheckFailed(String),
}
