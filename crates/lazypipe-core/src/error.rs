use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction parameter (capacity, limit, step, empty required input).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A control verb was used outside its legal context. Always fatal for the run.
    #[error("Structural fault: {0}")]
    Structural(String),

    /// A strategy was wrapped with the wrong arity or shape.
    #[error("Strategy contract violated: {0}")]
    Contract(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl Error {
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Structural(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
