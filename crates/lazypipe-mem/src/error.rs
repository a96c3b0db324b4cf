use thiserror::Error;

/// Result type local to lazypipe-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid capacity for {what}: {value} (must be at least 1)")]
    InvalidCapacity { what: &'static str, value: usize },
}

pub(crate) fn require_capacity(what: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        Err(Error::InvalidCapacity { what, value })
    } else {
        Ok(())
    }
}
