// Storage error type
// Decision: uniqueness conflicts are a distinct variant so callers can map
// them to a conflict response without matching on engine error strings

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column (username or session token) already holds this value.
    #[error("{0} already in use")]
    Duplicate(&'static str),

    /// Any other engine failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}
