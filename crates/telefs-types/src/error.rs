use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The object name breaks the naming rules.
    #[error("invalid object name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The object name collides with the reserved catalog name.
    #[error("object name {0:?} is reserved for the catalog")]
    ReservedName(String),
}
