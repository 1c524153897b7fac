use telefs_catalog::CatalogError;
use telefs_transport::TransportError;
use telefs_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("object name {0:?} is reserved for the catalog")]
    ReservedName(String),

    #[error("invalid object name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("{operation} is not supported by telefs objects")]
    Unsupported { operation: &'static str },

    #[error("object not listed: {0}")]
    NotListed(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<TypeError> for FsError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::ReservedName(name) => FsError::ReservedName(name),
            TypeError::InvalidName { name, reason } => FsError::InvalidName { name, reason },
        }
    }
}

impl FsError {
    /// Whether the channel rejected our credentials, at any layer.
    pub fn is_auth(&self) -> bool {
        match self {
            FsError::Transport(TransportError::Auth(_)) => true,
            FsError::Catalog(e) => e.is_auth(),
            _ => false,
        }
    }

    /// Whether the error is the explicit refusal of an unsupported
    /// operation, as opposed to a failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, FsError::Unsupported { .. })
    }
}

pub type FsResult<T> = Result<T, FsError>;
