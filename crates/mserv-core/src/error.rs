use thiserror::Error;

/// All the ways the dashboard core can fail
///
/// Nothing here is fatal to the UI: a failed load leaves the previous catalog
/// in place, a failed write leaves the previous favorites in place.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog load failed: {0}")]
    LoadFailure(String),

    #[error("Storage operation failed: {0}")]
    StorageError(#[from] mserv_cache::StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<mserv_api::CatalogError> for Error {
    fn from(err: mserv_api::CatalogError) -> Self {
        Error::LoadFailure(err.to_string())
    }
}
