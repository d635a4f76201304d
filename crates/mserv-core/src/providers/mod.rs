// Catalog sources - where the service list comes from
pub mod file;
pub mod http;

pub use file::FileCatalogSource;
pub use http::HttpCatalogSource;

use crate::{catalog::CatalogSource, config::CatalogConfig, Result};

/// Pick the source the config asks for: a local file wins over the URL
pub fn source_from_config(config: &CatalogConfig) -> Result<Box<dyn CatalogSource>> {
    match &config.path {
        Some(path) => Ok(Box::new(FileCatalogSource::new(path.clone()))),
        None => Ok(Box::new(HttpCatalogSource::from_config(config)?)),
    }
}
