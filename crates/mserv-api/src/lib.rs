// HTTP side of the dashboard: fetching the service catalog
pub mod catalog;
pub mod retry;

// Re-export common types
pub use catalog::{
    CatalogClient, CatalogDocument, CatalogError, CategoryEntry, ServiceEntry,
    DEFAULT_CATALOG_URL,
};
pub use retry::RetryConfig;
