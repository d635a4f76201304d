use crate::models::{Category, Service};
use crate::Result;
use mserv_api::CatalogDocument;
use std::sync::Arc;
use tracing::{info, warn};

/// The session's services and categories. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    services: Vec<Service>,
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(services: Vec<Service>, categories: Vec<Category>) -> Self {
        Self {
            services,
            categories,
        }
    }

    pub fn from_document(document: CatalogDocument) -> Self {
        Self {
            services: document
                .default_services
                .into_iter()
                .map(Service::from)
                .collect(),
            categories: document.categories.into_iter().map(Category::from).collect(),
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Services tagged with `category_id`, in catalog order
    pub fn services_in<'a>(&'a self, category_id: &'a str) -> impl Iterator<Item = &'a Service> {
        self.services
            .iter()
            .filter(move |s| s.category.as_deref() == Some(category_id))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Somewhere a catalog can be loaded from
///
/// HTTP in production, a local file for offline use, fakes in tests.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Catalog>;

    /// Human-readable origin, for logs and error messages
    fn describe(&self) -> String;
}

/// Holds the current catalog
///
/// A load either swaps in a complete new catalog or leaves the old one alone,
/// so readers never observe a half-loaded state.
#[derive(Debug, Default)]
pub struct CatalogStore {
    catalog: Arc<Catalog>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Fetch from `source` and replace the catalog. Returns the service count.
    ///
    /// On failure the previous catalog stays in place and the error goes back
    /// to the caller; there is no retry at this level.
    pub async fn load(&mut self, source: &dyn CatalogSource) -> Result<usize> {
        let fetched = source.fetch().await;
        self.apply(&source.describe(), fetched)
    }

    /// Second half of `load`, for callers that await the fetch themselves
    pub fn apply(&mut self, origin: &str, fetched: Result<Catalog>) -> Result<usize> {
        match fetched {
            Ok(catalog) => {
                let count = catalog.len();
                info!(
                    "{} services loaded from {} ({} categories)",
                    count,
                    origin,
                    catalog.categories().len()
                );
                self.catalog = Arc::new(catalog);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load catalog from {}: {}", origin, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct FixedSource(Catalog);

    #[async_trait::async_trait]
    impl CatalogSource for FixedSource {
        async fn fetch(&self) -> Result<Catalog> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixture".to_string()
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch(&self) -> Result<Catalog> {
            Err(Error::LoadFailure("connection refused".to_string()))
        }

        fn describe(&self) -> String {
            "nowhere".to_string()
        }
    }

    fn sample() -> Catalog {
        let doc = CatalogDocument::from_json(
            r#"{
                "default_services": [
                    {"id": "jellyfin", "name": "Jellyfin", "description": "Media", "url": "jf.lan", "category": "media"},
                    {"id": "sonarr", "name": "Sonarr", "description": "Series", "url": "sonarr.lan", "category": "media"},
                    {"id": "gitea", "name": "Gitea", "description": "Git", "url": "git.lan", "category": "dev"}
                ],
                "categories": [
                    {"id": "dev", "name": "Dev", "icon": "code"},
                    {"id": "media", "name": "Media", "icon": "film"}
                ]
            }"#,
        )
        .unwrap();
        Catalog::from_document(doc)
    }

    #[test]
    fn test_lookups() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.service("gitea").unwrap().name, "Gitea");
        assert!(catalog.service("nope").is_none());
        assert_eq!(catalog.category("media").unwrap().icon, "film");

        let media: Vec<_> = catalog.services_in("media").map(|s| s.id.as_str()).collect();
        assert_eq!(media, vec!["jellyfin", "sonarr"]);
    }

    #[tokio::test]
    async fn test_load_replaces_catalog() {
        let mut store = CatalogStore::new();
        assert!(store.catalog().is_empty());

        let count = store.load(&FixedSource(sample())).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.catalog(), &sample());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_catalog() {
        let mut store = CatalogStore::new();
        store.load(&FixedSource(sample())).await.unwrap();
        let before = store.catalog().clone();

        let result = store.load(&FailingSource).await;
        assert!(matches!(result, Err(Error::LoadFailure(_))));
        assert_eq!(store.catalog(), &before);
    }

    #[test]
    fn test_apply_fetched_result() {
        let mut store = CatalogStore::new();
        assert_eq!(store.apply("fixture", Ok(sample())).unwrap(), 3);

        let result = store.apply("fixture", Err(Error::LoadFailure("timeout".into())));
        assert!(result.is_err());
        assert_eq!(store.catalog(), &sample());
    }

    #[tokio::test]
    async fn test_failed_first_load_stays_empty() {
        let mut store = CatalogStore::new();
        assert!(store.load(&FailingSource).await.is_err());
        assert!(store.catalog().is_empty());
        assert!(store.catalog().categories().is_empty());
    }
}
