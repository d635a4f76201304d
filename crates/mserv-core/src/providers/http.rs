// HTTP catalog source - bridges the API client with CatalogSource
use async_trait::async_trait;
use mserv_api::{CatalogClient, RetryConfig};

use crate::{
    catalog::{Catalog, CatalogSource},
    config::CatalogConfig,
    Result,
};

/// Wrapper around CatalogClient that implements CatalogSource
pub struct HttpCatalogSource {
    client: CatalogClient,
}

impl HttpCatalogSource {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let client = CatalogClient::with_timeout(config.url.clone(), config.timeout())?
            .with_retry_config(RetryConfig::with_retries(config.retries));
        Ok(Self::new(client))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Catalog> {
        let document = self.client.fetch().await?;
        Ok(Catalog::from_document(document))
    }

    fn describe(&self) -> String {
        self.client.url().to_string()
    }
}
