// Local catalog file - same JSON shape as the served one
use async_trait::async_trait;
use mserv_api::CatalogDocument;
use std::path::PathBuf;

use crate::{
    catalog::{Catalog, CatalogSource},
    Error, Result,
};

pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch(&self) -> Result<Catalog> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::LoadFailure(format!("{}: {}", self.path.display(), e)))?;

        let document = CatalogDocument::from_json(&contents)
            .map_err(|e| Error::LoadFailure(format!("{}: {}", self.path.display(), e)))?;

        Ok(Catalog::from_document(document))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
