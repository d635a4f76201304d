use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

/// Where the dashboard served its catalog from
pub const DEFAULT_CATALOG_URL: &str = "http://localhost/config/services.json";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Catalog request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Malformed catalog: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl CatalogError {
    /// Transport hiccups and 5xx/429/408 are worth another try; a bad body is not
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::RequestFailed { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            CatalogError::Timeout => true,
            CatalogError::NetworkError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            CatalogError::ParseError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// The catalog document as served
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogDocument {
    #[serde(default)]
    pub default_services: Vec<ServiceEntry>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

impl CatalogDocument {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// Fetches the static catalog document over HTTP
pub struct CatalogClient {
    client: reqwest::Client,
    url: String,
    retry_config: RetryConfig,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, None)
    }

    /// `timeout` bounds the whole request; `None` waits for as long as the server takes
    pub fn with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "mserv/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the catalog. Any non-2xx status or unparsable body is an error.
    pub async fn fetch(&self) -> Result<CatalogDocument> {
        let document = with_retry(
            &self.retry_config,
            || async {
                debug!("GET {}", self.url);
                let response = self.client.get(&self.url).send().await.map_err(timeout_aware)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CatalogError::RequestFailed {
                        status: status.as_u16(),
                        body,
                    });
                }

                let body = response.text().await.map_err(timeout_aware)?;
                let document = CatalogDocument::from_json(&body)?;
                Ok(document)
            },
            CatalogError::is_retryable,
        )
        .await?;

        info!(
            "Fetched catalog from {}: {} services, {} categories",
            self.url,
            document.default_services.len(),
            document.categories.len()
        );
        Ok(document)
    }
}

fn timeout_aware(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::NetworkError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CATALOG: &str = r#"{
        "default_services": [
            {"id": "jellyfin", "name": "Jellyfin", "description": "Media server", "url": "jellyfin.home", "category": "media", "icon": "jellyfin"},
            {"id": "portainer", "name": "Portainer", "description": "Containers", "url": "portainer.home", "category": "admin"}
        ],
        "categories": [
            {"id": "media", "name": "Media", "icon": "film"},
            {"id": "admin", "name": "Administration", "icon": "server"}
        ]
    }"#;

    /// Serve one canned response per connection, in order
    async fn spawn_server(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/config/services.json", addr)
    }

    #[test]
    fn test_document_missing_keys_default_to_empty() {
        let doc = CatalogDocument::from_json("{}").unwrap();
        assert!(doc.default_services.is_empty());
        assert!(doc.categories.is_empty());
    }

    #[test]
    fn test_document_optional_fields() {
        let doc = CatalogDocument::from_json(CATALOG).unwrap();
        assert_eq!(doc.default_services.len(), 2);
        assert_eq!(doc.default_services[0].icon.as_deref(), Some("jellyfin"));
        assert_eq!(doc.default_services[1].icon, None);
        assert_eq!(doc.categories[1].name, "Administration");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = spawn_server(vec![(200, CATALOG)]).await;
        let client = CatalogClient::new(url).unwrap();

        let doc = client.fetch().await.unwrap();
        assert_eq!(doc.default_services[0].id, "jellyfin");
        assert_eq!(doc.categories[0].id, "media");
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_error() {
        let url = spawn_server(vec![(404, "not here")]).await;
        let client = CatalogClient::new(url).unwrap();

        match client.fetch().await {
            Err(CatalogError::RequestFailed { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_json_is_error() {
        let url = spawn_server(vec![(200, "{not json")]).await;
        let client = CatalogClient::new(url).unwrap();

        assert!(matches!(
            client.fetch().await,
            Err(CatalogError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors_when_configured() {
        let url = spawn_server(vec![(503, "busy"), (200, CATALOG)]).await;
        let client = CatalogClient::new(url).unwrap().with_retry_config(RetryConfig {
            max_retries: 1,
            initial_delay_ms: 10,
            max_delay_ms: 10,
            backoff_multiplier: 1.0,
        });

        let doc = client.fetch().await.unwrap();
        assert_eq!(doc.default_services.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            // Hold the connection open without answering
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = CatalogClient::with_timeout(
            format!("http://{}/config/services.json", addr),
            Some(Duration::from_millis(100)),
        )
        .unwrap();

        assert!(matches!(client.fetch().await, Err(CatalogError::Timeout)));
    }

    #[test]
    fn test_retryable_errors() {
        let server = CatalogError::RequestFailed {
            status: 502,
            body: String::new(),
        };
        let missing = CatalogError::RequestFailed {
            status: 404,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!missing.is_retryable());
        assert!(CatalogError::Timeout.is_retryable());
    }
}
