use mserv_api::{CategoryEntry, ServiceEntry};
use serde::{Deserialize, Serialize};

/// Icon set the catalog's `icon` slugs point into
pub const ICON_CDN: &str = "https://cdn.jsdelivr.net/gh/selfhst/icons/svg";

/// A self-hosted service link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Host and path, usually without a scheme
    pub url: String,
    pub category: Option<String>,
    pub icon: Option<String>,
}

impl Service {
    /// Link target. Catalog urls are bare hosts, so https is assumed.
    pub fn href(&self) -> String {
        if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        }
    }

    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .map(|slug| format!("{}/{}.svg", ICON_CDN, slug))
    }

    /// `needle` must already be case-folded
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

impl From<ServiceEntry> for Service {
    fn from(entry: ServiceEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            url: entry.url,
            category: entry.category.filter(|c| !c.is_empty()),
            icon: entry.icon,
        }
    }
}

/// A named group of services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl From<CategoryEntry> for Category {
    fn from(entry: CategoryEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            icon: entry.icon,
        }
    }
}
