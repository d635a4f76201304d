// Dashboard logic with no terminal in sight - the TUI and CLI sit on top
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod layout;
pub mod models;
pub mod notifications;
pub mod providers;
pub mod search;
pub mod system;
pub mod theme;
pub mod view;

pub use catalog::{Catalog, CatalogSource, CatalogStore};
pub use config::Config;
pub use dashboard::{Dashboard, InitState};
pub use error::Error;
pub use favorites::FavoritesStore;
pub use filter::{FilterEngine, ResultsIndicator, Visibility};
pub use layout::{Breakpoint, LayoutState, ViewMode};
pub use models::{Category, Service};
pub use notifications::{Notification, NotificationCenter, NotificationKind};
pub use search::SearchController;
pub use system::{HealthSummary, StatusLevel, SystemSimulator, SystemSnapshot};
pub use theme::{Color, Theme, ThemeColors, ThemeKind, ThemeManager};
pub use view::DashboardView;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
