use crate::catalog::{Catalog, CatalogSource, CatalogStore};
use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::filter::Visibility;
use crate::layout::{LayoutState, ViewMode};
use crate::search::SearchController;
use crate::theme::{ThemeKind, ThemeManager};
use crate::view::{render_dashboard, DashboardView};
use crate::Result;
use mserv_cache::KeyValueStore;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};

/// Where startup stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitState {
    Loading,
    Ready,
    Failed(String),
}

/// All dashboard state for one session
///
/// Built once at startup and handed around by reference. The TUI and the
/// CLI subcommands drive it; neither reaches into the stores directly.
pub struct Dashboard {
    config: Config,
    catalog: CatalogStore,
    favorites: FavoritesStore,
    theme: ThemeManager,
    layout: LayoutState,
    search: SearchController,
    view: DashboardView,
    init: InitState,
}

impl Dashboard {
    /// Restore favorites, theme and view mode. The catalog stays empty
    /// until `load` succeeds.
    pub fn new(
        storage: Rc<dyn KeyValueStore>,
        config: Config,
        width: u16,
        system_theme: ThemeKind,
    ) -> Self {
        let mut favorites =
            FavoritesStore::with_defaults(Rc::clone(&storage), config.favorites.defaults.clone());
        favorites.load_from_storage();

        let theme = ThemeManager::load(Rc::clone(&storage), system_theme);
        let layout = LayoutState::load(storage, width);
        let search = SearchController::from_config(&config.search);

        Self {
            config,
            catalog: CatalogStore::new(),
            favorites,
            theme,
            layout,
            search,
            view: DashboardView::default(),
            init: InitState::Loading,
        }
    }

    /// Fetch the catalog and render everything from it.
    ///
    /// On failure the previous catalog and view stay up and the init state
    /// records the message.
    pub async fn load(&mut self, source: &dyn CatalogSource) -> Result<usize> {
        self.begin_load();
        let loaded = self.catalog.load(source).await;
        self.settle(loaded)
    }

    /// Mark a fetch as in flight. The current view stays up meanwhile.
    pub fn begin_load(&mut self) {
        self.init = InitState::Loading;
    }

    /// Apply a fetch the caller awaited on its own, so input can be handled
    /// while the request is pending
    pub fn finish_load(&mut self, origin: &str, fetched: Result<Catalog>) -> Result<usize> {
        let loaded = self.catalog.apply(origin, fetched);
        self.settle(loaded)
    }

    fn settle(&mut self, loaded: Result<usize>) -> Result<usize> {
        match loaded {
            Ok(count) => {
                self.render();
                self.init = InitState::Ready;
                Ok(count)
            }
            Err(e) => {
                self.init = InitState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Re-render the whole view and re-run the current filter against it
    pub fn render(&mut self) {
        self.view = render_dashboard(self.catalog.catalog(), self.favorites.get());
        self.search.reapply(&self.view);
        debug!(
            "Rendered {} services in {} groups, {} favorites",
            self.view.grid.len(),
            self.view.groups.len(),
            self.view.favorites.entries.len()
        );
    }

    /// Returns whether `id` is a favorite afterwards
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let now_favorite = self.favorites.toggle(id)?;
        self.refresh_favorites();
        Ok(now_favorite)
    }

    pub fn add_favorite(&mut self, id: &str) -> Result<()> {
        self.favorites.add(id)?;
        self.refresh_favorites();
        Ok(())
    }

    pub fn remove_favorite(&mut self, id: &str) -> Result<()> {
        self.favorites.remove(id)?;
        self.refresh_favorites();
        Ok(())
    }

    /// The "Ajouter" button. Editing favorites happens by toggling cards.
    pub fn edit_favorites(&self) {
        debug!("Favorites editor requested; toggle a service to add it");
    }

    fn refresh_favorites(&mut self) {
        self.view
            .replace_favorites(self.catalog.catalog(), self.favorites.get());
    }

    pub fn search_push(&mut self, now: Instant, c: char) {
        self.search.push_char(now, c);
    }

    pub fn search_backspace(&mut self, now: Instant) {
        self.search.backspace(now);
    }

    pub fn search_set(&mut self, now: Instant, text: &str) {
        self.search.set_input(now, text);
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Run a due search. Returns true when the visibility changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.search.tick(now, &self.view).is_some()
    }

    /// Apply a pending search right away
    pub fn flush_search(&mut self) -> bool {
        self.search.flush(&self.view).is_some()
    }

    /// Apply `query` immediately, bypassing the debounce
    pub fn search_now(&mut self, query: &str) -> &Visibility {
        self.search.set_input(Instant::now(), query);
        self.search.flush(&self.view);
        self.search.visibility()
    }

    pub fn toggle_theme(&mut self) -> Result<ThemeKind> {
        self.theme.toggle()
    }

    pub fn toggle_view(&mut self) -> Result<ViewMode> {
        self.layout.toggle_view()
    }

    pub fn resize(&mut self, width: u16) -> bool {
        self.layout.resize(width)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.catalog()
    }

    pub fn favorites(&self) -> &[String] {
        self.favorites.get()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn visibility(&self) -> &Visibility {
        self.search.visibility()
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn theme(&self) -> &ThemeManager {
        &self.theme
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn init_state(&self) -> &InitState {
        &self.init
    }

    pub fn is_ready(&self) -> bool {
        self.init == InitState::Ready
    }
}

/// Startup banner, logged once per process
pub fn log_startup() {
    info!("mserv v{} starting", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Service};
    use crate::Error;
    use mserv_cache::MemoryStore;
    use std::time::Duration;

    struct FixedSource(Catalog);

    #[async_trait::async_trait]
    impl CatalogSource for FixedSource {
        async fn fetch(&self) -> Result<Catalog> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixture".into()
        }
    }

    struct DownSource;

    #[async_trait::async_trait]
    impl CatalogSource for DownSource {
        async fn fetch(&self) -> Result<Catalog> {
            Err(Error::LoadFailure("HTTP 503".into()))
        }

        fn describe(&self) -> String {
            "down".into()
        }
    }

    fn catalog() -> Catalog {
        let service = |id: &str, name: &str, category: &str| Service {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            url: format!("{}.lan", id),
            category: Some(category.into()),
            icon: None,
        };
        Catalog::new(
            vec![
                service("jellyfin", "Jellyfin", "media"),
                service("portainer", "Portainer", "admin"),
            ],
            vec![
                Category {
                    id: "media".into(),
                    name: "Média".into(),
                    icon: "film".into(),
                },
                Category {
                    id: "admin".into(),
                    name: "Admin".into(),
                    icon: "server".into(),
                },
            ],
        )
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(
            Rc::new(MemoryStore::new()),
            Config::default(),
            140,
            ThemeKind::Dark,
        )
    }

    #[tokio::test]
    async fn test_nothing_rendered_before_load() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.init_state(), &InitState::Loading);
        assert!(dashboard.view().grid.is_empty());
        assert!(dashboard.view().favorites.entries.is_empty());

        dashboard.load(&FixedSource(catalog())).await.unwrap();
        assert!(dashboard.is_ready());
        assert_eq!(dashboard.view().grid.len(), 2);
        // Defaults include jellyfin and portainer
        assert_eq!(dashboard.view().favorites.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_view_and_reports() {
        let mut dashboard = dashboard();
        dashboard.load(&FixedSource(catalog())).await.unwrap();

        assert!(dashboard.load(&DownSource).await.is_err());
        assert!(matches!(dashboard.init_state(), InitState::Failed(msg) if msg.contains("503")));
        assert_eq!(dashboard.view().grid.len(), 2);
        assert_eq!(dashboard.catalog().len(), 2);
    }

    #[test]
    fn test_begin_and_finish_load() {
        let mut dashboard = dashboard();
        dashboard
            .finish_load("down", Err(Error::LoadFailure("HTTP 503".into())))
            .unwrap_err();
        assert!(matches!(dashboard.init_state(), InitState::Failed(_)));

        // A retry clears the failure while the request is out
        dashboard.begin_load();
        assert_eq!(dashboard.init_state(), &InitState::Loading);

        assert_eq!(dashboard.finish_load("fixture", Ok(catalog())).unwrap(), 2);
        assert!(dashboard.is_ready());
        assert_eq!(dashboard.view().groups.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_keeps_active_filter() {
        let mut dashboard = dashboard();
        dashboard.load(&FixedSource(catalog())).await.unwrap();
        dashboard.search_now("port");
        assert!(!dashboard.visibility().is_service_visible("jellyfin"));

        dashboard.load(&FixedSource(catalog())).await.unwrap();
        assert!(!dashboard.visibility().is_service_visible("jellyfin"));
        assert_eq!(dashboard.visibility().indicator().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_toggle_favorite_updates_strip_only() {
        let mut dashboard = dashboard();
        dashboard.load(&FixedSource(catalog())).await.unwrap();
        dashboard.search_now("jelly");

        assert!(!dashboard.toggle_favorite("jellyfin").unwrap());
        let strip: Vec<_> = dashboard
            .view()
            .favorites
            .entries
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(strip, vec!["portainer"]);
        assert!(!dashboard.view().card("jellyfin").unwrap().favorite);

        // The filter still applies to the cards
        assert!(!dashboard.visibility().is_service_visible("portainer"));
    }

    #[tokio::test]
    async fn test_debounced_search_through_tick() {
        let mut dashboard = dashboard();
        dashboard.load(&FixedSource(catalog())).await.unwrap();

        let start = Instant::now();
        dashboard.search_push(start, 'j');
        dashboard.search_push(start + Duration::from_millis(10), 'e');
        assert!(!dashboard.tick(start + Duration::from_millis(100)));
        assert!(dashboard.tick(start + Duration::from_millis(310)));
        assert_eq!(
            dashboard.visibility().indicator().unwrap().label(),
            "1 résultat"
        );

        dashboard.clear_search();
        assert!(!dashboard.visibility().is_filtered());
        assert_eq!(dashboard.search().input(), "");
    }
}
