use mserv_cache::{KeyValueStore, SqliteStore};
use mserv_core::favorites::FAVORITES_KEY;
use mserv_core::providers::FileCatalogSource;
use mserv_core::theme::ThemeKind;
use mserv_core::{Config, Dashboard, InitState, ViewMode};
use std::rc::Rc;
use tempfile::TempDir;

const CATALOG: &str = r#"{
    "default_services": [
        {"id": "jellyfin", "name": "Jellyfin", "description": "Streaming multimédia", "url": "jellyfin.home.lan", "category": "media", "icon": "jellyfin"},
        {"id": "sonarr", "name": "Sonarr", "description": "Séries TV", "url": "sonarr.home.lan", "category": "media", "icon": "sonarr"},
        {"id": "portainer", "name": "Portainer", "description": "Conteneurs Docker", "url": "portainer.home.lan", "category": "admin", "icon": "portainer"},
        {"id": "gitea", "name": "Gitea", "description": "Forge Git", "url": "git.home.lan", "category": "dev", "icon": "gitea"}
    ],
    "categories": [
        {"id": "media", "name": "Multimédia", "icon": "film"},
        {"id": "cloud", "name": "Cloud", "icon": "cloud"},
        {"id": "admin", "name": "Administration", "icon": "server"},
        {"id": "dev", "name": "Développement", "icon": "code"}
    ]
}"#;

fn write_catalog(dir: &TempDir) -> FileCatalogSource {
    let path = dir.path().join("services.json");
    std::fs::write(&path, CATALOG).unwrap();
    FileCatalogSource::new(path)
}

fn open_dashboard(dir: &TempDir, width: u16) -> (Rc<SqliteStore>, Dashboard) {
    let storage = Rc::new(SqliteStore::new(dir.path().join("storage.db")).unwrap());
    let dashboard = Dashboard::new(storage.clone(), Config::default(), width, ThemeKind::Dark);
    (storage, dashboard)
}

#[tokio::test]
async fn test_full_session_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = write_catalog(&dir);

    {
        let (storage, mut dashboard) = open_dashboard(&dir, 140);
        dashboard.load(&source).await.unwrap();
        assert_eq!(dashboard.init_state(), &InitState::Ready);

        // Empty "cloud" category has no section
        let groups: Vec<_> = dashboard
            .view()
            .groups
            .iter()
            .map(|g| g.id.as_str())
            .collect();
        assert_eq!(groups, vec!["media", "admin", "dev"]);

        dashboard.toggle_favorite("sonarr").unwrap();
        dashboard.toggle_favorite("nextcloud").unwrap();
        dashboard.toggle_theme().unwrap();
        dashboard.toggle_view().unwrap();

        assert_eq!(
            storage.get(FAVORITES_KEY).unwrap().as_deref(),
            Some(r#"["jellyfin","portainer","gitea","sonarr"]"#)
        );
    }

    // Second session picks up everything from disk
    let (_storage, mut dashboard) = open_dashboard(&dir, 140);
    dashboard.load(&source).await.unwrap();

    let strip: Vec<_> = dashboard
        .view()
        .favorites
        .entries
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(strip, vec!["jellyfin", "portainer", "gitea", "sonarr"]);
    assert_eq!(dashboard.theme().kind(), ThemeKind::Light);
    assert_eq!(dashboard.layout().view_mode(), ViewMode::List);
}

#[tokio::test]
async fn test_search_over_loaded_catalog() {
    let dir = TempDir::new().unwrap();
    let source = write_catalog(&dir);
    let (_storage, mut dashboard) = open_dashboard(&dir, 100);
    dashboard.load(&source).await.unwrap();

    let visibility = dashboard.search_now("docker");
    assert_eq!(visibility.indicator().unwrap().label(), "1 résultat");
    assert!(visibility.is_group_visible("admin"));
    assert!(!visibility.is_group_visible("media"));
    assert!(!visibility.is_group_visible("dev"));

    // Favorites strip is untouched by the filter
    assert_eq!(dashboard.view().favorites.entries.len(), 3);

    let visibility = dashboard.search_now("d");
    assert!(!visibility.is_filtered());
}

#[tokio::test]
async fn test_missing_catalog_file_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let (_storage, mut dashboard) = open_dashboard(&dir, 100);

    let result = dashboard
        .load(&FileCatalogSource::new(dir.path().join("absent.json")))
        .await;

    assert!(result.is_err());
    assert!(matches!(dashboard.init_state(), InitState::Failed(_)));
    assert!(dashboard.view().grid.is_empty());
    // Favorites were still restored, just not rendered
    assert_eq!(dashboard.favorites().len(), 4);
}

#[tokio::test]
async fn test_corrupt_favorites_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    {
        let storage = SqliteStore::new(dir.path().join("storage.db")).unwrap();
        storage.set(FAVORITES_KEY, "{broken").unwrap();
    }

    let (storage, dashboard) = open_dashboard(&dir, 100);
    assert_eq!(
        dashboard.favorites(),
        &["jellyfin", "portainer", "gitea", "nextcloud"]
    );
    assert_eq!(storage.get(FAVORITES_KEY).unwrap().as_deref(), Some("{broken"));
}
