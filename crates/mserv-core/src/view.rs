// Declarative view model: what the dashboard shows, independent of any toolkit
use crate::catalog::Catalog;
use crate::models::Service;
use std::collections::HashSet;

/// Stable id of the trailing "add favorite" button in the favorites strip
pub const ADD_FAVORITE_ID: &str = "edit-favorites-btn";
pub const ADD_FAVORITE_LABEL: &str = "Ajouter";

/// One service as rendered in the grid or in a category group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCard {
    pub id: String,
    pub category: Option<String>,
    pub name: String,
    pub description: String,
    pub href: String,
    pub icon_url: Option<String>,
    pub favorite: bool,
}

impl ServiceCard {
    fn new(service: &Service, favorite: bool) -> Self {
        Self {
            id: service.id.clone(),
            category: service.category.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            href: service.href(),
            icon_url: service.icon_url(),
            favorite,
        }
    }
}

/// A category section with its services in catalog order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub services: Vec<ServiceCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub id: String,
    pub name: String,
    pub href: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddFavoriteButton {
    pub id: &'static str,
    pub label: &'static str,
}

impl Default for AddFavoriteButton {
    fn default() -> Self {
        Self {
            id: ADD_FAVORITE_ID,
            label: ADD_FAVORITE_LABEL,
        }
    }
}

/// Favorites in favorites order, always followed by the add button
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesStrip {
    pub entries: Vec<FavoriteEntry>,
    pub add_button: AddFavoriteButton,
}

/// Everything the dashboard renders from (catalog, favorites)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    /// Every service, catalog order
    pub grid: Vec<ServiceCard>,
    /// Non-empty categories, category order
    pub groups: Vec<CategoryGroup>,
    pub favorites: FavoritesStrip,
}

impl DashboardView {
    pub fn card(&self, id: &str) -> Option<&ServiceCard> {
        self.grid.iter().find(|c| c.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&CategoryGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Re-render the favorites strip after a favorite toggle.
    ///
    /// Grid and groups keep their order; only the `favorite` marker on the
    /// cards is refreshed.
    pub fn replace_favorites(&mut self, catalog: &Catalog, favorites: &[String]) {
        self.favorites = render_favorites(catalog, favorites);

        let marked: HashSet<&str> = favorites.iter().map(String::as_str).collect();
        let cards = self
            .grid
            .iter_mut()
            .chain(self.groups.iter_mut().flat_map(|g| g.services.iter_mut()));
        for card in cards {
            card.favorite = marked.contains(card.id.as_str());
        }
    }
}

/// Full projection of (catalog, favorites). Deterministic and order-preserving.
pub fn render_dashboard(catalog: &Catalog, favorites: &[String]) -> DashboardView {
    DashboardView {
        grid: render_service_grid(catalog, favorites),
        groups: render_groups(catalog, favorites),
        favorites: render_favorites(catalog, favorites),
    }
}

pub fn render_service_grid(catalog: &Catalog, favorites: &[String]) -> Vec<ServiceCard> {
    catalog
        .services()
        .iter()
        .map(|s| ServiceCard::new(s, is_favorite(favorites, &s.id)))
        .collect()
}

/// One group per category that has services. Services pointing at an
/// unknown category only show up in the grid.
pub fn render_groups(catalog: &Catalog, favorites: &[String]) -> Vec<CategoryGroup> {
    let mut seen = HashSet::new();

    catalog
        .categories()
        .iter()
        .filter(|category| seen.insert(category.id.as_str()))
        .filter_map(|category| {
            let services: Vec<ServiceCard> = catalog
                .services_in(&category.id)
                .map(|s| ServiceCard::new(s, is_favorite(favorites, &s.id)))
                .collect();

            if services.is_empty() {
                return None;
            }

            Some(CategoryGroup {
                id: category.id.clone(),
                name: category.name.clone(),
                icon: category.icon.clone(),
                services,
            })
        })
        .collect()
}

/// Favorites that still resolve to a service; stale ids are skipped
pub fn render_favorites(catalog: &Catalog, favorites: &[String]) -> FavoritesStrip {
    let entries = favorites
        .iter()
        .filter_map(|id| catalog.service(id))
        .map(|s| FavoriteEntry {
            id: s.id.clone(),
            name: s.name.clone(),
            href: s.href(),
            icon_url: s.icon_url(),
        })
        .collect();

    FavoritesStrip {
        entries,
        add_button: AddFavoriteButton::default(),
    }
}

fn is_favorite(favorites: &[String], id: &str) -> bool {
    favorites.iter().any(|f| f == id)
}
