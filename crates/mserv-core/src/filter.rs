use crate::view::DashboardView;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Queries shorter than this (after trimming) don't filter anything
pub const MIN_QUERY_LEN: usize = 2;

/// Trim and case-fold a raw query
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// The "N résultat(s)" badge next to the search box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultsIndicator {
    pub count: usize,
}

impl ResultsIndicator {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResultsIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.count == 1 { "" } else { "s" };
        write!(f, "{} résultat{}", self.count, plural)
    }
}

/// Which rendered cards and groups are hidden by the current filter
///
/// Hidden items stay in the view model; this only says what not to draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    hidden_services: HashSet<String>,
    hidden_groups: HashSet<String>,
    indicator: Option<ResultsIndicator>,
}

impl Visibility {
    /// Nothing hidden, no indicator
    pub fn all_visible() -> Self {
        Self::default()
    }

    pub fn is_service_visible(&self, id: &str) -> bool {
        !self.hidden_services.contains(id)
    }

    pub fn is_group_visible(&self, id: &str) -> bool {
        !self.hidden_groups.contains(id)
    }

    pub fn indicator(&self) -> Option<ResultsIndicator> {
        self.indicator
    }

    pub fn is_filtered(&self) -> bool {
        self.indicator.is_some()
    }
}

/// Pure filter: which parts of `view` stay visible for `query`
pub fn compute_visibility(view: &DashboardView, query: &str, min_len: usize) -> Visibility {
    let needle = normalize_query(query);
    if needle.chars().count() < min_len {
        return Visibility::all_visible();
    }

    let matched: HashSet<&str> = view
        .grid
        .iter()
        .chain(view.groups.iter().flat_map(|g| g.services.iter()))
        .filter(|card| {
            card.name.to_lowercase().contains(&needle)
                || card.description.to_lowercase().contains(&needle)
        })
        .map(|card| card.id.as_str())
        .collect();

    let hidden_services: HashSet<String> = view
        .grid
        .iter()
        .chain(view.groups.iter().flat_map(|g| g.services.iter()))
        .filter(|card| !matched.contains(card.id.as_str()))
        .map(|card| card.id.clone())
        .collect();

    let hidden_groups = view
        .groups
        .iter()
        .filter(|g| g.services.iter().all(|c| !matched.contains(c.id.as_str())))
        .map(|g| g.id.clone())
        .collect();

    Visibility {
        hidden_services,
        hidden_groups,
        indicator: Some(ResultsIndicator {
            count: matched.len(),
        }),
    }
}

/// Current filter state (last applied query) plus its visibility
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct FilterEngine {
    min_len: usize,
    state: FilterState,
    visibility: Visibility,
}

impl FilterEngine {
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len,
            state: FilterState::default(),
            visibility: Visibility::all_visible(),
        }
    }

    pub fn apply_filter(&mut self, view: &DashboardView, query: &str) -> &Visibility {
        self.state.query = normalize_query(query);
        self.visibility = compute_visibility(view, &self.state.query, self.min_len);

        match self.visibility.indicator() {
            Some(indicator) => debug!("Filter '{}': {}", self.state.query, indicator),
            None => debug!("Filter reset"),
        }
        &self.visibility
    }

    /// Same as `apply_filter("")`
    pub fn reset(&mut self) -> &Visibility {
        self.state.query.clear();
        self.visibility = Visibility::all_visible();
        &self.visibility
    }

    /// Recompute against a freshly rendered view with the current query
    pub fn reapply(&mut self, view: &DashboardView) -> &Visibility {
        self.visibility = compute_visibility(view, &self.state.query, self.min_len);
        &self.visibility
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(MIN_QUERY_LEN)
    }
}
