use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::filter::{FilterEngine, Visibility};
use crate::view::DashboardView;
use std::time::{Duration, Instant};
use tracing::debug;

/// The search box: raw input, a debounced pending query, and the filter
///
/// Keystrokes edit `input` right away and schedule a filter run; the filter
/// only sees the text once typing has paused for the debounce delay.
#[derive(Debug, Clone)]
pub struct SearchController {
    input: String,
    debouncer: Debouncer<String>,
    engine: FilterEngine,
}

impl SearchController {
    pub fn new(min_query_len: usize, debounce: Duration) -> Self {
        Self {
            input: String::new(),
            debouncer: Debouncer::new(debounce),
            engine: FilterEngine::new(min_query_len),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.min_query_len, config.debounce())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_char(&mut self, now: Instant, c: char) {
        self.input.push(c);
        self.schedule(now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.input.pop().is_some() {
            self.schedule(now);
        }
    }

    /// Replace the whole input (paste, programmatic search)
    pub fn set_input(&mut self, now: Instant, text: &str) {
        self.input = text.to_string();
        self.schedule(now);
    }

    /// Empty the box, drop any pending run and show everything again
    pub fn clear(&mut self) -> &Visibility {
        self.input.clear();
        self.debouncer.cancel();
        self.engine.reset()
    }

    /// Run the filter if the debounce deadline has passed.
    ///
    /// Returns the new visibility when a run happened.
    pub fn tick(&mut self, now: Instant, view: &DashboardView) -> Option<&Visibility> {
        let query = self.debouncer.poll(now)?;
        Some(self.engine.apply_filter(view, &query))
    }

    /// Apply the pending query immediately, if any (Enter in the search box)
    pub fn flush(&mut self, view: &DashboardView) -> Option<&Visibility> {
        let due = self.debouncer.due_at()?;
        self.tick(due, view)
    }

    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_due(now)
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn visibility(&self) -> &Visibility {
        self.engine.visibility()
    }

    /// The query the current visibility was computed from
    pub fn applied_query(&self) -> &str {
        &self.engine.state().query
    }

    /// Recompute against a re-rendered view (after a catalog reload)
    pub fn reapply(&mut self, view: &DashboardView) -> &Visibility {
        self.engine.reapply(view)
    }

    fn schedule(&mut self, now: Instant) {
        if self.debouncer.schedule(now, self.input.clone()) {
            debug!("Search rescheduled: '{}'", self.input);
        }
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{Category, Service};
    use crate::view::render_dashboard;

    fn view() -> DashboardView {
        let service = |id: &str, name: &str, category: &str| Service {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            url: format!("{}.lan", id),
            category: Some(category.into()),
            icon: None,
        };
        let catalog = Catalog::new(
            vec![
                service("jellyfin", "Jellyfin", "media"),
                service("jellyseerr", "Jellyseerr", "media"),
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
        );
        render_dashboard(&catalog, &[])
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_typing_burst_runs_filter_once() {
        let view = view();
        let start = Instant::now();
        let mut search = SearchController::default();

        search.push_char(start, 'j');
        search.push_char(start + ms(100), 'e');
        assert!(search.tick(start + ms(300), &view).is_none());

        let visibility = search.tick(start + ms(400), &view).unwrap();
        assert_eq!(visibility.indicator().unwrap().count, 2);
        assert_eq!(search.applied_query(), "je");

        // Nothing left to run
        assert!(search.tick(start + ms(2000), &view).is_none());
    }

    #[test]
    fn test_latest_text_wins() {
        let view = view();
        let start = Instant::now();
        let mut search = SearchController::default();

        search.set_input(start, "por");
        search.set_input(start + ms(50), "jellys");
        let visibility = search.tick(start + ms(350), &view).unwrap();

        assert!(visibility.is_service_visible("jellyseerr"));
        assert!(!visibility.is_service_visible("jellyfin"));
        assert!(!visibility.is_group_visible("admin"));
    }

    #[test]
    fn test_clear_cancels_pending_run() {
        let view = view();
        let start = Instant::now();
        let mut search = SearchController::default();

        search.set_input(start, "port");
        search.tick(start + ms(300), &view);
        assert!(search.visibility().is_filtered());

        search.push_char(start + ms(400), 'a');
        let visibility = search.clear();
        assert!(!visibility.is_filtered());
        assert_eq!(search.input(), "");
        assert!(!search.is_pending());
        assert!(search.tick(start + ms(5000), &view).is_none());
    }

    #[test]
    fn test_flush_applies_immediately() {
        let view = view();
        let mut search = SearchController::default();
        search.set_input(Instant::now(), "portainer");

        let visibility = search.flush(&view).unwrap();
        assert_eq!(visibility.indicator().unwrap().label(), "1 résultat");
        assert!(search.flush(&view).is_none());
    }

    #[test]
    fn test_backspace_on_empty_input_schedules_nothing() {
        let mut search = SearchController::default();
        search.backspace(Instant::now());
        assert!(!search.is_pending());
        assert_eq!(search.next_deadline(Instant::now()), None);
    }
}
