// TUI application state and event handling
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use mserv_core::notifications::NotificationKind;
use mserv_core::theme::ThemeKind;
use mserv_core::view::ServiceCard;
use mserv_core::{
    Catalog, Dashboard, InitState, NotificationCenter, SystemSimulator, ViewMode,
};
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Samples kept for the CPU sparkline
pub const CPU_HISTORY_LEN: usize = 30;

/// Upper bound on how long the loop sleeps, so the header clock keeps ticking
const CLOCK_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,    // Moving around the cards
    Searching, // Typing in the search box
}

/// Which list of services the main pane shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicesPane {
    Groups, // One section per category
    All,    // Flat grid, catalog order
}

impl ServicesPane {
    pub fn title(self) -> &'static str {
        match self {
            ServicesPane::Groups => "Catégories",
            ServicesPane::All => "Tous les services",
        }
    }
}

/// What the runner has to do after an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Reload,
    Open(String),
}

pub struct App {
    pub dashboard: Dashboard,
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub pane: ServicesPane,
    pub selected_index: usize,
    /// First visible row of the services pane
    pub scroll_offset: usize,
    pub show_help: bool,
    pub notifications: NotificationCenter,
    pub simulator: SystemSimulator,
    pub cpu_history: VecDeque<f64>,
    /// Where each card was last drawn, for mouse hit-testing
    pub card_areas: Vec<(String, Rect)>,
    metrics_interval: Duration,
    next_metrics_at: Instant,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        Self::with_simulator(dashboard, SystemSimulator::new())
    }

    pub fn with_simulator(dashboard: Dashboard, simulator: SystemSimulator) -> Self {
        let metrics_interval = dashboard.config().ui.metrics_interval();
        let mut cpu_history = VecDeque::with_capacity(CPU_HISTORY_LEN);
        cpu_history.push_back(simulator.snapshot().cpu);

        Self {
            dashboard,
            should_quit: false,
            input_mode: InputMode::Normal,
            pane: ServicesPane::Groups,
            selected_index: 0,
            scroll_offset: 0,
            show_help: false,
            notifications: NotificationCenter::new(),
            simulator,
            cpu_history,
            card_areas: Vec::new(),
            metrics_interval,
            next_metrics_at: Instant::now() + metrics_interval,
        }
    }

    /// A catalog fetch went out; the runner awaits it alongside input
    pub fn begin_load(&mut self) {
        self.dashboard.begin_load();
    }

    /// Apply the fetched catalog (or the failure) and report how it went
    pub fn finish_load(&mut self, now: Instant, origin: &str, fetched: mserv_core::Result<Catalog>) {
        match self.dashboard.finish_load(origin, fetched) {
            Ok(count) => {
                self.simulator
                    .set_total_services(u32::try_from(count).unwrap_or(u32::MAX));
                self.clamp_selection();
                debug!("Dashboard ready with {} services", count);
            }
            Err(e) => self.report_error(now, format!("Chargement impossible: {}", e)),
        }
    }

    /// Cards of the current pane, in display order, minus filtered ones
    pub fn display_cards(&self) -> Vec<&ServiceCard> {
        let view = self.dashboard.view();
        let visibility = self.dashboard.visibility();

        match self.pane {
            ServicesPane::Groups => view
                .groups
                .iter()
                .filter(|g| visibility.is_group_visible(&g.id))
                .flat_map(|g| g.services.iter())
                .filter(|c| visibility.is_service_visible(&c.id))
                .collect(),
            ServicesPane::All => view
                .grid
                .iter()
                .filter(|c| visibility.is_service_visible(&c.id))
                .collect(),
        }
    }

    pub fn selected_card(&self) -> Option<&ServiceCard> {
        self.display_cards().get(self.selected_index).copied()
    }

    pub fn next_card(&mut self) {
        let len = self.display_cards().len();
        if len > 0 && self.selected_index + 1 < len {
            self.selected_index += 1;
        }
    }

    pub fn previous_card(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Indices into `display_cards`, laid out the way the services pane
    /// draws them: each category starts a fresh row
    pub fn card_rows(&self) -> Vec<Vec<usize>> {
        let columns = self.dashboard.layout().columns().max(1);
        let view = self.dashboard.view();
        let visibility = self.dashboard.visibility();

        let sections: Vec<usize> = match self.pane {
            ServicesPane::Groups => view
                .groups
                .iter()
                .filter(|g| visibility.is_group_visible(&g.id))
                .map(|g| {
                    g.services
                        .iter()
                        .filter(|c| visibility.is_service_visible(&c.id))
                        .count()
                })
                .filter(|len| *len > 0)
                .collect(),
            ServicesPane::All => vec![self.display_cards().len()],
        };

        let mut rows = Vec::new();
        let mut start = 0;
        for len in sections {
            let indices: Vec<usize> = (start..start + len).collect();
            rows.extend(indices.chunks(columns).map(<[usize]>::to_vec));
            start += len;
        }
        rows
    }

    /// Down one row, keeping the column when the next row is long enough
    pub fn next_row(&mut self) {
        self.move_row(true);
    }

    pub fn previous_row(&mut self) {
        self.move_row(false);
    }

    fn move_row(&mut self, down: bool) {
        let rows = self.card_rows();
        let Some((row, column)) = rows.iter().enumerate().find_map(|(r, cards)| {
            cards
                .iter()
                .position(|&i| i == self.selected_index)
                .map(|c| (r, c))
        }) else {
            return;
        };

        let target = if down { row.checked_add(1) } else { row.checked_sub(1) };
        if let Some(cards) = target.and_then(|t| rows.get(t)) {
            self.selected_index = cards[column.min(cards.len() - 1)];
        }
    }

    pub fn select(&mut self, id: &str) {
        if let Some(pos) = self.display_cards().iter().position(|c| c.id == id) {
            self.selected_index = pos;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.display_cards().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            ServicesPane::Groups => ServicesPane::All,
            ServicesPane::All => ServicesPane::Groups,
        };
        self.selected_index = 0;
        self.scroll_offset = 0;
    }

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Searching;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_favorite(&mut self, now: Instant, id: &str) {
        let name = self
            .dashboard
            .catalog()
            .service(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string());

        match self.dashboard.toggle_favorite(id) {
            Ok(true) => self.notifications.push(
                now,
                NotificationKind::Success,
                format!("{} ajouté aux favoris", name),
            ),
            Ok(false) => self.notifications.push(
                now,
                NotificationKind::Info,
                format!("{} retiré des favoris", name),
            ),
            Err(e) => self.report_error(now, format!("Favoris non enregistrés: {}", e)),
        }
    }

    pub fn toggle_selected_favorite(&mut self, now: Instant) {
        if let Some(id) = self.selected_card().map(|c| c.id.clone()) {
            self.toggle_favorite(now, &id);
        }
    }

    pub fn toggle_theme(&mut self, now: Instant) {
        match self.dashboard.toggle_theme() {
            Ok(kind) => {
                let label = match kind {
                    ThemeKind::Dark => "Thème sombre",
                    ThemeKind::Light => "Thème clair",
                };
                self.notifications.push(now, NotificationKind::Info, label);
            }
            Err(e) => self.report_error(now, format!("Thème non enregistré: {}", e)),
        }
    }

    pub fn toggle_view(&mut self, now: Instant) {
        match self.dashboard.toggle_view() {
            Ok(mode) => {
                let label = match mode {
                    ViewMode::Grid => "Vue grille",
                    ViewMode::List => "Vue liste",
                };
                self.notifications.push(now, NotificationKind::Info, label);
            }
            Err(e) => self.report_error(now, format!("Vue non enregistrée: {}", e)),
        }
    }

    pub fn resize(&mut self, width: u16) {
        if self.dashboard.resize(width) {
            self.clamp_selection();
        }
    }

    /// Log an error and, in debug mode, show it as a toast
    pub fn report_error(&mut self, now: Instant, message: String) {
        warn!("{}", message);
        if self.dashboard.config().ui.debug {
            self.notifications
                .push(now, NotificationKind::Error, message);
        }
    }

    /// Timers: debounced search, metrics, toasts
    pub fn tick(&mut self, now: Instant) {
        if self.dashboard.tick(now) {
            self.selected_index = 0;
            self.scroll_offset = 0;
        }

        self.notifications.prune(now);

        if now >= self.next_metrics_at {
            let cpu = self.simulator.step().cpu;
            if self.cpu_history.len() == CPU_HISTORY_LEN {
                self.cpu_history.pop_front();
            }
            self.cpu_history.push_back(cpu);
            self.next_metrics_at = now + self.metrics_interval;
        }
    }

    /// How long the event loop may block before something needs doing
    pub fn next_deadline(&self, now: Instant) -> Duration {
        let metrics = self.next_metrics_at.saturating_duration_since(now);

        [
            Some(CLOCK_TICK),
            Some(metrics),
            self.dashboard.search().next_deadline(now),
            self.notifications.next_expiry(now),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(CLOCK_TICK)
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.quit();
            return Action::Quit;
        }

        if ctrl && key.code == KeyCode::Char('k') {
            self.show_help = false;
            self.enter_search_mode();
            return Action::None;
        }

        if self.show_help {
            self.show_help = false;
            return Action::None;
        }

        match self.input_mode {
            InputMode::Searching => match key.code {
                KeyCode::Esc => {
                    self.dashboard.clear_search();
                    self.selected_index = 0;
                    self.scroll_offset = 0;
                    self.enter_normal_mode();
                }
                KeyCode::Enter => {
                    if self.dashboard.flush_search() {
                        self.selected_index = 0;
                        self.scroll_offset = 0;
                    }
                    self.enter_normal_mode();
                }
                KeyCode::Down | KeyCode::Tab => {
                    self.enter_normal_mode();
                }
                KeyCode::Backspace => {
                    self.dashboard.search_backspace(now);
                }
                KeyCode::Char(c) => {
                    self.dashboard.search_push(now, c);
                }
                _ => {}
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => {
                    self.quit();
                    return Action::Quit;
                }
                KeyCode::Char('/') => {
                    self.enter_search_mode();
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.next_row();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.previous_row();
                }
                KeyCode::Char('l') | KeyCode::Right => {
                    self.next_card();
                }
                KeyCode::Char('h') | KeyCode::Left => {
                    self.previous_card();
                }
                KeyCode::Enter => {
                    if let Some(card) = self.selected_card() {
                        return Action::Open(card.href.clone());
                    }
                }
                KeyCode::Char('f') | KeyCode::Char(' ') => {
                    self.toggle_selected_favorite(now);
                }
                KeyCode::Char('a') => {
                    self.dashboard.edit_favorites();
                }
                KeyCode::Char('t') => {
                    self.toggle_theme(now);
                }
                KeyCode::Char('v') => {
                    self.toggle_view(now);
                }
                KeyCode::Tab => {
                    self.toggle_pane();
                }
                KeyCode::Char('r') => {
                    return Action::Reload;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                KeyCode::Esc => {
                    let search = self.dashboard.search();
                    if !search.input().is_empty()
                        || search.is_pending()
                        || self.dashboard.visibility().is_filtered()
                    {
                        self.dashboard.clear_search();
                        self.selected_index = 0;
                        self.scroll_offset = 0;
                    }
                }
                _ => {}
            },
        }

        Action::None
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> Action {
        if !self.dashboard.config().ui.mouse_enabled {
            return Action::None;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = self.card_at(mouse.column, mouse.row) {
                    self.select(&id);
                }
            }
            MouseEventKind::Down(MouseButton::Right) => {
                if let Some(id) = self.card_at(mouse.column, mouse.row) {
                    self.select(&id);
                    self.toggle_favorite(now, &id);
                }
            }
            MouseEventKind::ScrollDown => self.next_row(),
            MouseEventKind::ScrollUp => self.previous_row(),
            _ => {}
        }

        Action::None
    }

    pub fn card_at(&self, column: u16, row: u16) -> Option<String> {
        self.card_areas
            .iter()
            .find(|(_, area)| {
                column >= area.x
                    && column < area.x + area.width
                    && row >= area.y
                    && row < area.y + area.height
            })
            .map(|(id, _)| id.clone())
    }

    pub fn init_error(&self) -> Option<&str> {
        match self.dashboard.init_state() {
            InitState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
