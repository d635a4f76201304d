use mserv_cache::KeyValueStore;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::Result;

/// Storage key for the saved view mode
pub const VIEW_KEY: &str = "mserv_ui_view";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::List,
            Self::List => Self::Grid,
        }
    }

    /// Label of the button that switches away from this mode
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Grid => "Vue liste",
            Self::List => "Vue grille",
        }
    }
}

/// Terminal width class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Mobile,
    Tablet,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(columns: u16) -> Self {
        match columns {
            0..=79 => Self::Mobile,
            80..=119 => Self::Tablet,
            _ => Self::Desktop,
        }
    }

    pub fn grid_columns(self) -> usize {
        match self {
            Self::Mobile => 1,
            Self::Tablet => 2,
            Self::Desktop => 3,
        }
    }
}

/// View mode plus the current breakpoint
///
/// Narrow terminals get the list view whatever was saved; the saved value
/// is only touched by an explicit toggle.
pub struct LayoutState {
    mode: ViewMode,
    breakpoint: Breakpoint,
    storage: Rc<dyn KeyValueStore>,
}

impl LayoutState {
    pub fn load(storage: Rc<dyn KeyValueStore>, width: u16) -> Self {
        let mode = match storage.get(VIEW_KEY) {
            Ok(Some(raw)) => ViewMode::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown stored view mode '{}', using grid", raw);
                ViewMode::default()
            }),
            Ok(None) => ViewMode::default(),
            Err(e) => {
                warn!("Could not read view mode ({}), using grid", e);
                ViewMode::default()
            }
        };

        let mut layout = Self {
            mode,
            breakpoint: Breakpoint::from_width(width),
            storage,
        };
        layout.enforce_breakpoint();
        layout
    }

    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    /// Columns to lay cards out in for the current mode and width
    pub fn columns(&self) -> usize {
        match self.mode {
            ViewMode::Grid => self.breakpoint.grid_columns(),
            ViewMode::List => 1,
        }
    }

    pub fn toggle_view(&mut self) -> Result<ViewMode> {
        let next = self.mode.toggled();
        self.storage.set(VIEW_KEY, next.as_str())?;
        self.mode = next;
        debug!("View mode set to {}", next.as_str());
        Ok(next)
    }

    /// Terminal resized. Returns true when the breakpoint changed.
    pub fn resize(&mut self, width: u16) -> bool {
        let breakpoint = Breakpoint::from_width(width);
        if breakpoint == self.breakpoint {
            return false;
        }
        debug!("Breakpoint {:?} -> {:?}", self.breakpoint, breakpoint);
        self.breakpoint = breakpoint;
        self.enforce_breakpoint();
        true
    }

    fn enforce_breakpoint(&mut self) {
        if self.breakpoint == Breakpoint::Mobile && self.mode == ViewMode::Grid {
            self.mode = ViewMode::List;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mserv_cache::MemoryStore;

    fn storage(entries: &[(&str, &str)]) -> Rc<MemoryStore> {
        Rc::new(MemoryStore::with_entries(entries.iter().copied()))
    }

    #[test]
    fn test_breakpoints() {
        assert_eq!(Breakpoint::from_width(40), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(79), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(80), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(119), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(120), Breakpoint::Desktop);
        assert_eq!(Breakpoint::Desktop.grid_columns(), 3);
    }

    #[test]
    fn test_saved_mode_is_restored() {
        let layout = LayoutState::load(storage(&[(VIEW_KEY, "list")]), 200);
        assert_eq!(layout.view_mode(), ViewMode::List);
        assert_eq!(layout.columns(), 1);
    }

    #[test]
    fn test_mobile_forces_list_without_saving() {
        let store = storage(&[(VIEW_KEY, "grid")]);
        let mut layout = LayoutState::load(store.clone(), 200);
        assert_eq!(layout.columns(), 3);

        assert!(layout.resize(60));
        assert_eq!(layout.view_mode(), ViewMode::List);
        assert_eq!(store.get(VIEW_KEY).unwrap().as_deref(), Some("grid"));
    }

    #[test]
    fn test_toggle_persists() {
        let store = storage(&[]);
        let mut layout = LayoutState::load(store.clone(), 100);
        assert_eq!(layout.view_mode(), ViewMode::Grid);
        assert_eq!(layout.view_mode().toggle_label(), "Vue liste");

        assert_eq!(layout.toggle_view().unwrap(), ViewMode::List);
        assert_eq!(store.get(VIEW_KEY).unwrap().as_deref(), Some("list"));
    }

    #[test]
    fn test_resize_within_breakpoint_is_noop() {
        let mut layout = LayoutState::load(storage(&[]), 130);
        assert!(!layout.resize(150));
    }
}
