// TUI event loop and terminal management
use crate::{Action, App};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::{Stream, StreamExt};
use mserv_core::{Catalog, CatalogSource};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, info};

/// Fallback when the terminal size can't be queried (piped output, CI)
const DEFAULT_WIDTH: u16 = 120;

/// An in-flight catalog fetch. Dropping it cancels the request.
type PendingLoad<'a> = Pin<Box<dyn Future<Output = mserv_core::Result<Catalog>> + Send + 'a>>;

/// Current terminal width, used to pick the starting breakpoint
pub fn terminal_width() -> u16 {
    crossterm::terminal::size()
        .map(|(width, _)| width)
        .unwrap_or(DEFAULT_WIDTH)
}

pub async fn run_tui(mut app: App, source: &dyn CatalogSource) -> anyhow::Result<()> {
    let mouse = app.dashboard.config().ui.mouse_enabled;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if mouse {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut app, source, EventStream::new(), |app| {
        terminal.draw(|f| crate::ui::render(f, app))?;
        Ok(())
    })
    .await;

    // Restore terminal, even if the loop bailed out
    disable_raw_mode()?;
    if mouse {
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

/// Main loop. Input keeps flowing while the catalog fetch is pending, so
/// a server that never answers can't lock the terminal.
async fn event_loop<S, D>(
    app: &mut App,
    source: &dyn CatalogSource,
    mut events: S,
    mut draw: D,
) -> anyhow::Result<()>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
    D: FnMut(&mut App) -> anyhow::Result<()>,
{
    let origin = source.describe();
    info!("Loading catalog from {}", origin);
    app.begin_load();
    let mut pending: Option<PendingLoad<'_>> = Some(source.fetch());

    loop {
        draw(app)?;
        let timeout = app.next_deadline(Instant::now());

        tokio::select! {
            fetched = settle(&mut pending) => {
                pending = None;
                app.finish_load(Instant::now(), &origin, fetched);
            }
            event = events.next() => {
                let Some(event) = event else {
                    debug!("Input stream closed");
                    break;
                };
                let now = Instant::now();
                match handle_event(app, event?, now) {
                    Action::None | Action::Quit => {}
                    Action::Reload => {
                        // A reload supersedes whatever is still in flight
                        info!("Reloading catalog from {}", origin);
                        app.begin_load();
                        pending = Some(source.fetch());
                    }
                    Action::Open(href) => {
                        debug!("Opening {}", href);
                        if let Err(e) = open::that(&href) {
                            app.report_error(now, format!("Impossible d'ouvrir {}: {}", href, e));
                        }
                    }
                }
            }
            _ = tokio::time::sleep(timeout) => {}
        }

        app.tick(Instant::now());

        if app.should_quit {
            if pending.is_some() {
                debug!("Quitting with a catalog fetch still pending");
            }
            break;
        }
    }

    Ok(())
}

/// Resolves with the pending fetch, or never when nothing is in flight
async fn settle(pending: &mut Option<PendingLoad<'_>>) -> mserv_core::Result<Catalog> {
    match pending {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

fn handle_event(app: &mut App, event: Event, now: Instant) -> Action {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key, now),
        Event::Mouse(mouse) => app.handle_mouse(mouse, now),
        Event::Resize(width, _) => {
            app.resize(width);
            Action::None
        }
        _ => Action::None,
    }
}
