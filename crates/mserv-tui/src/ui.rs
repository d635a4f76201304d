// UI rendering logic
use crate::app::ServicesPane;
use crate::sparkline::{render_percent_sparkline, tail};
use crate::{help_ui, App, InputMode};
use mserv_core::notifications::NotificationKind;
use mserv_core::theme::{Color as ThemeColor, ThemeColors};
use mserv_core::view::ServiceCard;
use mserv_core::{Breakpoint, InitState, StatusLevel, ViewMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Width of the system panel on tablet and desktop
const SYSTEM_PANEL_WIDTH: u16 = 34;

pub(crate) fn rgb(color: ThemeColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    app.card_areas.clear();
    if area.width == 0 || area.height == 0 {
        return;
    }

    let colors = app.dashboard.theme().theme().colors;
    frame.render_widget(
        Block::default().style(
            Style::default()
                .bg(rgb(colors.primary_bg))
                .fg(rgb(colors.primary_text)),
        ),
        area,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search input
            Constraint::Length(3), // Favorites strip
            Constraint::Min(3),    // Services + system panel
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_search_input(frame, app, chunks[1]);
    render_favorites(frame, app, chunks[2]);

    // The system panel goes away on narrow terminals
    if app.dashboard.layout().breakpoint() == Breakpoint::Mobile {
        render_services(frame, app, chunks[3]);
    } else {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(20),
                Constraint::Length(SYSTEM_PANEL_WIDTH),
            ])
            .split(chunks[3]);
        render_services(frame, app, content_chunks[0]);
        render_system_panel(frame, app, content_chunks[1]);
    }

    render_status_bar(frame, app, chunks[4]);
    render_notifications(frame, app, area);

    if let Some(message) = app.init_error().map(str::to_string) {
        render_init_error(frame, app, area, &message);
    }

    if app.show_help {
        help_ui::render_keybindings_help(frame, app, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let screen_width = area.width;

    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(area);

    // Left: logo and version, shortened on tiny screens
    let logo_text = if screen_width < 80 {
        "mserv".to_string()
    } else {
        format!("mserv v{}", env!("CARGO_PKG_VERSION"))
    };
    let logo = Paragraph::new(Line::from(Span::styled(
        logo_text,
        Style::default()
            .fg(rgb(colors.accent))
            .add_modifier(Modifier::BOLD),
    )))
    .block(bordered(&colors));
    frame.render_widget(logo, header_chunks[0]);

    // Center: pane tabs
    let tab = |pane: ServicesPane| {
        if app.pane == pane {
            Span::styled(
                format!(" {} ", pane.title()),
                Style::default()
                    .fg(rgb(colors.secondary_bg))
                    .bg(rgb(colors.accent))
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!(" {} ", pane.title()),
                Style::default().fg(rgb(colors.muted)),
            )
        }
    };
    let tabs = Paragraph::new(Line::from(vec![
        tab(ServicesPane::Groups),
        Span::raw(" "),
        tab(ServicesPane::All),
    ]))
    .alignment(Alignment::Center)
    .block(bordered(&colors));
    frame.render_widget(tabs, header_chunks[1]);

    // Right: theme, view toggle, clock
    let view_mode = app.dashboard.layout().view_mode();
    let clock = chrono::Local::now().format("%H:%M").to_string();
    let right = Paragraph::new(Line::from(vec![
        Span::styled(
            app.dashboard.theme().kind().icon(),
            Style::default().fg(rgb(colors.accent)),
        ),
        Span::raw("  "),
        Span::styled(
            view_mode.toggle_label(),
            Style::default().fg(rgb(colors.secondary_text)),
        ),
        Span::raw("  "),
        Span::styled(clock, Style::default().add_modifier(Modifier::BOLD)),
    ]))
    .alignment(Alignment::Right)
    .block(bordered(&colors));
    frame.render_widget(right, header_chunks[2]);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let searching = app.input_mode == InputMode::Searching;
    let input_style = if searching {
        Style::default().fg(rgb(colors.accent))
    } else {
        Style::default().fg(rgb(colors.border))
    };

    let indicator = app
        .dashboard
        .visibility()
        .indicator()
        .map(|i| i.label())
        .unwrap_or_default();
    let indicator_width = if indicator.is_empty() {
        0
    } else {
        indicator.chars().count() as u16 + 2
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(indicator_width)])
        .split(area);

    let input_text = app.dashboard.search().input();
    let input = Paragraph::new(input_text)
        .style(Style::default().fg(rgb(colors.primary_text)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Rechercher un service (Ctrl+K) ")
                .border_style(input_style),
        );
    frame.render_widget(input, chunks[0]);

    if indicator_width > 0 && chunks[1].height > 1 {
        let badge = Paragraph::new(Span::styled(
            indicator,
            Style::default()
                .fg(rgb(colors.accent))
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        let badge_area = Rect {
            y: chunks[1].y + 1,
            height: 1,
            ..chunks[1]
        };
        frame.render_widget(badge, badge_area);
    }

    // Show cursor when typing
    if searching && chunks[0].width > 2 {
        let offset = (input_text.chars().count() as u16).min(chunks[0].width - 2);
        frame.set_cursor_position((chunks[0].x + offset + 1, chunks[0].y + 1));
    }
}

fn render_favorites(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let strip = &app.dashboard.view().favorites;

    let mut spans = Vec::new();
    for entry in &strip.entries {
        spans.push(Span::styled("★ ", Style::default().fg(rgb(colors.favorite))));
        spans.push(Span::styled(
            entry.name.clone(),
            Style::default().fg(rgb(colors.primary_text)),
        ));
        spans.push(Span::raw("   "));
    }
    spans.push(Span::styled(
        format!("[+ {}]", strip.add_button.label),
        Style::default()
            .fg(rgb(colors.accent))
            .add_modifier(Modifier::BOLD),
    ));

    let favorites = Paragraph::new(Line::from(spans)).block(
        bordered(&colors).title(" Favoris "),
    );
    frame.render_widget(favorites, area);
}

/// One line of the services pane, before it's positioned on screen
enum Row {
    Header { name: String, icon: String },
    Cards(Vec<(usize, ServiceCard)>),
}

fn render_services(frame: &mut Frame, app: &mut App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let view_mode = app.dashboard.layout().view_mode();
    let columns = app.dashboard.layout().columns().max(1);

    let title = match view_mode {
        ViewMode::Grid => format!(" {} · grille ", app.pane.title()),
        ViewMode::List => format!(" {} · liste ", app.pane.title()),
    };
    let block = bordered(&colors).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let rows = build_rows(app, columns);
    if rows.is_empty() {
        render_empty_services(frame, app, inner);
        return;
    }

    let card_height: u16 = match view_mode {
        ViewMode::Grid => 4,
        ViewMode::List => 1,
    };
    let row_height = |row: &Row| match row {
        Row::Header { .. } => 1usize,
        Row::Cards(_) => usize::from(card_height),
    };

    // Row tops in pane coordinates
    let mut tops = Vec::with_capacity(rows.len());
    let mut y = 0usize;
    for row in &rows {
        tops.push(y);
        y += row_height(row);
    }

    // Keep the selected card on screen
    let viewport = usize::from(inner.height);
    let selected_row = rows.iter().position(|row| match row {
        Row::Cards(cards) => cards.iter().any(|(i, _)| *i == app.selected_index),
        Row::Header { .. } => false,
    });
    if let Some(pos) = selected_row {
        // Pull the group header into view along with its first row
        let top = if pos > 0 && matches!(rows[pos - 1], Row::Header { .. }) {
            tops[pos - 1]
        } else {
            tops[pos]
        };
        let bottom = tops[pos] + row_height(&rows[pos]);
        if top < app.scroll_offset {
            app.scroll_offset = top;
        } else if bottom > app.scroll_offset + viewport {
            app.scroll_offset = bottom.saturating_sub(viewport);
        }
    }
    let scroll = app.scroll_offset;

    for (row, top) in rows.iter().zip(tops.iter().copied()) {
        let height = row_height(row);
        if top < scroll || top + height > scroll + viewport {
            continue;
        }
        let row_area = Rect {
            x: inner.x,
            y: inner.y + (top - scroll) as u16,
            width: inner.width,
            height: height as u16,
        };

        match row {
            Row::Header { name, icon } => {
                let header = Paragraph::new(Line::from(vec![
                    Span::styled("▸ ", Style::default().fg(rgb(colors.accent))),
                    Span::styled(
                        name.clone(),
                        Style::default()
                            .fg(rgb(colors.primary_text))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  {}", icon), Style::default().fg(rgb(colors.muted))),
                ]));
                frame.render_widget(header, row_area);
            }
            Row::Cards(cards) => {
                let constraints: Vec<Constraint> = (0..columns)
                    .map(|_| Constraint::Ratio(1, columns as u32))
                    .collect();
                let cells = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(constraints)
                    .split(row_area);

                for ((index, card), cell) in cards.iter().zip(cells.iter()) {
                    let selected = *index == app.selected_index;
                    match view_mode {
                        ViewMode::Grid => render_card(frame, card, selected, &colors, *cell),
                        ViewMode::List => render_list_line(frame, card, selected, &colors, *cell),
                    }
                    app.card_areas.push((card.id.clone(), *cell));
                }
            }
        }
    }
}

/// Lay the visible cards of the current pane out into rows
fn build_rows(app: &App, columns: usize) -> Vec<Row> {
    let view = app.dashboard.view();
    let visibility = app.dashboard.visibility();
    let mut rows = Vec::new();
    let mut index = 0usize;

    let mut push_cards = |rows: &mut Vec<Row>, cards: Vec<&ServiceCard>| {
        for chunk in cards.chunks(columns) {
            let row = chunk
                .iter()
                .map(|card| {
                    let entry = (index, (*card).clone());
                    index += 1;
                    entry
                })
                .collect();
            rows.push(Row::Cards(row));
        }
    };

    match app.pane {
        ServicesPane::Groups => {
            for group in view
                .groups
                .iter()
                .filter(|g| visibility.is_group_visible(&g.id))
            {
                let cards: Vec<&ServiceCard> = group
                    .services
                    .iter()
                    .filter(|c| visibility.is_service_visible(&c.id))
                    .collect();
                if cards.is_empty() {
                    continue;
                }
                rows.push(Row::Header {
                    name: group.name.clone(),
                    icon: group.icon.clone(),
                });
                push_cards(&mut rows, cards);
            }
        }
        ServicesPane::All => {
            let cards = view
                .grid
                .iter()
                .filter(|c| visibility.is_service_visible(&c.id))
                .collect();
            push_cards(&mut rows, cards);
        }
    }

    rows
}

fn render_card(frame: &mut Frame, card: &ServiceCard, selected: bool, colors: &ThemeColors, area: Rect) {
    let border = if selected { colors.accent } else { colors.border };
    let width = usize::from(area.width.saturating_sub(4));

    let mut name = Vec::new();
    if card.favorite {
        name.push(Span::styled("★ ", Style::default().fg(rgb(colors.favorite))));
    }
    name.push(Span::styled(
        truncate(&card.name, width),
        Style::default()
            .fg(rgb(colors.primary_text))
            .add_modifier(Modifier::BOLD),
    ));

    let body = Paragraph::new(vec![
        Line::from(name),
        Line::from(Span::styled(
            truncate(&card.description, width),
            Style::default().fg(rgb(colors.muted)),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(rgb(border)))
            .style(Style::default().bg(rgb(colors.secondary_bg))),
    );
    frame.render_widget(body, area);
}

fn render_list_line(frame: &mut Frame, card: &ServiceCard, selected: bool, colors: &ThemeColors, area: Rect) {
    let marker = if selected { "▶ " } else { "  " };
    let star = if card.favorite { "★ " } else { "  " };
    let style = if selected {
        Style::default()
            .bg(rgb(colors.tertiary_bg))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(marker, style.fg(rgb(colors.accent))),
        Span::styled(star, style.fg(rgb(colors.favorite))),
        Span::styled(format!("{:<18}", card.name), style.fg(rgb(colors.primary_text))),
        Span::styled(card.description.clone(), style.fg(rgb(colors.muted))),
        Span::styled(format!("  {}", card.href), style.fg(rgb(colors.secondary_text))),
    ]);
    frame.render_widget(Paragraph::new(line).style(style), area);
}

fn render_empty_services(frame: &mut Frame, app: &App, area: Rect) {
    let colors = app.dashboard.theme().theme().colors;
    let message = match app.dashboard.init_state() {
        InitState::Loading => "Chargement des services...".to_string(),
        InitState::Failed(_) => "Catalogue indisponible".to_string(),
        InitState::Ready if app.dashboard.visibility().is_filtered() => format!(
            "Aucun service ne correspond à « {} »",
            app.dashboard.search().applied_query()
        ),
        InitState::Ready => "Aucun service".to_string(),
    };

    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(rgb(colors.muted)))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_system_panel(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let snapshot = app.simulator.snapshot();
    let status = snapshot.status();
    let summary = status.summary();

    let level_style = |level: StatusLevel| Style::default().fg(level_color(level, &colors));
    let weather = match summary.level {
        StatusLevel::Good => "☀",
        StatusLevel::Warning => "⛅",
        StatusLevel::Error => "☂",
    };

    let metric = |label: &str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(format!(" {:<10}", label), Style::default().fg(rgb(colors.muted))),
            Span::styled(value, style.add_modifier(Modifier::BOLD)),
        ])
    };

    let history: Vec<f64> = app.cpu_history.iter().copied().collect();
    let spark_width = usize::from(area.width.saturating_sub(4));

    let lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", weather), level_style(summary.level)),
            Span::styled(
                summary.title.clone(),
                level_style(summary.level).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("   {}", summary.description),
            Style::default().fg(rgb(colors.secondary_text)),
        )),
        Line::from(""),
        metric("CPU", format!("{:.0} %", snapshot.cpu), level_style(status.cpu)),
        Line::from(Span::styled(
            format!(" {}", render_percent_sparkline(tail(&history, spark_width))),
            Style::default().fg(rgb(colors.accent)),
        )),
        metric("RAM", format!("{:.1} Go", snapshot.ram), Style::default()),
        metric("Disque", format!("{:.0} %", snapshot.disk), level_style(status.disk)),
        metric(
            "Temp.",
            format!("{:.0} °C", snapshot.temperature),
            level_style(status.temperature),
        ),
        metric("Réseau", format!("{:.1} Mo/s", snapshot.network), Style::default()),
        metric(
            "Services",
            format!("{}/{}", snapshot.active_services, snapshot.total_services),
            level_style(status.services),
        ),
    ];

    let panel = Paragraph::new(lines)
        .block(bordered(&colors).title(" Système "))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;

    let status = match app.input_mode {
        InputMode::Searching => Span::styled(
            "RECHERCHE | ENTRÉE: filtrer | ESC: effacer | ↓: services",
            Style::default().fg(rgb(colors.warning)),
        ),
        InputMode::Normal => Span::styled(
            "hjkl: naviguer | /: rechercher | f: favori | ENTRÉE: ouvrir | TAB: vue | t: thème | v: grille/liste | r: recharger | ?: aide | q: quitter",
            Style::default().fg(rgb(colors.secondary_text)),
        ),
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

/// Toasts stacked in the top-right corner, newest at the bottom
fn render_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let colors = app.dashboard.theme().theme().colors;
    let width = area.width.min(44);
    if width < 6 {
        return;
    }

    let mut y = area.y + 1;
    for notification in app.notifications.active() {
        if y + 3 > area.y + area.height {
            break;
        }
        let toast_area = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height: 3,
        };
        let color = match notification.kind {
            NotificationKind::Success => colors.good,
            NotificationKind::Error => colors.error,
            NotificationKind::Warning => colors.warning,
            NotificationKind::Info => colors.info,
        };

        frame.render_widget(Clear, toast_area);
        let toast = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} ", notification.kind.icon()),
                Style::default().fg(rgb(color)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(notification.message.clone()),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(rgb(color)))
                .style(Style::default().bg(rgb(colors.secondary_bg))),
        );
        frame.render_widget(toast, toast_area);
        y += 3;
    }
}

fn render_init_error(frame: &mut Frame, app: &App, area: Rect, message: &str) {
    if area.width < 10 || area.height < 6 {
        return;
    }
    let colors = app.dashboard.theme().theme().colors;
    let popup = help_ui::centered_rect(60, 40, area);
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "⚠ Impossible de charger le catalogue des services.",
            Style::default()
                .fg(rgb(colors.error))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(rgb(colors.secondary_text)),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Appuyez sur "),
            Span::styled("r", Style::default().fg(rgb(colors.accent)).add_modifier(Modifier::BOLD)),
            Span::raw(" pour recharger ou "),
            Span::styled("q", Style::default().fg(rgb(colors.accent)).add_modifier(Modifier::BOLD)),
            Span::raw(" pour quitter."),
        ]),
    ];

    let dialog = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Erreur d'initialisation ")
                .title_alignment(Alignment::Center)
                .border_style(Style::default().fg(rgb(colors.error)))
                .style(Style::default().bg(rgb(colors.secondary_bg))),
        );
    frame.render_widget(dialog, popup);
}

fn bordered(colors: &ThemeColors) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(rgb(colors.border)))
}

fn level_color(level: StatusLevel, colors: &ThemeColors) -> Color {
    match level {
        StatusLevel::Good => rgb(colors.good),
        StatusLevel::Warning => rgb(colors.warning),
        StatusLevel::Error => rgb(colors.error),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
