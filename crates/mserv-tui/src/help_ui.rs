use crate::ui::rgb;
use crate::App;
use mserv_core::config::SearchConfig;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Render keybindings help popup
pub fn render_keybindings_help(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < 4 || area.height < 4 {
        return;
    }

    // Create centered popup (70% width, 80% height)
    let popup_area = centered_rect(70, 80, area);

    // Clear background
    frame.render_widget(Clear, popup_area);

    let colors = app.dashboard.theme().theme().colors;
    let bg_color = rgb(colors.secondary_bg);
    let fg_color = rgb(colors.primary_text);
    let accent_color = rgb(colors.accent);
    let muted_color = rgb(colors.muted);

    let keybindings = get_keybindings_content(
        &app.dashboard.config().search,
        accent_color,
        fg_color,
        muted_color,
    );

    let help_text = Paragraph::new(keybindings)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Raccourcis clavier ")
                .title_alignment(Alignment::Center)
                .border_style(Style::default().fg(accent_color))
                .style(Style::default().bg(bg_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color))
        .alignment(Alignment::Left);

    frame.render_widget(help_text, popup_area);

    // Help text at the very bottom
    let help_area = Rect {
        x: popup_area.x + 1,
        y: popup_area.y + popup_area.height.saturating_sub(1),
        width: popup_area.width.saturating_sub(2),
        height: 1,
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Appuyez sur ", Style::default().fg(muted_color)),
        Span::styled(
            "une touche ",
            Style::default()
                .fg(accent_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("pour fermer", Style::default().fg(muted_color)),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().bg(bg_color));

    frame.render_widget(footer, help_area);
}

/// Get all keybindings content as styled lines
fn get_keybindings_content(
    search: &SearchConfig,
    accent: Color,
    fg: Color,
    muted: Color,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    // Helper to create a section header
    let section = |title: &str| -> Line<'static> {
        Line::from(vec![Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(Color::Black)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
        )])
    };

    // Helper to create a keybinding line
    let key = |k: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("  {:14}", k),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(desc.to_string(), Style::default().fg(fg)),
        ])
    };

    lines.push(section("Général"));
    lines.push(Line::from(""));
    lines.push(key("q / Ctrl+C", "Quitter"));
    lines.push(key("?", "Afficher cette aide"));
    lines.push(key("t", "Basculer thème clair / sombre"));
    lines.push(key("v", "Basculer vue grille / liste"));
    lines.push(key("r", "Recharger le catalogue"));
    lines.push(Line::from(""));

    lines.push(section("Services"));
    lines.push(Line::from(""));
    lines.push(key("h j k l", "Se déplacer entre les services"));
    lines.push(key("Flèches", "Se déplacer entre les services"));
    lines.push(key("TAB", "Catégories / tous les services"));
    lines.push(key("ENTRÉE", "Ouvrir le service dans le navigateur"));
    lines.push(key("f / Espace", "Ajouter ou retirer des favoris"));
    lines.push(key("Clic droit", "Ajouter ou retirer des favoris"));
    lines.push(key("a", "Modifier les favoris (bientôt)"));
    lines.push(Line::from(""));

    lines.push(section("Recherche"));
    lines.push(Line::from(""));
    lines.push(key("/ ou Ctrl+K", "Aller à la recherche"));
    lines.push(key("ENTRÉE", "Filtrer tout de suite"));
    lines.push(key("ESC", "Effacer la recherche"));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![Span::styled(
        format!(
            "  La recherche filtre après {} ms sans frappe, dès {} caractères",
            search.debounce_ms, search.min_query_len
        ),
        Style::default().fg(muted).add_modifier(Modifier::ITALIC),
    )]));
    lines.push(Line::from(""));

    lines
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_search_hint_follows_config() {
        let search = SearchConfig {
            min_query_len: 3,
            debounce_ms: 150,
        };
        let content = text(&get_keybindings_content(
            &search,
            Color::Cyan,
            Color::White,
            Color::Gray,
        ));

        assert!(content.contains("après 150 ms sans frappe, dès 3 caractères"));
        assert!(!content.contains("300 ms"));
        assert!(content.contains("Modifier les favoris"));
    }

    #[test]
    fn test_centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(70, 80, area);
        assert_eq!(popup.width, 70);
        assert_eq!(popup.height, 40);
        assert!(popup.x >= area.x && popup.y >= area.y);
    }
}
