use ratatui::style::Color;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use crate::app::App;
use crate::models::Stage;
use crate::roulette::Scheduler;

pub fn hex_to_rgb(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
        Color::Rgb(r, g, b)
    } else {
        Color::White
    }
}

/// The centred column every screen draws into, leaving the header and
/// footer rows free.
pub fn content_area(area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Percentage(82),
            Constraint::Fill(1),
        ])
        .split(vertical[1]);

    horizontal[1]
}

pub fn render_header<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let mut header_spans = Vec::new();

    header_spans.push(Span::styled(
        "ruleta",
        Style::default()
            .fg(hex_to_rgb(&app.theme.main))
            .add_modifier(Modifier::BOLD),
    ));

    header_spans.push(Span::styled(
        format!(" | {}", app.stage.title()),
        Style::default().fg(hex_to_rgb(&app.theme.sub)),
    ));

    let header_row_area = Rect::new(0, 1, f.area().width, 1);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Percentage(82),
            Constraint::Fill(1),
        ])
        .split(header_row_area);

    f.render_widget(Paragraph::new(Line::from(header_spans)), header_layout[1]);
}

pub fn footer_hint(stage: Stage) -> &'static str {
    match stage {
        Stage::Chat => "enter: send | alt+enter: newline | ctrl+e: what happened inside? | esc: quit",
        Stage::Tokenization | Stage::Search => "→ / enter: next | esc: quit",
        Stage::Generation => "s / enter: start or restart | ←: back to chat | esc: quit",
    }
}

pub fn render_footer<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    if f.area().height == 0 {
        return;
    }
    let footer = Paragraph::new(footer_hint(app.stage))
        .style(Style::default().fg(hex_to_rgb(&app.theme.sub)))
        .alignment(Alignment::Center);
    f.render_widget(footer, Rect::new(0, f.area().height - 1, f.area().width, 1));
}
