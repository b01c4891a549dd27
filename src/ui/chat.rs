use crate::app::App;
use crate::roulette::Scheduler;
use crate::ui::utils::{content_area, hex_to_rgb};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use textwrap::Options;

const PLACEHOLDER: &str = "Ask anything and watch the model answer. \
Afterwards you can look at what happens inside.";

pub fn draw<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let area = content_area(f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

    let sub = hex_to_rgb(&app.theme.sub);
    let text = hex_to_rgb(&app.theme.text);
    let main = hex_to_rgb(&app.theme.main);
    let border = hex_to_rgb(&app.theme.sub_alt);

    let window = Block::default()
        .borders(Borders::ALL)
        .title(" chat ")
        .style(Style::default().fg(border));
    let window_inner = window.inner(chunks[0]);
    f.render_widget(window, chunks[0]);

    let width = window_inner.width.saturating_sub(2).max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();

    match &app.last_turn {
        None => {
            for row in textwrap::wrap(PLACEHOLDER, width) {
                lines.push(Line::from(Span::styled(row.into_owned(), Style::default().fg(sub))));
            }
        }
        Some(turn) => {
            lines.push(Line::from(vec![
                Span::styled("you", Style::default().fg(main).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" · {}", turn.asked_at.format("%H:%M")),
                    Style::default().fg(sub),
                ),
            ]));
            push_wrapped(&mut lines, &turn.prompt, width, Style::default().fg(text));
            lines.push(Line::default());

            lines.push(Line::from(Span::styled(
                "llm",
                Style::default().fg(main).add_modifier(Modifier::BOLD),
            )));
            match (&turn.answer, app.is_loading) {
                (_, true) => lines.push(Line::from(Span::styled(
                    "  thinking...",
                    Style::default().fg(sub).add_modifier(Modifier::ITALIC),
                ))),
                (Some(answer), false) => {
                    push_wrapped(&mut lines, answer, width, Style::default().fg(text))
                }
                (None, false) => {}
            }
        }
    }

    // keep the newest lines in view
    let visible = window_inner.height as usize;
    let skip = lines.len().saturating_sub(visible);
    let shown: Vec<Line> = lines.into_iter().skip(skip).collect();
    f.render_widget(Paragraph::new(shown), window_inner);

    draw_input(f, app, chunks[1]);

    let status = if let Some(error) = &app.last_error {
        Line::from(Span::styled(
            format!("relay unavailable: {}", error),
            Style::default().fg(hex_to_rgb(&app.theme.error)),
        ))
    } else if app.can_explain() {
        Line::from(Span::styled(
            "ctrl+e: what happens between your question and the answer?",
            Style::default().fg(main),
        ))
    } else {
        Line::default()
    };
    f.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[2]);
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    let options = Options::new(width)
        .initial_indent("  ")
        .subsequent_indent("  ");
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(Line::default());
            continue;
        }
        for row in textwrap::wrap(paragraph, &options) {
            lines.push(Line::from(Span::styled(row.into_owned(), style)));
        }
    }
}

fn draw_input<S: Scheduler>(f: &mut Frame, app: &App<S>, area: ratatui::layout::Rect) {
    let title = if app.is_loading { " thinking... " } else { " prompt " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(hex_to_rgb(&app.theme.caret))))
        .style(Style::default().fg(hex_to_rgb(&app.theme.sub_alt)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width.max(1) as usize;
    let text_style = Style::default().fg(hex_to_rgb(&app.theme.text));

    if app.input.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "type your prompt here...",
                Style::default().fg(hex_to_rgb(&app.theme.sub)),
            )),
            inner,
        );
        f.set_cursor_position((inner.x, inner.y));
        return;
    }

    let mut rows: Vec<String> = Vec::new();
    for line in app.input.split('\n') {
        let wrapped = textwrap::wrap(line, width);
        if wrapped.is_empty() {
            rows.push(String::new());
        } else {
            rows.extend(wrapped.into_iter().map(|c| c.into_owned()));
        }
    }

    let visible = inner.height.max(1) as usize;
    let skip = rows.len().saturating_sub(visible);
    let shown: Vec<Line> = rows
        .iter()
        .skip(skip)
        .map(|r| Line::from(Span::styled(r.clone(), text_style)))
        .collect();
    let cursor_row = (rows.len() - skip).saturating_sub(1) as u16;
    let cursor_col = rows.last().map(|r| r.chars().count()).unwrap_or(0) as u16;

    f.render_widget(Paragraph::new(shown), inner);
    f.set_cursor_position((
        inner.x + cursor_col.min(inner.width.saturating_sub(1)),
        inner.y + cursor_row,
    ));
}
