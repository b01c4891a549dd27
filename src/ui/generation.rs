use crate::app::App;
use crate::models::StepperState;
use crate::roulette::Scheduler;
use crate::ui::utils::{content_area, hex_to_rgb};
use crate::utils::strings::format_percent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const BAR_WIDTH: usize = 24;

/// Label of the start control: first run vs. replay.
pub fn start_label(has_generated: bool) -> &'static str {
    if has_generated {
        "[s] restart"
    } else {
        "[s] start simulation"
    }
}

/// A horizontal bar of `width` cells filled in proportion to `probability`.
pub fn probability_bar(probability: f64, width: usize) -> String {
    let filled = (probability.clamp(0.0, 1.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn draw<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let area = content_area(f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Fill(1)])
        .split(area);

    f.render_widget(
        Paragraph::new(
            "For every position of the answer the model scores many possible tokens... and picks one.",
        )
        .style(Style::default().fg(hex_to_rgb(&app.theme.sub)))
        .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_roulette(f, app, columns[0]);
    draw_generated(f, app, columns[1]);
}

fn draw_roulette<S: Scheduler>(f: &mut Frame, app: &App<S>, area: Rect) {
    let sub = hex_to_rgb(&app.theme.sub);
    let main = hex_to_rgb(&app.theme.main);

    let title = match app.stepper.state() {
        StepperState::Running => " candidate tokens (spinning) ",
        _ => " candidate tokens ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(hex_to_rgb(&app.theme.sub_alt)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let options = app.stepper.current_options();
    let mut lines: Vec<Line> = Vec::new();

    if options.is_empty() {
        lines.push(Line::from(Span::styled(
            "Press s to watch the model pick its tokens one by one.",
            Style::default().fg(sub),
        )));
    } else {
        let label_width = options
            .iter()
            .map(|o| o.token.chars().count())
            .max()
            .unwrap_or(0)
            .min(18);

        for option in options {
            let style = if option.is_chosen {
                Style::default().fg(main).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(sub)
            };
            let marker = if option.is_chosen { "> " } else { "  " };
            let label: String = option.token.chars().take(label_width).collect();
            lines.push(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(format!("{:<width$} ", label, width = label_width), style),
                Span::styled(format!("{:>6} ", format_percent(option.probability)), style),
                Span::styled(probability_bar(option.probability, BAR_WIDTH), style),
            ]));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "A real model weighs thousands of tokens. Only a few are shown, and the highlighted one is the token that was actually written.",
        Style::default().fg(sub).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_generated<S: Scheduler>(f: &mut Frame, app: &App<S>, area: Rect) {
    let sub = hex_to_rgb(&app.theme.sub);
    let text = hex_to_rgb(&app.theme.text);
    let main = hex_to_rgb(&app.theme.main);

    let progress = format!(
        " generated text {}/{} ",
        app.stepper.current_index(),
        app.stepper.target_tokens().len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(progress)
        .style(Style::default().fg(hex_to_rgb(&app.theme.sub_alt)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let has_generated = !app.stepper.generated_tokens().is_empty();
    let mut lines: Vec<Line> = Vec::new();

    if has_generated {
        lines.push(Line::from(Span::styled(
            app.stepper.generated_text(),
            Style::default().fg(text),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "The sentence will be built here, token by token...",
            Style::default().fg(sub),
        )));
    }

    lines.push(Line::default());
    let control = if app.stepper.is_running() {
        Span::styled("generating...", Style::default().fg(sub))
    } else {
        Span::styled(
            start_label(has_generated),
            Style::default().fg(main).add_modifier(Modifier::BOLD),
        )
    };
    lines.push(Line::from(control));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Each time a token is added the model recomputes the odds of the next one, taking everything generated so far into account.",
        Style::default().fg(sub).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
