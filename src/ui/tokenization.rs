use crate::app::App;
use crate::roulette::Scheduler;
use crate::ui::utils::{content_area, hex_to_rgb};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const CHIP_COLORS: [Color; 7] = [
    Color::Rgb(0x7e, 0xb6, 0xff),
    Color::Rgb(0xa6, 0xe2, 0x2e),
    Color::Rgb(0xf9, 0x26, 0x72),
    Color::Rgb(0xfd, 0x97, 0x1f),
    Color::Rgb(0xae, 0x81, 0xff),
    Color::Rgb(0x66, 0xd9, 0xef),
    Color::Rgb(0xe6, 0xdb, 0x74),
];

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn chip_color(index: usize) -> Color {
    CHIP_COLORS[index % CHIP_COLORS.len()]
}

/// Maps a value in `[0, 1]` to a block glyph.
pub fn bar_glyph(value: f64) -> char {
    let clamped = value.clamp(0.0, 1.0);
    let idx = (clamped * (BARS.len() - 1) as f64).round() as usize;
    BARS[idx.min(BARS.len() - 1)]
}

pub fn draw<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let area = content_area(f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Fill(1),
        ])
        .split(area);

    let sub = hex_to_rgb(&app.theme.sub);
    let text = hex_to_rgb(&app.theme.text);
    let border = hex_to_rgb(&app.theme.sub_alt);

    let intro = "Before reading anything, the model cuts your prompt into tokens. \
Here each word is one token; real tokenizers split words into smaller pieces.";
    f.render_widget(
        Paragraph::new(intro)
            .style(Style::default().fg(sub))
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let mut chips: Vec<Span> = Vec::new();
    for (i, token) in app.tokenization.visible_tokens().iter().enumerate() {
        chips.push(Span::styled(
            format!(" {} ", token),
            Style::default()
                .fg(Color::Black)
                .bg(chip_color(i))
                .add_modifier(Modifier::BOLD),
        ));
        chips.push(Span::raw(" "));
    }
    let chips_title = format!(
        " tokens {}/{} ",
        app.tokenization.visible_tokens().len(),
        app.tokenization.tokens().len()
    );
    f.render_widget(
        Paragraph::new(Line::from(chips))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(chips_title)
                    .style(Style::default().fg(border)),
            ),
        chunks[1],
    );

    let embeddings_block = Block::default()
        .borders(Borders::ALL)
        .title(" embeddings ")
        .style(Style::default().fg(border));
    let inner = embeddings_block.inner(chunks[2]);
    f.render_widget(embeddings_block, chunks[2]);

    if !app.tokenization.show_embeddings() {
        let waiting = if app.tokenization.is_animating() {
            "each token will become a list of numbers..."
        } else {
            ""
        };
        f.render_widget(
            Paragraph::new(Span::styled(
                waiting,
                Style::default().fg(sub).add_modifier(Modifier::ITALIC),
            )),
            inner,
        );
        return;
    }

    let label_width = app
        .tokenization
        .tokens()
        .iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(0)
        .min(16);

    let mut lines: Vec<Line> = Vec::new();
    for (i, embedding) in app.tokenization.embeddings().iter().enumerate() {
        let label: String = embedding.token.chars().take(label_width).collect();
        let bars: String = embedding.values.iter().map(|v| bar_glyph(*v)).collect();
        let numbers = embedding
            .values
            .iter()
            .map(|v| format!("{:.2}", v))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<width$}  ", label, width = label_width),
                Style::default().fg(chip_color(i)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{}  ", bars), Style::default().fg(chip_color(i))),
            Span::styled(format!("[{}]", numbers), Style::default().fg(text)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Similar meanings end up with similar numbers. These are made up; real models use thousands of dimensions.",
        Style::default().fg(sub),
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
