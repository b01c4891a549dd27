use crate::app::App;
use crate::roulette::Scheduler;
use crate::ui::utils::{content_area, hex_to_rgb};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

pub const GRID_SIDE: usize = 3;

pub fn draw<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let area = content_area(f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(6),
        ])
        .split(area);

    let sub = hex_to_rgb(&app.theme.sub);
    let text = hex_to_rgb(&app.theme.text);
    let main = hex_to_rgb(&app.theme.main);

    f.render_widget(
        Paragraph::new(
            "Now the model compares your question with everything it learned during training.",
        )
        .style(Style::default().fg(sub))
        .wrap(Wrap { trim: true }),
        chunks[0],
    );

    draw_grid(f, app, chunks[1]);

    let explanation = vec![
        Line::from(Span::styled(
            "During training the model read huge amounts of text: books, websites, code, articles...",
            Style::default().fg(text),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(
                "When you ask something it does not search the internet. It uses the ",
                Style::default().fg(text),
            ),
            Span::styled(
                "patterns",
                Style::default().fg(main).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " it learned to estimate which words are the most likely answer.",
                Style::default().fg(text),
            ),
        ]),
    ];
    f.render_widget(
        Paragraph::new(explanation)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .style(Style::default().fg(hex_to_rgb(&app.theme.sub_alt))),
            ),
        chunks[2],
    );
}

fn draw_grid<S: Scheduler>(f: &mut Frame, app: &App<S>, area: Rect) {
    let row_constraints = vec![Constraint::Ratio(1, GRID_SIDE as u32); GRID_SIDE];
    let col_constraints = vec![Constraint::Ratio(1, GRID_SIDE as u32); GRID_SIDE];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (r, row) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints.clone())
            .split(*row);

        for (c, cell) in cells.iter().enumerate() {
            let n = r * GRID_SIDE + c + 1;
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .style(Style::default().fg(hex_to_rgb(&app.theme.sub_alt)));
            let inner = block.inner(*cell);
            f.render_widget(block, *cell);

            // vertically centre the label
            let label_area = Rect::new(
                inner.x,
                inner.y + inner.height.saturating_sub(1) / 2,
                inner.width,
                inner.height.min(1),
            );
            f.render_widget(
                Paragraph::new(format!("Fragment {}", n))
                    .style(Style::default().fg(hex_to_rgb(&app.theme.text)))
                    .alignment(Alignment::Center),
                label_area,
            );
        }
    }
}
