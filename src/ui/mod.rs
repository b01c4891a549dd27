pub mod chat;
pub mod generation;
pub mod search;
pub mod tokenization;
pub mod utils;

use crate::app::App;
use crate::models::Stage;
use crate::roulette::Scheduler;
use crate::ui::utils::{hex_to_rgb, render_footer, render_header};
use ratatui::{
    style::Style,
    widgets::Block,
    Frame,
};

pub fn render<S: Scheduler>(f: &mut Frame, app: &App<S>) {
    let bg_color = hex_to_rgb(&app.theme.bg);
    f.render_widget(
        Block::default().style(Style::default().bg(bg_color)),
        f.area(),
    );

    render_header(f, app);

    match app.stage {
        Stage::Chat => chat::draw(f, app),
        Stage::Tokenization => tokenization::draw(f, app),
        Stage::Search => search::draw(f, app),
        Stage::Generation => generation::draw(f, app),
    }

    render_footer(f, app);
}
