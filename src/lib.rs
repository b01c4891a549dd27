pub mod app;
pub mod config;
pub mod models;
pub mod relay;
pub mod replay;
pub mod roulette;
pub mod tokenization;
pub mod ui;
pub mod utils;
