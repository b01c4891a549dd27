use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Chat,
    Tokenization,
    Search,
    Generation,
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Chat => "chat",
            Stage::Tokenization => "step 1: tokens and magic numbers",
            Stage::Search => "step 2: searching what it learned",
            Stage::Generation => "step 3: token by token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Idle,
    Running,
    Completed,
}

/// One candidate on the roulette. `is_chosen` marks the real next token,
/// which is not necessarily the most probable one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouletteOption {
    pub token: String,
    pub probability: f64,
    pub is_chosen: bool,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub prompt: String,
    pub answer: Option<String>,
    pub asked_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenEmbedding {
    pub token: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DictionaryData {
    pub name: String,
    pub similar_words: HashMap<String, Vec<String>>,
    pub generic_pool: Vec<String>,
}
