use crate::models::TokenEmbedding;
use crate::roulette::scheduler::{Scheduler, TimerId};
use crate::utils::strings;
use rand::Rng;
use std::ops::Range;
use std::time::Duration;

pub const EMBEDDING_DIMS: usize = 6;
const EMBEDDING_VALUES: Range<f64> = 0.3..1.0;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(400);
pub const DEFAULT_EMBEDDING_DELAY: Duration = Duration::from_millis(600);

/// Splits the prompt into word tokens and reveals them one at a time, then
/// shows a toy embedding vector per token after a short pause.
pub struct TokenizationAnimator {
    reveal_delay: Duration,
    embedding_delay: Duration,
    tokens: Vec<String>,
    embeddings: Vec<TokenEmbedding>,
    visible: usize,
    show_embeddings: bool,
    pending: Option<TimerId>,
}

impl TokenizationAnimator {
    pub fn new(reveal_delay: Duration, embedding_delay: Duration) -> Self {
        Self {
            reveal_delay,
            embedding_delay,
            tokens: Vec::new(),
            embeddings: Vec::new(),
            visible: 0,
            show_embeddings: false,
            pending: None,
        }
    }

    pub fn set_prompt(
        &mut self,
        prompt: &str,
        scheduler: &mut impl Scheduler,
        rng: &mut impl Rng,
    ) {
        self.disarm(scheduler);
        self.tokens = strings::split_tokens(prompt);
        self.embeddings = self
            .tokens
            .iter()
            .map(|token| TokenEmbedding {
                token: token.clone(),
                values: (0..EMBEDDING_DIMS)
                    .map(|_| rng.random_range(EMBEDDING_VALUES))
                    .collect(),
            })
            .collect();
        self.visible = 0;
        self.show_embeddings = false;

        if !self.tokens.is_empty() {
            self.pending = Some(scheduler.schedule(self.reveal_delay));
        }
    }

    pub fn on_timer(&mut self, id: TimerId, scheduler: &mut impl Scheduler) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;

        if self.visible < self.tokens.len() {
            self.visible += 1;
            let next = if self.visible < self.tokens.len() {
                self.reveal_delay
            } else {
                self.embedding_delay
            };
            self.pending = Some(scheduler.schedule(next));
        } else {
            self.show_embeddings = true;
        }
        true
    }

    pub fn unmount(&mut self, scheduler: &mut impl Scheduler) {
        self.disarm(scheduler);
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn visible_tokens(&self) -> &[String] {
        &self.tokens[..self.visible]
    }

    pub fn embeddings(&self) -> &[TokenEmbedding] {
        &self.embeddings
    }

    pub fn show_embeddings(&self) -> bool {
        self.show_embeddings
    }

    pub fn is_animating(&self) -> bool {
        self.pending.is_some()
    }

    fn disarm(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }
}
