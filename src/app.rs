use crate::config::{AppConfig, Theme};
use crate::models::{ChatTurn, Stage};
use crate::relay::{RelayClient, RelayError, CLIENT_FALLBACK_ANSWER};
use crate::roulette::{
    DistractorDictionary, GenerationStepper, Roulette, Scheduler, WallClockScheduler,
};
use crate::tokenization::TokenizationAnimator;
use crate::utils::strings;
use anyhow::Result;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

type Reply = Result<String, RelayError>;

pub struct App<S: Scheduler = WallClockScheduler> {
    pub should_quit: bool,
    pub stage: Stage,
    pub theme: Theme,

    pub input: String,
    pub last_turn: Option<ChatTurn>,
    pub is_loading: bool,
    pub last_error: Option<String>,

    pub scheduler: S,
    pub tokenization: TokenizationAnimator,
    pub stepper: GenerationStepper<'static, StdRng>,

    rng: StdRng,
    relay: Option<RelayClient>,
    reply_tx: Sender<Reply>,
    reply_rx: Receiver<Reply>,
}

impl App<WallClockScheduler> {
    pub fn new(config: &AppConfig, relay: RelayClient, seed: Option<u64>) -> Result<Self> {
        Self::with_scheduler(config, WallClockScheduler::new(), Some(relay), seed)
    }
}

impl<S: Scheduler> App<S> {
    pub fn with_scheduler(
        config: &AppConfig,
        scheduler: S,
        relay: Option<RelayClient>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let dictionary = DistractorDictionary::global()?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let roulette = Roulette::new(dictionary, StdRng::from_rng(&mut rng));
        let stepper = GenerationStepper::new(roulette, config.timing.step_delay());
        let tokenization = TokenizationAnimator::new(
            config.timing.reveal_delay(),
            config.timing.embedding_delay(),
        );

        let (reply_tx, reply_rx) = mpsc::channel();

        Ok(Self {
            should_quit: false,
            stage: Stage::Chat,
            theme: config.theme.clone(),
            input: String::new(),
            last_turn: None,
            is_loading: false,
            last_error: None,
            scheduler,
            tokenization,
            stepper,
            rng,
            relay,
            reply_tx,
            reply_rx,
        })
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Drains fired timers and finished relay calls. Called once per frame.
    pub fn tick(&mut self) {
        for id in self.scheduler.take_due() {
            if !self.stepper.on_timer(id, &mut self.scheduler) {
                self.tokenization.on_timer(id, &mut self.scheduler);
            }
        }

        while let Ok(reply) = self.reply_rx.try_recv() {
            self.apply_reply(reply);
        }
    }

    pub fn last_prompt(&self) -> Option<&str> {
        self.last_turn.as_ref().map(|t| t.prompt.as_str())
    }

    pub fn answer(&self) -> Option<&str> {
        self.last_turn.as_ref().and_then(|t| t.answer.as_deref())
    }

    pub fn can_send(&self) -> bool {
        !self.is_loading && !strings::is_blank(&self.input)
    }

    pub fn can_explain(&self) -> bool {
        let prompt_ok = self.last_prompt().is_some_and(|p| !strings::is_blank(p));
        let answer_ok = self.answer().is_some_and(|a| !strings::is_blank(a));
        prompt_ok && answer_ok
    }

    pub fn on_key(&mut self, c: char) {
        match self.stage {
            Stage::Chat => self.input.push(c),
            Stage::Generation => {
                if matches!(c, 's' | 'S' | 'r' | 'R') {
                    self.start_generation();
                }
            }
            Stage::Tokenization | Stage::Search => {}
        }
    }

    pub fn on_backspace(&mut self) {
        match self.stage {
            Stage::Chat => {
                self.input.pop();
            }
            Stage::Generation => self.back_to_chat(),
            Stage::Tokenization | Stage::Search => {}
        }
    }

    pub fn on_enter(&mut self) {
        match self.stage {
            Stage::Chat => self.send_prompt(),
            Stage::Generation => self.start_generation(),
            Stage::Tokenization | Stage::Search => self.next_stage(),
        }
    }

    pub fn on_newline(&mut self) {
        if self.stage == Stage::Chat {
            self.input.push('\n');
        }
    }

    pub fn on_left(&mut self) {
        if self.stage == Stage::Generation {
            self.back_to_chat();
        }
    }

    pub fn on_right(&mut self) {
        if matches!(self.stage, Stage::Tokenization | Stage::Search) {
            self.next_stage();
        }
    }

    pub fn send_prompt(&mut self) {
        if !self.can_send() {
            return;
        }
        let prompt = self.input.trim().to_string();
        self.input.clear();
        self.last_error = None;
        self.is_loading = true;
        self.last_turn = Some(ChatTurn {
            prompt: prompt.clone(),
            answer: None,
            asked_at: Local::now(),
        });
        tracing::info!(prompt_chars = prompt.chars().count(), "prompt sent");

        let tx = self.reply_tx.clone();
        match self.relay.clone() {
            Some(client) => {
                thread::spawn(move || {
                    let _ = tx.send(client.ask(&prompt));
                });
            }
            None => {
                let _ = tx.send(Err(RelayError::Upstream(
                    "no relay client configured".to_string(),
                )));
            }
        }
    }

    /// Installs the relay's answer (or the fallback text on failure) and
    /// hands it to the stepper, which drops any run on the previous answer.
    pub fn apply_reply(&mut self, reply: Reply) {
        self.is_loading = false;
        let answer = match reply {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "relay call failed, showing fallback");
                self.last_error = Some(e.to_string());
                CLIENT_FALLBACK_ANSWER.to_string()
            }
        };

        self.stepper.set_answer(&answer, &mut self.scheduler);
        match self.last_turn.as_mut() {
            Some(turn) => turn.answer = Some(answer),
            None => {
                self.last_turn = Some(ChatTurn {
                    prompt: String::new(),
                    answer: Some(answer),
                    asked_at: Local::now(),
                })
            }
        }
    }

    pub fn explain(&mut self) {
        if self.stage != Stage::Chat || !self.can_explain() {
            return;
        }
        let prompt = self.last_prompt().unwrap_or_default().to_string();
        self.tokenization
            .set_prompt(&prompt, &mut self.scheduler, &mut self.rng);
        self.stage = Stage::Tokenization;
    }

    pub fn next_stage(&mut self) {
        match self.stage {
            Stage::Tokenization => {
                self.tokenization.unmount(&mut self.scheduler);
                self.stage = Stage::Search;
            }
            Stage::Search => self.stage = Stage::Generation,
            Stage::Chat | Stage::Generation => {}
        }
    }

    pub fn start_generation(&mut self) {
        if self.stage == Stage::Generation {
            self.stepper.start(&mut self.scheduler);
        }
    }

    pub fn back_to_chat(&mut self) {
        if self.stage == Stage::Generation {
            self.stepper.unmount(&mut self.scheduler);
            self.stage = Stage::Chat;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepperState;
    use crate::roulette::VirtualScheduler;
    use std::time::Duration;

    fn app() -> App<VirtualScheduler> {
        App::with_scheduler(&AppConfig::default(), VirtualScheduler::new(), None, Some(21)).unwrap()
    }

    fn type_text(app: &mut App<VirtualScheduler>, text: &str) {
        for c in text.chars() {
            app.on_key(c);
        }
    }

    fn answered(prompt: &str, answer: &str) -> App<VirtualScheduler> {
        let mut app = app();
        type_text(&mut app, prompt);
        app.send_prompt();
        // drain the no-relay error so only the real answer counts
        while app.reply_rx.try_recv().is_ok() {}
        app.apply_reply(Ok(answer.to_string()));
        app
    }

    fn run_ms(app: &mut App<VirtualScheduler>, ms: u64) {
        app.scheduler.advance(Duration::from_millis(ms));
        app.tick();
    }

    #[test]
    fn blank_prompt_is_not_sent() {
        let mut app = app();
        type_text(&mut app, "   ");
        app.on_enter();
        assert!(!app.is_loading);
        assert!(app.last_turn.is_none());
    }

    #[test]
    fn sending_trims_and_marks_loading() {
        let mut app = app();
        type_text(&mut app, "  hola  ");
        app.on_enter();
        assert!(app.is_loading);
        assert_eq!(app.last_prompt(), Some("hola"));
        assert!(app.input.is_empty());
        assert!(!app.can_send());
    }

    #[test]
    fn failed_relay_shows_fallback_answer() {
        let mut app = app();
        type_text(&mut app, "hola");
        app.on_enter();
        app.tick();
        assert!(!app.is_loading);
        assert_eq!(app.answer(), Some(CLIENT_FALLBACK_ANSWER));
        assert!(app.last_error.is_some());
        assert_eq!(
            app.stepper.target_tokens().len(),
            strings::split_tokens(CLIENT_FALLBACK_ANSWER).len()
        );
    }

    #[test]
    fn explanation_needs_prompt_and_answer() {
        let mut app = app();
        app.explain();
        assert_eq!(app.stage, Stage::Chat);

        let mut app = answered("¿Qué es un LLM?", "Un modelo de lenguaje.");
        assert!(app.can_explain());
        app.explain();
        assert_eq!(app.stage, Stage::Tokenization);
        assert_eq!(app.tokenization.tokens().len(), 4);
    }

    #[test]
    fn full_walkthrough_reaches_a_completed_generation() {
        let mut app = answered("di hola", "hola mundo");
        app.explain();
        run_ms(&mut app, 400);
        assert_eq!(app.tokenization.visible_tokens().len(), 1);

        app.on_right();
        assert_eq!(app.stage, Stage::Search);
        assert_eq!(app.scheduler.pending_count(), 0);

        app.on_right();
        assert_eq!(app.stage, Stage::Generation);
        assert_eq!(app.stepper.state(), StepperState::Idle);

        app.on_key('s');
        assert_eq!(app.stepper.state(), StepperState::Running);
        run_ms(&mut app, 700);
        assert_eq!(app.stepper.generated_tokens(), ["hola".to_string()]);
        run_ms(&mut app, 700);
        assert_eq!(app.stepper.state(), StepperState::Completed);
        assert_eq!(app.stepper.generated_text(), "hola mundo");
    }

    #[test]
    fn leaving_generation_cancels_the_step_timer() {
        let mut app = answered("x", "uno dos tres");
        app.stage = Stage::Generation;
        app.on_enter();
        run_ms(&mut app, 700);
        assert_eq!(app.stepper.current_index(), 1);

        app.on_left();
        assert_eq!(app.stage, Stage::Chat);
        assert_eq!(app.scheduler.pending_count(), 0);
        run_ms(&mut app, 5_000);
        assert_eq!(app.stepper.current_index(), 0);
        assert_eq!(app.stepper.state(), StepperState::Idle);
    }

    #[test]
    fn new_answer_resets_a_running_generation() {
        let mut app = answered("x", "uno dos tres");
        app.stage = Stage::Generation;
        app.on_enter();
        run_ms(&mut app, 700);

        app.apply_reply(Ok("otra respuesta".to_string()));
        assert_eq!(app.stepper.state(), StepperState::Idle);
        assert!(app.stepper.generated_tokens().is_empty());
        run_ms(&mut app, 5_000);
        assert!(app.stepper.generated_tokens().is_empty());
        assert_eq!(app.stepper.target_tokens().len(), 2);
    }

    #[test]
    fn typing_s_in_chat_is_text_not_a_command() {
        let mut app = answered("x", "uno");
        type_text(&mut app, "s");
        assert_eq!(app.input, "s");
        assert_eq!(app.stepper.state(), StepperState::Idle);
    }
}
