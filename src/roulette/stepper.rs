use super::builder::Roulette;
use super::scheduler::{Scheduler, TimerId};
use crate::models::{RouletteOption, StepperState};
use crate::utils::strings;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(700);

/// Reveals an answer one token per timer tick, spinning the roulette for
/// each revealed token.
///
/// The stepper is the only writer of its run state. It holds at most one
/// armed timer and ignores any firing that is not that timer, so a timer left
/// over from an earlier run or answer can never append a token.
pub struct GenerationStepper<'d, R> {
    roulette: Roulette<'d, R>,
    step_delay: Duration,
    target: Vec<String>,
    generated: Vec<String>,
    options: Vec<RouletteOption>,
    state: StepperState,
    pending: Option<TimerId>,
}

impl<'d, R: Rng> GenerationStepper<'d, R> {
    pub fn new(roulette: Roulette<'d, R>, step_delay: Duration) -> Self {
        Self {
            roulette,
            step_delay,
            target: Vec::new(),
            generated: Vec::new(),
            options: Vec::new(),
            state: StepperState::Idle,
            pending: None,
        }
    }

    /// Replaces the target sequence. Any run in progress is dropped and the
    /// stepper goes back to idle; it does not resume on its own.
    pub fn set_answer(&mut self, answer: &str, scheduler: &mut impl Scheduler) {
        self.disarm(scheduler);
        self.target = strings::split_tokens(answer);
        self.clear_run();
        self.state = StepperState::Idle;
        tracing::debug!(tokens = self.target.len(), "generation target replaced");
    }

    /// Starts (or restarts) a run. Returns false when nothing started: the
    /// target is empty or a run is already in progress.
    pub fn start(&mut self, scheduler: &mut impl Scheduler) -> bool {
        if self.state == StepperState::Running {
            return false;
        }
        self.clear_run();
        if self.target.is_empty() {
            self.state = StepperState::Idle;
            return false;
        }
        self.state = StepperState::Running;
        self.arm(scheduler);
        tracing::debug!(tokens = self.target.len(), "generation run started");
        true
    }

    /// Handles a fired timer. Returns true if the timer belonged to this
    /// stepper's current run and a token was revealed.
    pub fn on_timer(&mut self, id: TimerId, scheduler: &mut impl Scheduler) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        if self.state != StepperState::Running {
            return false;
        }

        let Some(token) = self.target.get(self.generated.len()).cloned() else {
            self.state = StepperState::Completed;
            return false;
        };

        self.options = self.roulette.spin(&token);
        self.generated.push(token);

        if self.generated.len() == self.target.len() {
            self.state = StepperState::Completed;
            tracing::debug!(tokens = self.generated.len(), "generation run completed");
        } else {
            self.arm(scheduler);
        }
        true
    }

    /// The hosting screen went away: cancel the pending step and forget the
    /// run. The target sequence is kept.
    pub fn unmount(&mut self, scheduler: &mut impl Scheduler) {
        self.disarm(scheduler);
        self.clear_run();
        self.state = StepperState::Idle;
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StepperState::Running
    }

    pub fn target_tokens(&self) -> &[String] {
        &self.target
    }

    pub fn generated_tokens(&self) -> &[String] {
        &self.generated
    }

    pub fn generated_text(&self) -> String {
        self.generated.join(" ")
    }

    pub fn current_index(&self) -> usize {
        self.generated.len()
    }

    pub fn current_options(&self) -> &[RouletteOption] {
        &self.options
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    fn arm(&mut self, scheduler: &mut impl Scheduler) {
        self.disarm(scheduler);
        self.pending = Some(scheduler.schedule(self.step_delay));
    }

    fn disarm(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    fn clear_run(&mut self) {
        self.generated.clear();
        self.options.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roulette::dictionary::DistractorDictionary;
    use crate::roulette::scheduler::VirtualScheduler;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Stepper = GenerationStepper<'static, StdRng>;

    fn stepper(answer: &str, scheduler: &mut VirtualScheduler) -> Stepper {
        let dictionary = DistractorDictionary::global().unwrap();
        let roulette = Roulette::new(dictionary, StdRng::seed_from_u64(17));
        let mut stepper = GenerationStepper::new(roulette, DEFAULT_STEP_DELAY);
        stepper.set_answer(answer, scheduler);
        stepper
    }

    // advances one step delay and delivers whatever fired
    fn tick(stepper: &mut Stepper, scheduler: &mut VirtualScheduler) -> usize {
        scheduler.advance(DEFAULT_STEP_DELAY);
        let mut applied = 0;
        for id in scheduler.take_due() {
            if stepper.on_timer(id, scheduler) {
                applied += 1;
            }
        }
        applied
    }

    fn assert_snapshot_is_sound(stepper: &Stepper) {
        let options = stepper.current_options();
        assert!(!options.is_empty() && options.len() <= 5);
        let sum: f64 = options.iter().map(|o| o.probability).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        let last = stepper.generated_tokens().last().unwrap();
        let chosen: Vec<_> = options.iter().filter(|o| o.is_chosen).collect();
        assert_eq!(chosen.len(), 1);
        assert_eq!(&chosen[0].token, last);
    }

    #[test]
    fn starts_idle_with_empty_accumulators() {
        let mut scheduler = VirtualScheduler::new();
        let stepper = stepper("hola mundo", &mut scheduler);
        assert_eq!(stepper.state(), StepperState::Idle);
        assert_eq!(stepper.current_index(), 0);
        assert!(stepper.generated_tokens().is_empty());
        assert!(stepper.current_options().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn hola_mundo_scenario() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("hola mundo", &mut scheduler);

        assert!(stepper.start(&mut scheduler));
        assert_eq!(stepper.state(), StepperState::Running);

        assert_eq!(tick(&mut stepper, &mut scheduler), 1);
        assert_eq!(stepper.generated_tokens(), ["hola".to_string()]);
        assert_eq!(stepper.current_options().len(), 5);
        assert_snapshot_is_sound(&stepper);
        assert_eq!(stepper.state(), StepperState::Running);

        assert_eq!(tick(&mut stepper, &mut scheduler), 1);
        assert_eq!(
            stepper.generated_tokens(),
            ["hola".to_string(), "mundo".to_string()]
        );
        assert_snapshot_is_sound(&stepper);
        assert_eq!(stepper.state(), StepperState::Completed);
        assert!(stepper.pending_timer().is_none());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn nothing_moves_before_the_delay() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("uno dos", &mut scheduler);
        stepper.start(&mut scheduler);
        scheduler.advance(Duration::from_millis(699));
        assert!(scheduler.take_due().is_empty());
        assert_eq!(stepper.current_index(), 0);
    }

    #[test]
    fn n_ticks_complete_a_run_of_n_tokens() {
        let answer = "El modelo elige, paso a paso, la siguiente palabra.";
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper(answer, &mut scheduler);
        let n = stepper.target_tokens().len();
        assert_eq!(n, 9);

        stepper.start(&mut scheduler);
        for i in 1..=n {
            assert_eq!(tick(&mut stepper, &mut scheduler), 1);
            assert_eq!(stepper.current_index(), i);
            assert_eq!(stepper.generated_tokens(), &stepper.target_tokens()[..i]);
        }
        assert_eq!(stepper.state(), StepperState::Completed);
        assert_eq!(stepper.generated_tokens(), stepper.target_tokens());
        assert_eq!(stepper.generated_text(), answer);
        assert_eq!(scheduler.pending_count(), 0);

        assert_eq!(tick(&mut stepper, &mut scheduler), 0);
        assert_eq!(stepper.current_index(), n);
    }

    #[test]
    fn empty_answer_never_leaves_idle() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("   \n ", &mut scheduler);
        assert!(!stepper.start(&mut scheduler));
        assert_eq!(stepper.state(), StepperState::Idle);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(tick(&mut stepper, &mut scheduler), 0);
        assert_eq!(stepper.state(), StepperState::Idle);
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("a b c", &mut scheduler);
        stepper.start(&mut scheduler);
        tick(&mut stepper, &mut scheduler);

        assert!(!stepper.start(&mut scheduler));
        assert_eq!(stepper.current_index(), 1);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn restart_after_completion_replays_from_scratch() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("hola mundo", &mut scheduler);
        stepper.start(&mut scheduler);
        tick(&mut stepper, &mut scheduler);
        tick(&mut stepper, &mut scheduler);
        assert_eq!(stepper.state(), StepperState::Completed);

        assert!(stepper.start(&mut scheduler));
        assert_eq!(stepper.state(), StepperState::Running);
        assert!(stepper.generated_tokens().is_empty());
        assert!(stepper.current_options().is_empty());

        tick(&mut stepper, &mut scheduler);
        assert_eq!(stepper.generated_tokens(), ["hola".to_string()]);
        assert_snapshot_is_sound(&stepper);
        tick(&mut stepper, &mut scheduler);
        assert_eq!(stepper.state(), StepperState::Completed);
    }

    #[test]
    fn new_answer_mid_run_cancels_the_pending_step() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("viejo texto largo", &mut scheduler);
        stepper.start(&mut scheduler);
        tick(&mut stepper, &mut scheduler);
        let stale = stepper.pending_timer().unwrap();

        stepper.set_answer("nuevo", &mut scheduler);
        assert_eq!(stepper.state(), StepperState::Idle);
        assert!(stepper.generated_tokens().is_empty());
        assert!(!scheduler.is_pending(stale));

        scheduler.advance(Duration::from_secs(10));
        assert!(scheduler.take_due().is_empty());
        // even a stale id delivered by hand changes nothing
        assert!(!stepper.on_timer(stale, &mut scheduler));
        assert_eq!(stepper.state(), StepperState::Idle);
        assert!(stepper.generated_tokens().is_empty());
        assert_eq!(stepper.target_tokens(), ["nuevo".to_string()]);
    }

    #[test]
    fn unmount_cancels_and_forgets_the_run() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("uno dos tres", &mut scheduler);
        stepper.start(&mut scheduler);
        tick(&mut stepper, &mut scheduler);

        stepper.unmount(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(stepper.state(), StepperState::Idle);
        assert!(stepper.generated_tokens().is_empty());
        assert_eq!(tick(&mut stepper, &mut scheduler), 0);
        assert_eq!(stepper.target_tokens().len(), 3);
    }

    #[test]
    fn foreign_timers_are_ignored() {
        let mut scheduler = VirtualScheduler::new();
        let mut stepper = stepper("uno dos", &mut scheduler);
        stepper.start(&mut scheduler);
        let foreign = scheduler.schedule(Duration::ZERO);
        assert!(!stepper.on_timer(foreign, &mut scheduler));
        assert_eq!(stepper.current_index(), 0);
        assert!(stepper.pending_timer().is_some());
    }
}
