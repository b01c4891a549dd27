use crate::models::RouletteOption;
use crate::roulette::{GenerationStepper, Scheduler, WallClockScheduler};
use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// One line of `--replay` output.
#[derive(Debug, Serialize)]
pub struct ReplayStep<'a> {
    pub step: usize,
    pub token: &'a str,
    pub generated: String,
    pub options: &'a [RouletteOption],
}

/// Runs the stepper over `text` on the wall clock, writing one JSON object
/// per step. Returns the number of steps written.
pub fn run<R: Rng, W: Write>(
    stepper: &mut GenerationStepper<'_, R>,
    scheduler: &mut WallClockScheduler,
    text: &str,
    out: &mut W,
) -> Result<usize> {
    stepper.set_answer(text, scheduler);
    if !stepper.start(scheduler) {
        return Ok(0);
    }

    let mut written = 0;
    while stepper.is_running() {
        thread::sleep(scheduler.until_next().unwrap_or(Duration::from_millis(1)));

        for id in scheduler.take_due() {
            if !stepper.on_timer(id, scheduler) {
                continue;
            }
            let generated = stepper.generated_tokens();
            let step = ReplayStep {
                step: generated.len(),
                token: generated.last().map(String::as_str).unwrap_or_default(),
                generated: stepper.generated_text(),
                options: stepper.current_options(),
            };
            let line = serde_json::to_string(&step).context("Failed to encode replay step")?;
            writeln!(out, "{}", line).context("Failed to write replay step")?;
            written += 1;
        }
    }

    out.flush()?;
    Ok(written)
}
