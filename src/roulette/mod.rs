pub mod builder;
pub mod dictionary;
pub mod scheduler;
pub mod stepper;

pub use builder::{build_options, Roulette, DISTRACTOR_COUNT};
pub use dictionary::DistractorDictionary;
pub use scheduler::{Scheduler, TimerId, VirtualScheduler, WallClockScheduler};
pub use stepper::GenerationStepper;
