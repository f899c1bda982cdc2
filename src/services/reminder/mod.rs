mod engine;

pub use engine::{Clock, ReminderEngine, RunSummary, SystemClock};
