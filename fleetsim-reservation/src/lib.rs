pub mod correlation;
pub mod engine;
pub mod matching;
pub mod notifier;
pub mod registry;
pub mod watcher;

#[cfg(test)]
mod engine_tests;

pub use correlation::CorrelationStore;
pub use engine::{EngineSettings, ReservationEngine, TaskAck, DEFAULT_CORRELATION_TTL_SECS};
pub use notifier::{Notifier, NotifierDelays};
pub use watcher::{WatchAction, WatchOutcome, WatcherSettings, DEFAULT_IDLE_TIMEOUT_SECS};
