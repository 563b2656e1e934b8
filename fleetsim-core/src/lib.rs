pub mod clock;
pub mod entropy;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entropy::{Entropy, RandomEntropy, SequentialEntropy};
pub use sink::{FailingSink, NotificationSink, RecordingSink, SinkError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
