pub mod lifecycle;
pub mod outbound;

pub use lifecycle::{TripError, TripLifecycle, DEFAULT_SEGMENT_DISTANCE_KM};
pub use outbound::Outbound;
