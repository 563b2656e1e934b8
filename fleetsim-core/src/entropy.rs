use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Request numbers are drawn below this bound
const REQUEST_ID_BOUND: u32 = 1_000_000;
/// Simulated odometer readings are drawn below this bound
const ODOMETER_BOUND: u32 = 100_000;

/// Source of every simulated random value: request numbers, correlation ids
/// and the odometer reading a vehicle reports when a trip starts.
pub trait Entropy: Send + Sync {
    fn request_id(&self) -> String;

    fn correlation_id(&self) -> Uuid;

    fn odometer_reading(&self) -> u32;
}

pub struct RandomEntropy;

impl Entropy for RandomEntropy {
    fn request_id(&self) -> String {
        rand::thread_rng().gen_range(0..REQUEST_ID_BOUND).to_string()
    }

    fn correlation_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn odometer_reading(&self) -> u32 {
        rand::thread_rng().gen_range(0..ODOMETER_BOUND)
    }
}

/// Deterministic values for tests: counters for ids, a fixed odometer
pub struct SequentialEntropy {
    counter: AtomicU64,
    odometer: u32,
}

impl SequentialEntropy {
    pub fn new(odometer: u32) -> Self {
        Self {
            counter: AtomicU64::new(0),
            odometer,
        }
    }

    fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for SequentialEntropy {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Entropy for SequentialEntropy {
    fn request_id(&self) -> String {
        self.bump().to_string()
    }

    fn correlation_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.bump()))
    }

    fn odometer_reading(&self) -> u32 {
        self.odometer
    }
}
