use chrono::{DateTime, Duration, Utc};
use fleetsim_shared::DriverSwipe;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

struct PendingSwipe {
    swipe: DriverSwipe,
    registered_at: DateTime<Utc>,
}

/// Swipes escalated to the call center, keyed by correlation id.
///
/// An entry lives until its response arrives or, when a TTL is set, until
/// it goes stale. Stale entries are dropped on the next registration and
/// never resolve a response.
pub struct CorrelationStore {
    pending: HashMap<Uuid, PendingSwipe>,
    ttl: Option<Duration>,
}

impl CorrelationStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            pending: HashMap::new(),
            ttl,
        }
    }

    pub fn register(&mut self, correlation_id: Uuid, swipe: DriverSwipe, now: DateTime<Utc>) {
        let abandoned = self.prune(now);
        if abandoned > 0 {
            warn!("Dropped {} call-center requests that never got a response", abandoned);
        }

        self.pending.insert(
            correlation_id,
            PendingSwipe {
                swipe,
                registered_at: now,
            },
        );
    }

    /// Remove and return the swipe waiting on `correlation_id`
    pub fn take(&mut self, correlation_id: &Uuid, now: DateTime<Utc>) -> Option<DriverSwipe> {
        let entry = self.pending.remove(correlation_id)?;
        if self.is_expired(&entry, now) {
            warn!("Call-center response for expired correlation {}", correlation_id);
            return None;
        }
        Some(entry.swipe)
    }

    /// Drop expired entries, returning how many went
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.pending.len();
        let ttl = self.ttl;
        self.pending
            .retain(|_, entry| !ttl.is_some_and(|ttl| now - entry.registered_at > ttl));
        before - self.pending.len()
    }

    pub fn contains(&self, correlation_id: &Uuid) -> bool {
        self.pending.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn is_expired(&self, entry: &PendingSwipe, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - entry.registered_at > ttl)
    }
}
