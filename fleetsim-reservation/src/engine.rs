use crate::correlation::CorrelationStore;
use crate::matching::find_match;
use crate::notifier::{Notifier, NotifierDelays};
use crate::registry::Registry;
use crate::watcher::{self, evaluate, WatchAction, WatchOutcome, WatcherSettings};
use chrono::{DateTime, Duration, Utc};
use fleetsim_core::{Clock, Entropy, NotificationSink, RandomEntropy, SystemClock};
use fleetsim_shared::{
    CallCenterResponse, DriverSwipe, Notification, Reservation, TechStatus, TripStatus,
};
use fleetsim_trip::{Outbound, TripError, TripLifecycle, DEFAULT_SEGMENT_DISTANCE_KM};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Call-center requests without a response are forgotten after a day
pub const DEFAULT_CORRELATION_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub delays: NotifierDelays,
    pub watcher: WatcherSettings,
    pub segment_distance_km: u32,
    /// `None` keeps unanswered call-center requests forever
    pub correlation_ttl: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            delays: NotifierDelays::default(),
            watcher: WatcherSettings::default(),
            segment_distance_km: DEFAULT_SEGMENT_DISTANCE_KM,
            correlation_ttl: Some(Duration::seconds(DEFAULT_CORRELATION_TTL_SECS)),
        }
    }
}

/// Synchronous answer to an inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAck {
    pub request_id: String,
    pub status: TechStatus,
    pub orga_no: String,
    pub timestamp: DateTime<Utc>,
}

/// Whose progress a status sequence reports
#[derive(Debug, Clone)]
enum StatusSubject {
    /// Recorded on the stored reservation while its generation holds
    Reservation { reservation_id: String, generation: u64 },
    /// Swipes and call-center responses: reported, never stored
    Transient,
}

#[derive(Debug, Clone)]
struct StatusSequence {
    subject: StatusSubject,
    request_id: String,
    orga_no: String,
}

/// Work collected under the registry lock and started after it is released
#[derive(Default)]
struct Effects {
    outbound: Vec<Outbound>,
    sequences: Vec<StatusSequence>,
    watchers: Vec<String>,
}

struct EngineInner {
    registry: Mutex<Registry>,
    notifier: Notifier,
    lifecycle: TripLifecycle,
    entropy: Arc<dyn Entropy>,
    clock: Arc<dyn Clock>,
    watcher: WatcherSettings,
}

/// Owns the reservation registry and reacts to reservations, swipes and
/// call-center responses.
///
/// Cloning is cheap; every clone drives the same registry.
#[derive(Clone)]
pub struct ReservationEngine {
    inner: Arc<EngineInner>,
}

impl ReservationEngine {
    pub fn new(sink: Arc<dyn NotificationSink>, settings: EngineSettings) -> Self {
        Self::with_capabilities(sink, settings, Arc::new(RandomEntropy), Arc::new(SystemClock))
    }

    pub fn with_capabilities(
        sink: Arc<dyn NotificationSink>,
        settings: EngineSettings,
        entropy: Arc<dyn Entropy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let correlations = CorrelationStore::new(settings.correlation_ttl);
        Self {
            inner: Arc::new(EngineInner {
                registry: Mutex::new(Registry::new(correlations)),
                notifier: Notifier::new(sink, settings.delays),
                lifecycle: TripLifecycle::new(settings.segment_distance_km),
                entropy,
                clock,
                watcher: settings.watcher,
            }),
        }
    }

    /// Register a reservation, or replace the stored one with the same id
    pub async fn handle_new_reservation(&self, reservation: Reservation) -> TaskAck {
        let now = self.inner.clock.now();
        let mut effects = Effects::default();
        let ack = {
            let mut registry = self.inner.registry.lock().await;
            self.apply_reservation(&mut registry, reservation, now, &mut effects)
        };
        self.start(effects);
        ack
    }

    /// Route a swipe to its reservation's trip, or escalate it to the call
    /// center when no reservation claims it.
    pub async fn handle_new_driver_swipe(&self, swipe: DriverSwipe) -> TaskAck {
        let now = self.inner.clock.now();
        let mut effects = Effects::default();
        let ack = {
            let mut registry = self.inner.registry.lock().await;
            self.apply_swipe(&mut registry, swipe, now, &mut effects)
        };
        self.start(effects);
        ack
    }

    /// Resolve an escalated swipe. A granted reservation is registered and
    /// the original swipe replayed against it in one step; a refusal
    /// rejects access. Unknown correlation ids are ignored.
    pub async fn handle_call_center_response(&self, response: CallCenterResponse) -> TaskAck {
        let now = self.inner.clock.now();
        let mut effects = Effects::default();
        let ack = {
            let mut registry = self.inner.registry.lock().await;
            self.apply_response(&mut registry, response, now, &mut effects)
        };
        self.start(effects);
        ack
    }

    /// Snapshot of every registered reservation, in registration order
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.inner.registry.lock().await.reservations.clone()
    }

    pub async fn reservation(&self, reservation_id: &str) -> Option<Reservation> {
        self.inner
            .registry
            .lock()
            .await
            .get(reservation_id)
            .cloned()
    }

    /// Number of swipes still waiting on the call center
    pub async fn pending_call_center_requests(&self) -> usize {
        self.inner.registry.lock().await.correlations.len()
    }

    /// One watcher pass over a reservation
    pub async fn watch_tick(&self, reservation_id: &str) -> WatchOutcome {
        let now = self.inner.clock.now();
        let mut effects = Effects::default();
        let outcome = {
            let mut registry = self.inner.registry.lock().await;
            let Some(reservation) = registry.get_mut(reservation_id) else {
                return WatchOutcome::Retired;
            };
            let action = evaluate(reservation, now, self.inner.watcher.idle_timeout);
            self.apply_watch_action(reservation, action, now, &mut effects)
        };
        self.start(effects);
        outcome
    }

    fn apply_reservation(
        &self,
        registry: &mut Registry,
        mut reservation: Reservation,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> TaskAck {
        reservation.request_id = self.inner.entropy.request_id();
        reservation.tech_status = TechStatus::New;
        reservation.generation = 0;
        reservation.trip = None;

        let ack = TaskAck {
            request_id: reservation.request_id.clone(),
            status: TechStatus::New,
            orga_no: reservation.orga_no().to_string(),
            timestamp: now,
        };
        let reservation_id = reservation.reservation_id.clone();

        let generation = match registry.get_mut(&reservation_id) {
            Some(existing) => {
                existing.replace_with(reservation);
                info!("Reservation {} updated", reservation_id);
                existing.generation
            }
            None => {
                info!("Reservation {} registered", reservation_id);
                registry.reservations.push(reservation);
                effects.watchers.push(reservation_id.clone());
                0
            }
        };

        effects.sequences.push(StatusSequence {
            subject: StatusSubject::Reservation {
                reservation_id,
                generation,
            },
            request_id: ack.request_id.clone(),
            orga_no: ack.orga_no.clone(),
        });
        ack
    }

    fn apply_swipe(
        &self,
        registry: &mut Registry,
        mut swipe: DriverSwipe,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> TaskAck {
        swipe.request_id = self.inner.entropy.request_id();
        swipe.tech_status = TechStatus::New;

        let ack = TaskAck {
            request_id: swipe.request_id.clone(),
            status: TechStatus::New,
            orga_no: swipe.orga_no().to_string(),
            timestamp: now,
        };

        match find_match(&registry.reservations, &swipe, now) {
            Some(idx) => {
                let reservation = &mut registry.reservations[idx];
                match self.advance_trip(reservation, now) {
                    Ok(outbound) => effects.outbound.extend(outbound),
                    Err(e) => warn!(
                        "Swipe {} ignored for reservation {}: {}",
                        swipe.request_id, reservation.reservation_id, e
                    ),
                }
            }
            None => {
                let correlation_id = self.inner.entropy.correlation_id();
                swipe.correlation_id = Some(correlation_id);
                info!(
                    "No reservation for swipe {}, asking the call center ({})",
                    swipe.request_id, correlation_id
                );
                effects.outbound.extend(
                    self.inner
                        .lifecycle
                        .request_call_center(&swipe, correlation_id),
                );
                registry
                    .correlations
                    .register(correlation_id, swipe.clone(), now);
            }
        }

        effects.sequences.push(StatusSequence {
            subject: StatusSubject::Transient,
            request_id: ack.request_id.clone(),
            orga_no: ack.orga_no.clone(),
        });
        ack
    }

    /// Start, resume or end the trip of a matched reservation
    fn advance_trip(
        &self,
        reservation: &mut Reservation,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>, TripError> {
        let lifecycle = &self.inner.lifecycle;
        let entropy = self.inner.entropy.as_ref();

        if reservation.trip.is_none() {
            let mut trip = lifecycle.open(reservation, now);
            let result = lifecycle.start(&mut trip, now, entropy);
            reservation.trip = Some(trip);
            return result;
        }

        let Some(trip) = reservation.trip.as_mut() else {
            return Ok(Vec::new());
        };
        match trip.status {
            TripStatus::Pending => lifecycle.start(trip, now, entropy),
            TripStatus::InProgress | TripStatus::Late => lifecycle.end(trip, now),
            TripStatus::Ended => lifecycle.resume(trip, now, entropy),
            TripStatus::Completed => {
                debug!("Swipe on completed trip {}", trip.reservation_id);
                Ok(Vec::new())
            }
        }
    }

    fn apply_response(
        &self,
        registry: &mut Registry,
        mut response: CallCenterResponse,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> TaskAck {
        response.request_id = self.inner.entropy.request_id();
        response.tech_status = TechStatus::New;

        let ack = TaskAck {
            request_id: response.request_id.clone(),
            status: TechStatus::New,
            orga_no: response.orga_no().to_string(),
            timestamp: now,
        };

        match registry.correlations.take(&response.correlation_id, now) {
            None => debug!(
                "No pending swipe for correlation {}",
                response.correlation_id
            ),
            Some(swipe) if response.is_refusal() => {
                info!("Call center refused swipe {}", swipe.request_id);
                effects
                    .outbound
                    .extend(self.inner.lifecycle.reject_access(&swipe, now));
            }
            Some(mut swipe) => {
                info!(
                    "Call center granted reservation {} for swipe {}",
                    response.reservation_id, swipe.request_id
                );
                self.apply_reservation(registry, response.to_reservation(), now, effects);
                swipe.correlation_id = None;
                self.apply_swipe(registry, swipe, now, effects);
            }
        }

        effects.sequences.push(StatusSequence {
            subject: StatusSubject::Transient,
            request_id: ack.request_id.clone(),
            orga_no: ack.orga_no.clone(),
        });
        ack
    }

    fn apply_watch_action(
        &self,
        reservation: &mut Reservation,
        action: WatchAction,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> WatchOutcome {
        let lifecycle = &self.inner.lifecycle;

        let result = match action {
            WatchAction::Idle => return WatchOutcome::Continue,
            WatchAction::Retire => return WatchOutcome::Retired,
            WatchAction::NoDrive => {
                let (trip, outbound) = lifecycle.no_drive(reservation, now);
                reservation.trip = Some(trip);
                Ok(outbound)
            }
            WatchAction::Complete | WatchAction::MarkLate | WatchAction::CloseSegment => {
                let Some(trip) = reservation.trip.as_mut() else {
                    return WatchOutcome::Continue;
                };
                match action {
                    WatchAction::Complete => lifecycle.complete(trip, now),
                    WatchAction::MarkLate => lifecycle.mark_late(trip, now),
                    _ => lifecycle.toggle_ignition(trip, now),
                }
            }
        };

        match result {
            Ok(outbound) => effects.outbound.extend(outbound),
            Err(e) => warn!(
                "Watcher for reservation {} skipped {:?}: {}",
                reservation.reservation_id, action, e
            ),
        }

        if action == WatchAction::Complete {
            WatchOutcome::Retired
        } else {
            WatchOutcome::Continue
        }
    }

    fn start(&self, effects: Effects) {
        self.inner.notifier.dispatch(effects.outbound);

        for sequence in effects.sequences {
            let engine = self.clone();
            tokio::spawn(async move { engine.run_status_sequence(sequence).await });
        }

        for reservation_id in effects.watchers {
            watcher::spawn(self.clone(), reservation_id, self.inner.watcher.tick);
        }
    }

    /// Report SentToCenter, AcceptedByCenter and Received, one step per
    /// delay. A replaced reservation silences its old sequence.
    async fn run_status_sequence(self, sequence: StatusSequence) {
        let mut status = TechStatus::New;

        while let Some(next) = status.next() {
            sleep(self.inner.notifier.delays().status_step).await;

            if let StatusSubject::Reservation {
                reservation_id,
                generation,
            } = &sequence.subject
            {
                if !self.record_status(reservation_id, *generation, next).await {
                    debug!("Status sequence for reservation {} superseded", reservation_id);
                    return;
                }
            }

            status = next;
            let notification = Notification::status(
                &sequence.request_id,
                &sequence.orga_no,
                status,
                self.inner.clock.now(),
            );
            self.inner.notifier.deliver(&notification).await;
        }
    }

    async fn record_status(&self, reservation_id: &str, generation: u64, status: TechStatus) -> bool {
        let mut registry = self.inner.registry.lock().await;
        match registry.get_mut(reservation_id) {
            Some(reservation) if reservation.generation == generation => {
                reservation.tech_status.advance_to(status);
                true
            }
            _ => false,
        }
    }
}
