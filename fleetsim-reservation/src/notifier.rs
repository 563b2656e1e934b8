use fleetsim_core::NotificationSink;
use fleetsim_shared::{EventKind, Notification};
use fleetsim_trip::Outbound;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Simulated latency before each kind of notification leaves the vehicle
#[derive(Debug, Clone, Copy)]
pub struct NotifierDelays {
    pub status_step: Duration,
    pub trip_start: Duration,
    pub trip_end: Duration,
    pub trip_data: Duration,
    pub trip_segment: Duration,
    pub trip_complete: Duration,
    pub driver_late: Duration,
    pub rejected_access: Duration,
    pub call_center_request: Duration,
}

impl NotifierDelays {
    /// Every delay set to zero
    pub fn immediate() -> Self {
        Self {
            status_step: Duration::ZERO,
            trip_start: Duration::ZERO,
            trip_end: Duration::ZERO,
            trip_data: Duration::ZERO,
            trip_segment: Duration::ZERO,
            trip_complete: Duration::ZERO,
            driver_late: Duration::ZERO,
            rejected_access: Duration::ZERO,
            call_center_request: Duration::ZERO,
        }
    }

    pub fn for_kind(&self, kind: EventKind) -> Duration {
        match kind {
            EventKind::StatusChanged => self.status_step,
            EventKind::TripStart => self.trip_start,
            EventKind::TripEnd => self.trip_end,
            EventKind::TripData => self.trip_data,
            EventKind::TripSegment => self.trip_segment,
            EventKind::TripComplete => self.trip_complete,
            EventKind::DriverLate => self.driver_late,
            EventKind::RejectedAccess => self.rejected_access,
            EventKind::CallCenterRequest => self.call_center_request,
        }
    }
}

impl Default for NotifierDelays {
    fn default() -> Self {
        Self {
            status_step: Duration::from_secs(5),
            trip_start: Duration::from_secs(30),
            trip_end: Duration::from_secs(30),
            trip_data: Duration::from_secs(5),
            trip_segment: Duration::from_secs(5),
            trip_complete: Duration::from_secs(10),
            driver_late: Duration::from_secs(5),
            rejected_access: Duration::from_secs(30),
            call_center_request: Duration::from_secs(5),
        }
    }
}

/// Posts notifications after their delay, each on its own task.
///
/// Nothing is retried or cancelled; the outcome of a delivery only shows up
/// in the logs.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    delays: NotifierDelays,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, delays: NotifierDelays) -> Self {
        Self { sink, delays }
    }

    pub fn delays(&self) -> &NotifierDelays {
        &self.delays
    }

    /// Spawn one independently-timed task per outbound chain
    pub fn dispatch(&self, outbound: Vec<Outbound>) {
        for chain in outbound {
            let notifier = self.clone();
            tokio::spawn(async move { notifier.run_chain(chain).await });
        }
    }

    async fn run_chain(self, first: Outbound) {
        let mut current = first;
        loop {
            sleep(self.delays.for_kind(current.kind())).await;
            self.deliver(&current.notification).await;

            match current.then {
                Some(next) => current = *next,
                None => break,
            }
        }
    }

    /// Post right away and log the outcome
    pub async fn deliver(&self, notification: &Notification) {
        match self.sink.deliver(notification).await {
            Ok(()) => info!(
                "{:?} sent to orga {} ({})",
                notification.kind(),
                notification.orga_no,
                notification.channel.path_segment()
            ),
            Err(e) => warn!("{:?} delivery failed: {}", notification.kind(), e),
        }
    }
}
