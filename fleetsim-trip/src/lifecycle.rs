use crate::outbound::Outbound;
use chrono::{DateTime, Utc};
use fleetsim_core::Entropy;
use fleetsim_shared::models::events::UsageEventName;
use fleetsim_shared::{DriverSwipe, Notification, Reservation, Trip, TripStatus};
use tracing::info;
use uuid::Uuid;

/// Odometer increment applied when an idle segment closes
pub const DEFAULT_SEGMENT_DISTANCE_KM: u32 = 5;

/// Trip state transitions.
///
/// Every transition mutates the trip synchronously and returns the
/// notifications it requires; dispatching them is the caller's job.
#[derive(Debug, Clone)]
pub struct TripLifecycle {
    segment_distance_km: u32,
}

impl TripLifecycle {
    pub fn new(segment_distance_km: u32) -> Self {
        Self { segment_distance_km }
    }

    /// Create the trip for a reservation's first matching swipe, ignition on
    pub fn open(&self, reservation: &Reservation, now: DateTime<Utc>) -> Trip {
        let mut trip = Trip::from_reservation(reservation);
        trip.set_ignition(true, now);
        trip
    }

    /// Transition: Pending/Ended → InProgress
    pub fn start(
        &self,
        trip: &mut Trip,
        now: DateTime<Utc>,
        entropy: &dyn Entropy,
    ) -> Result<Vec<Outbound>, TripError> {
        if !matches!(trip.status, TripStatus::Pending | TripStatus::Ended) {
            return Err(TripError::invalid(trip.status, TripStatus::InProgress));
        }

        if trip.odo_start.is_none() {
            let reading = entropy.odometer_reading();
            trip.start_time = Some(now);
            trip.odo_start = Some(reading);
            trip.odo_end = reading;
        }

        trip.status = TripStatus::InProgress;
        info!("Trip started for reservation {}", trip.reservation_id);

        Ok(vec![Outbound::once(Notification::usage(
            trip,
            UsageEventName::TripStart,
            now,
        ))])
    }

    /// Transition: Ended → InProgress (the driver swiped again)
    pub fn resume(
        &self,
        trip: &mut Trip,
        now: DateTime<Utc>,
        entropy: &dyn Entropy,
    ) -> Result<Vec<Outbound>, TripError> {
        if trip.status != TripStatus::Ended {
            return Err(TripError::invalid(trip.status, TripStatus::InProgress));
        }

        trip.set_ignition(true, now);
        self.start(trip, now, entropy)
    }

    /// Transition: InProgress/Late → Ended.
    ///
    /// A running ignition closes its segment first. The trip-end event is
    /// followed by the trip data once it has been delivered.
    pub fn end(&self, trip: &mut Trip, now: DateTime<Utc>) -> Result<Vec<Outbound>, TripError> {
        if !trip.status.is_driving() {
            return Err(TripError::invalid(trip.status, TripStatus::Ended));
        }

        let mut outbound = Vec::new();
        if trip.ignition_on {
            outbound.extend(self.toggle_ignition(trip, now)?);
        }

        trip.end_time = Some(now);
        trip.status = TripStatus::Ended;
        info!("Trip ended for reservation {}", trip.reservation_id);

        outbound.push(
            Outbound::once(Notification::usage(trip, UsageEventName::TripEnd, now))
                .followed_by(Outbound::once(Notification::trip_data(trip, now))),
        );
        Ok(outbound)
    }

    /// Flip the ignition of a trip that is being driven. Switching off
    /// closes a segment and advances the odometer.
    pub fn toggle_ignition(
        &self,
        trip: &mut Trip,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>, TripError> {
        if !trip.status.is_driving() {
            return Err(TripError::IgnitionWhileParked(trip.reservation_id.clone()));
        }

        let on = !trip.ignition_on;
        trip.set_ignition(on, now);
        if !on {
            trip.odo_end += self.segment_distance_km;
        }
        trip.end_time = Some(now);

        Ok(vec![Outbound::once(Notification::trip_segment(trip, now))])
    }

    /// Transition: InProgress → Late
    pub fn mark_late(&self, trip: &mut Trip, now: DateTime<Utc>) -> Result<Vec<Outbound>, TripError> {
        if trip.status != TripStatus::InProgress {
            return Err(TripError::invalid(trip.status, TripStatus::Late));
        }

        trip.status = TripStatus::Late;
        info!("Driver late for reservation {}", trip.reservation_id);

        Ok(vec![Outbound::once(Notification::driver_late(trip, now))])
    }

    /// Transition: Ended → Completed (final state)
    pub fn complete(&self, trip: &mut Trip, now: DateTime<Utc>) -> Result<Vec<Outbound>, TripError> {
        if trip.status != TripStatus::Ended {
            return Err(TripError::invalid(trip.status, TripStatus::Completed));
        }

        trip.status = TripStatus::Completed;
        info!("Trip completed for reservation {}", trip.reservation_id);

        Ok(vec![Outbound::once(Notification::usage(
            trip,
            UsageEventName::TripComplete,
            now,
        ))])
    }

    /// An already-ended trip for a reservation whose window passed without
    /// any swipe. Only the trip data is reported.
    pub fn no_drive(&self, reservation: &Reservation, now: DateTime<Utc>) -> (Trip, Vec<Outbound>) {
        let mut trip = Trip::from_reservation(reservation);
        trip.odo_start = Some(0);
        trip.odo_end = 0;
        trip.start_time = Some(now);
        trip.end_time = Some(now);
        trip.status = TripStatus::Ended;
        info!("No drive recorded for reservation {}", reservation.reservation_id);

        let outbound = vec![Outbound::once(Notification::trip_data(&trip, now))];
        (trip, outbound)
    }

    pub fn reject_access(&self, swipe: &DriverSwipe, now: DateTime<Utc>) -> Vec<Outbound> {
        info!("Access rejected for swipe {}", swipe.request_id);
        vec![Outbound::once(Notification::rejected_access(swipe, now))]
    }

    pub fn request_call_center(&self, swipe: &DriverSwipe, correlation_id: Uuid) -> Vec<Outbound> {
        vec![Outbound::once(Notification::call_center_request(
            swipe,
            correlation_id,
        ))]
    }
}

impl Default for TripLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_DISTANCE_KM)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("Invalid trip transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Ignition change on a trip that is not being driven: {0}")]
    IgnitionWhileParked(String),
}

impl TripError {
    fn invalid(from: TripStatus, to: TripStatus) -> Self {
        TripError::InvalidTransition {
            from: format!("{:?}", from),
            to: format!("{:?}", to),
        }
    }
}
