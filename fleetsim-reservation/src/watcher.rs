use crate::engine::ReservationEngine;
use chrono::{DateTime, Duration, Utc};
use fleetsim_shared::{Reservation, TripStatus};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Ignition left untouched this long closes a segment
pub const DEFAULT_IDLE_TIMEOUT_SECS: i64 = 300;

#[derive(Debug, Clone, Copy)]
pub struct WatcherSettings {
    pub tick: std::time::Duration,
    pub idle_timeout: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            tick: std::time::Duration::from_secs(1),
            idle_timeout: Duration::seconds(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }
}

/// What a watcher should do with its reservation on this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    Idle,
    /// Window over, trip ended: finish it
    Complete,
    /// Still driving past end plus buffer
    MarkLate,
    /// Window over without any swipe
    NoDrive,
    /// Ignition idle long enough to close a segment
    CloseSegment,
    /// Trip finished, nothing left to watch
    Retire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Continue,
    Retired,
}

pub fn evaluate(reservation: &Reservation, now: DateTime<Utc>, idle_timeout: Duration) -> WatchAction {
    let trip = reservation.trip.as_ref();

    if trip.is_some_and(|t| t.status == TripStatus::Completed) {
        return WatchAction::Retire;
    }

    if reservation.has_ended_at(now) {
        match trip {
            None => return WatchAction::NoDrive,
            Some(t) if t.status == TripStatus::Ended => return WatchAction::Complete,
            Some(t)
                if t.status == TripStatus::InProgress
                    && reservation.late_alarm
                    && reservation.late_deadline().is_some_and(|deadline| now > deadline) =>
            {
                return WatchAction::MarkLate
            }
            _ => {}
        }
    }

    match trip {
        Some(t)
            if t.status.is_driving()
                && now
                    .checked_sub_signed(idle_timeout)
                    .is_some_and(|threshold| t.ignition_idle_since(threshold)) =>
        {
            WatchAction::CloseSegment
        }
        _ => WatchAction::Idle,
    }
}

/// Poll one reservation every tick until its trip is completed or the
/// reservation disappears.
pub(crate) fn spawn(
    engine: ReservationEngine,
    reservation_id: String,
    tick: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if engine.watch_tick(&reservation_id).await == WatchOutcome::Retired {
                debug!("Watcher for reservation {} retired", reservation_id);
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsim_core::SequentialEntropy;
    use fleetsim_shared::{AccessDevice, VehicleDevice};
    use fleetsim_trip::TripLifecycle;

    fn reservation(start: DateTime<Utc>) -> Reservation {
        Reservation::new(
            "R-1",
            VehicleDevice::new("21", "4917"),
            AccessDevice::default(),
            start,
            start + Duration::hours(1),
        )
    }

    #[test]
    fn test_unswiped_window_runs_to_completion() {
        let lifecycle = TripLifecycle::default();
        let idle = Duration::minutes(5);
        let start = Utc::now();
        let mut r = reservation(start);
        r.late_alarm = true;
        r.late_buffer_minutes = 10;

        assert_eq!(evaluate(&r, start + Duration::minutes(30), idle), WatchAction::Idle);
        assert_eq!(evaluate(&r, start + Duration::hours(1), idle), WatchAction::Idle);

        let after = start + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(evaluate(&r, after, idle), WatchAction::NoDrive);

        let (trip, _) = lifecycle.no_drive(&r, after);
        r.trip = Some(trip);
        assert_eq!(evaluate(&r, after, idle), WatchAction::Complete);

        if let Some(trip) = r.trip.as_mut() {
            lifecycle.complete(trip, after).unwrap();
        }
        assert_eq!(evaluate(&r, after, idle), WatchAction::Retire);
    }

    #[test]
    fn test_late_needs_alarm_and_buffer() {
        let lifecycle = TripLifecycle::default();
        let idle = Duration::minutes(5);
        let start = Utc::now();
        let mut r = reservation(start);
        r.late_buffer_minutes = 15;

        let mut trip = lifecycle.open(&r, start);
        lifecycle.start(&mut trip, start, &SequentialEntropy::default()).unwrap();
        trip.set_ignition(true, start + Duration::minutes(74));
        r.trip = Some(trip);

        let past_buffer = start + Duration::minutes(76);
        // No alarm requested
        assert_eq!(evaluate(&r, past_buffer, idle), WatchAction::Idle);

        r.late_alarm = true;
        assert_eq!(evaluate(&r, start + Duration::minutes(74), idle), WatchAction::Idle);
        assert_eq!(evaluate(&r, past_buffer, idle), WatchAction::MarkLate);
    }

    #[test]
    fn test_idle_ignition_closes_segment() {
        let lifecycle = TripLifecycle::default();
        let idle = Duration::minutes(5);
        let start = Utc::now();
        let mut r = reservation(start);

        let mut trip = lifecycle.open(&r, start);
        lifecycle.start(&mut trip, start, &SequentialEntropy::default()).unwrap();
        r.trip = Some(trip);

        assert_eq!(evaluate(&r, start + Duration::minutes(4), idle), WatchAction::Idle);
        assert_eq!(evaluate(&r, start + Duration::minutes(6), idle), WatchAction::CloseSegment);
    }

    #[test]
    fn test_ended_trip_waits_for_window_end() {
        let lifecycle = TripLifecycle::default();
        let idle = Duration::minutes(5);
        let start = Utc::now();
        let mut r = reservation(start);

        let mut trip = lifecycle.open(&r, start);
        lifecycle.start(&mut trip, start, &SequentialEntropy::default()).unwrap();
        lifecycle.end(&mut trip, start + Duration::minutes(20)).unwrap();
        r.trip = Some(trip);

        // The driver may still come back
        assert_eq!(evaluate(&r, start + Duration::minutes(50), idle), WatchAction::Idle);
        assert_eq!(evaluate(&r, start + Duration::minutes(61), idle), WatchAction::Complete);
    }

    #[test]
    fn test_unrepresentable_buffer_is_never_late() {
        let lifecycle = TripLifecycle::default();
        let idle = Duration::minutes(5);
        let start = Utc::now();
        let mut r = reservation(start);
        r.late_alarm = true;
        r.late_buffer_minutes = i64::MAX / 1000;

        let mut trip = lifecycle.open(&r, start);
        lifecycle.start(&mut trip, start, &SequentialEntropy::default()).unwrap();
        trip.set_ignition(true, start + Duration::minutes(61));
        r.trip = Some(trip);

        assert_eq!(evaluate(&r, start + Duration::minutes(62), idle), WatchAction::Idle);
    }
}
