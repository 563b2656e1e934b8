use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{AccessDevice, VehicleDevice};
use crate::reservation::{local_time, Reservation};

/// Trip status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    /// Created but not started yet
    #[default]
    Pending,
    InProgress,
    Late,
    Ended,
    Completed,
}

impl TripStatus {
    /// The vehicle is currently in use
    pub fn is_driving(self) -> bool {
        matches!(self, TripStatus::InProgress | TripStatus::Late)
    }
}

/// The realized usage of a vehicle within (or around) a reservation window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub reservation_id: String,
    pub vehicle: VehicleDevice,
    pub access: AccessDevice,
    pub timezone: i32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub odo_start: Option<u32>,
    pub odo_end: u32,
    pub ignition_on: bool,
    pub ignition_changed_at: Option<DateTime<Utc>>,
    pub status: TripStatus,
}

impl Trip {
    /// A pending trip carrying the identity of its reservation
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.reservation_id.clone(),
            vehicle: reservation.vehicle.clone(),
            access: reservation.access.clone(),
            timezone: reservation.timezone,
            start_time: None,
            end_time: None,
            odo_start: None,
            odo_end: 0,
            ignition_on: false,
            ignition_changed_at: None,
            status: TripStatus::Pending,
        }
    }

    pub fn set_ignition(&mut self, on: bool, at: DateTime<Utc>) {
        self.ignition_on = on;
        self.ignition_changed_at = Some(at);
    }

    /// True when the ignition has not changed since before `threshold`
    pub fn ignition_idle_since(&self, threshold: DateTime<Utc>) -> bool {
        self.ignition_changed_at.is_some_and(|changed| changed < threshold)
    }

    /// Distance covered so far
    pub fn distance(&self) -> u32 {
        self.odo_end.saturating_sub(self.odo_start.unwrap_or(self.odo_end))
    }

    /// A trip that never moved: same start and end instant, same odometer
    pub fn is_unused(&self) -> bool {
        self.start_time == self.end_time && self.odo_start.unwrap_or(0) == self.odo_end
    }

    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveDateTime {
        local_time(self.timezone, at)
    }

    pub fn orga_no(&self) -> &str {
        &self.vehicle.orga_no
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn trip() -> Trip {
        let now = Utc::now();
        let reservation = Reservation::new(
            "R-7",
            VehicleDevice::new("21", "4917"),
            AccessDevice::default(),
            now,
            now + Duration::hours(1),
        );
        Trip::from_reservation(&reservation)
    }

    #[test]
    fn test_new_trip_is_pending() {
        let t = trip();
        assert_eq!(t.status, TripStatus::Pending);
        assert_eq!(t.reservation_id, "R-7");
        assert!(!t.status.is_driving());
        assert!(t.odo_start.is_none());
    }

    #[test]
    fn test_ignition_idle() {
        let mut t = trip();
        let now = Utc::now();
        assert!(!t.ignition_idle_since(now));

        t.set_ignition(true, now - Duration::minutes(10));
        assert!(t.ignition_idle_since(now - Duration::minutes(5)));
        assert!(!t.ignition_idle_since(now - Duration::minutes(15)));
    }

    #[test]
    fn test_distance_and_unused() {
        let mut t = trip();
        let now = Utc::now();
        t.start_time = Some(now);
        t.end_time = Some(now);
        t.odo_start = Some(1200);
        t.odo_end = 1200;
        assert!(t.is_unused());

        t.odo_end = 1215;
        assert_eq!(t.distance(), 15);
        assert!(!t.is_unused());
    }
}
