use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::device::{AccessDevice, VehicleDevice};
use crate::status::TechStatus;
use crate::trip::Trip;

/// Largest late buffer accepted from callers: one week
pub const MAX_LATE_BUFFER_MINUTES: i64 = 7 * 24 * 60;

/// Fleet-controller timezone codes and the zones they stand for
pub fn timezone_for(code: i32) -> Tz {
    match code {
        2 => chrono_tz::Pacific::Honolulu,
        4 => chrono_tz::PST8PDT,
        10 => chrono_tz::MST7MDT,
        20 => chrono_tz::CST6CDT,
        35 => chrono_tz::EST5EDT,
        85 => chrono_tz::Europe::London,
        _ => chrono_tz::UTC,
    }
}

/// Wall-clock time of `at` in the zone behind `code`
pub fn local_time(code: i32, at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&timezone_for(code)).naive_local()
}

/// A scheduled vehicle-access window for one credential on one vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub request_id: String,
    pub tech_status: TechStatus,
    pub vehicle: VehicleDevice,
    pub access: AccessDevice,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: i32,
    pub late_alarm: bool,
    pub late_buffer_minutes: i64,
    /// Bumped every time the reservation is replaced by a resubmission
    #[serde(default)]
    pub generation: u64,
    #[serde(default)]
    pub trip: Option<Trip>,
}

impl Reservation {
    /// A reservation that has not been registered yet
    pub fn new(
        reservation_id: impl Into<String>,
        vehicle: VehicleDevice,
        access: AccessDevice,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            reservation_id: reservation_id.into(),
            request_id: String::new(),
            tech_status: TechStatus::New,
            vehicle,
            access,
            start_time,
            end_time,
            timezone: 0,
            late_alarm: false,
            late_buffer_minutes: 0,
            generation: 0,
            trip: None,
        }
    }

    /// Overwrite every field with `incoming` while keeping the attached trip
    /// and bumping the generation.
    pub fn replace_with(&mut self, incoming: Reservation) {
        let trip = self.trip.take();
        let generation = self.generation + 1;

        *self = incoming;
        self.trip = trip;
        self.generation = generation;
    }

    /// Window test used by swipe matching: started, and either not over yet
    /// or still being driven past its end.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.start_time > now {
            return false;
        }

        now <= self.end_time || self.trip.as_ref().is_some_and(|t| t.status.is_driving())
    }

    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }

    /// End of the window plus the configured late buffer. `None` when the
    /// buffer does not fit in a timestamp, so the trip is never late.
    pub fn late_deadline(&self) -> Option<DateTime<Utc>> {
        Duration::try_minutes(self.late_buffer_minutes)
            .and_then(|buffer| self.end_time.checked_add_signed(buffer))
    }

    pub fn orga_no(&self) -> &str {
        &self.vehicle.orga_no
    }
}
