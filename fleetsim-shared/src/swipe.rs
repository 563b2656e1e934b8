use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::{AccessDevice, VehicleDevice};
use crate::reservation::Reservation;
use crate::status::TechStatus;

/// A credential presented at a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverSwipe {
    pub request_id: String,
    pub tech_status: TechStatus,
    pub vehicle: VehicleDevice,
    pub access: AccessDevice,
    /// Set only while the swipe waits for a call-center decision
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
}

impl DriverSwipe {
    pub fn new(vehicle: VehicleDevice, access: AccessDevice) -> Self {
        Self {
            request_id: String::new(),
            tech_status: TechStatus::New,
            vehicle,
            access,
            correlation_id: None,
        }
    }

    pub fn orga_no(&self) -> &str {
        &self.vehicle.orga_no
    }
}

/// The call center's answer to an escalated swipe.
///
/// An empty `reservation_id` is a refusal; otherwise the remaining fields
/// describe the reservation to create for the waiting driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCenterResponse {
    pub correlation_id: Uuid,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub tech_status: TechStatus,
    #[serde(default)]
    pub reservation_id: String,
    pub vehicle: VehicleDevice,
    pub access: AccessDevice,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub late_alarm: bool,
    #[serde(default)]
    pub late_buffer_minutes: i64,
}

impl CallCenterResponse {
    pub fn is_refusal(&self) -> bool {
        self.reservation_id.trim().is_empty()
    }

    /// The reservation granted by this response
    pub fn to_reservation(&self) -> Reservation {
        let mut reservation = Reservation::new(
            self.reservation_id.clone(),
            self.vehicle.clone(),
            self.access.clone(),
            self.start_time,
            self.end_time,
        );
        reservation.timezone = self.timezone;
        reservation.late_alarm = self.late_alarm;
        reservation.late_buffer_minutes = self.late_buffer_minutes;
        reservation
    }

    pub fn orga_no(&self) -> &str {
        &self.vehicle.orga_no
    }
}
