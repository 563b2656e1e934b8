use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::{normalize_card_type, AccessDevice};
use crate::status::TechStatus;
use crate::swipe::DriverSwipe;
use crate::trip::Trip;

/// Endpoint category on the fleet controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Technical status of a request
    Com,
    /// Usage and problem events
    Event,
    /// Trip data and trip segments
    Trip,
    /// Call-center requests
    Res,
}

impl Channel {
    pub fn path_segment(self) -> &'static str {
        match self {
            Channel::Com => "com",
            Channel::Event => "event",
            Channel::Trip => "trip",
            Channel::Res => "res",
        }
    }
}

/// What a notification reports; each kind has its own dispatch delay
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    StatusChanged,
    TripStart,
    TripEnd,
    TripData,
    TripSegment,
    TripComplete,
    DriverLate,
    RejectedAccess,
    CallCenterRequest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UsageEventName {
    #[serde(rename = "TripStartFromDevice")]
    TripStart,
    #[serde(rename = "TripEndFromDevice")]
    TripEnd,
    #[serde(rename = "TripFinished")]
    TripComplete,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProblemEventName {
    #[serde(rename = "RejectedAccess")]
    RejectedAccess,
    #[serde(rename = "DelayedTripEnd")]
    DriverLate,
}

/// Credential block embedded in every vehicle-originated payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccess {
    pub card_no: String,
    pub card_orga: String,
    pub serial_no: String,
    pub card_type: String,
}

impl From<&AccessDevice> for UserAccess {
    fn from(access: &AccessDevice) -> Self {
        Self {
            card_no: access.card_no.clone(),
            card_orga: access.card_orga.clone(),
            serial_no: access.serial_no.clone(),
            card_type: normalize_card_type(&access.card_type),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChanged {
    pub task_number: String,
    pub task_send_status: TechStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub description: UsageEventName,
    pub reservation_no: String,
    pub phone_no: String,
    pub orga_no: String,
    pub mileage: u32,
    pub user_access: UserAccess,
    pub timestamp: NaiveDateTime,
}

impl UsageEvent {
    pub fn from_trip(trip: &Trip, description: UsageEventName, at: DateTime<Utc>) -> Self {
        let mileage = match description {
            UsageEventName::TripStart => trip.odo_start.unwrap_or(0),
            UsageEventName::TripEnd | UsageEventName::TripComplete => trip.odo_end,
        };

        Self {
            description,
            reservation_no: trip.reservation_id.clone(),
            phone_no: trip.vehicle.phone_no.clone(),
            orga_no: trip.vehicle.orga_no.clone(),
            mileage,
            user_access: UserAccess::from(&trip.access),
            timestamp: trip.local_time(at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageProblemEvent {
    pub description: ProblemEventName,
    pub reservation_no: String,
    pub phone_no: String,
    pub orga_no: String,
    pub user_access: UserAccess,
    pub rejected_access_reason: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl UsageProblemEvent {
    /// Driver still out after the late buffer
    pub fn driver_late(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self {
            description: ProblemEventName::DriverLate,
            reservation_no: trip.reservation_id.clone(),
            phone_no: trip.vehicle.phone_no.clone(),
            orga_no: trip.vehicle.orga_no.clone(),
            user_access: UserAccess::from(&trip.access),
            rejected_access_reason: None,
            timestamp: trip.local_time(at),
        }
    }

    /// Access refused for a swipe without reservation; always reported in UTC
    pub fn rejected_access(swipe: &DriverSwipe, at: DateTime<Utc>) -> Self {
        Self {
            description: ProblemEventName::RejectedAccess,
            reservation_no: "0".to_string(),
            phone_no: swipe.vehicle.phone_no.clone(),
            orga_no: swipe.vehicle.orga_no.clone(),
            user_access: UserAccess::from(&swipe.access),
            rejected_access_reason: Some("NoReservation".to_string()),
            timestamp: at.naive_utc(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripDataEvent {
    pub reservation_no: String,
    pub phone_no: String,
    pub orga_no: String,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    pub start_mileage: u32,
    pub stop_mileage: u32,
    pub driving_distance: u32,
    /// `false` for an intermediate segment
    pub complete: bool,
    /// The vehicle never moved
    pub unused: bool,
    pub user_access: UserAccess,
    pub system_timestamp: DateTime<Utc>,
}

impl TripDataEvent {
    fn from_trip(trip: &Trip, complete: bool, at: DateTime<Utc>) -> Self {
        Self {
            reservation_no: trip.reservation_id.clone(),
            phone_no: trip.vehicle.phone_no.clone(),
            orga_no: trip.vehicle.orga_no.clone(),
            start: trip.start_time.map(|t| trip.local_time(t)),
            stop: trip.end_time.map(|t| trip.local_time(t)),
            start_mileage: trip.odo_start.unwrap_or(0),
            stop_mileage: trip.odo_end,
            driving_distance: trip.distance(),
            complete,
            unused: trip.is_unused(),
            user_access: UserAccess::from(&trip.access),
            system_timestamp: at,
        }
    }

    pub fn final_data(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self::from_trip(trip, true, at)
    }

    pub fn segment(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self::from_trip(trip, false, at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCenterRequestEvent {
    pub correlation_id: Uuid,
    pub task_number: String,
    pub phone_no: String,
    pub orga_no: String,
    pub user_access: UserAccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum Payload {
    StatusChanged(StatusChanged),
    UsageEvent(UsageEvent),
    UsageProblemEvent(UsageProblemEvent),
    TripData(TripDataEvent),
    CallCenterRequest(CallCenterRequestEvent),
}

/// A fully-formed message for the fleet controller and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub orga_no: String,
    pub channel: Channel,
    pub payload: Payload,
}

impl Notification {
    pub fn status(request_id: &str, orga_no: &str, status: TechStatus, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: orga_no.to_string(),
            channel: Channel::Com,
            payload: Payload::StatusChanged(StatusChanged {
                task_number: request_id.to_string(),
                task_send_status: status,
                timestamp: at,
            }),
        }
    }

    pub fn usage(trip: &Trip, description: UsageEventName, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: trip.orga_no().to_string(),
            channel: Channel::Event,
            payload: Payload::UsageEvent(UsageEvent::from_trip(trip, description, at)),
        }
    }

    pub fn driver_late(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: trip.orga_no().to_string(),
            channel: Channel::Event,
            payload: Payload::UsageProblemEvent(UsageProblemEvent::driver_late(trip, at)),
        }
    }

    pub fn rejected_access(swipe: &DriverSwipe, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: swipe.orga_no().to_string(),
            channel: Channel::Event,
            payload: Payload::UsageProblemEvent(UsageProblemEvent::rejected_access(swipe, at)),
        }
    }

    pub fn trip_data(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: trip.orga_no().to_string(),
            channel: Channel::Trip,
            payload: Payload::TripData(TripDataEvent::final_data(trip, at)),
        }
    }

    pub fn trip_segment(trip: &Trip, at: DateTime<Utc>) -> Self {
        Self {
            orga_no: trip.orga_no().to_string(),
            channel: Channel::Trip,
            payload: Payload::TripData(TripDataEvent::segment(trip, at)),
        }
    }

    pub fn call_center_request(swipe: &DriverSwipe, correlation_id: Uuid) -> Self {
        Self {
            orga_no: swipe.orga_no().to_string(),
            channel: Channel::Res,
            payload: Payload::CallCenterRequest(CallCenterRequestEvent {
                correlation_id,
                task_number: swipe.request_id.clone(),
                phone_no: swipe.vehicle.phone_no.clone(),
                orga_no: swipe.vehicle.orga_no.clone(),
                user_access: UserAccess::from(&swipe.access),
            }),
        }
    }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            Payload::StatusChanged(_) => EventKind::StatusChanged,
            Payload::UsageEvent(event) => match event.description {
                UsageEventName::TripStart => EventKind::TripStart,
                UsageEventName::TripEnd => EventKind::TripEnd,
                UsageEventName::TripComplete => EventKind::TripComplete,
            },
            Payload::UsageProblemEvent(event) => match event.description {
                ProblemEventName::RejectedAccess => EventKind::RejectedAccess,
                ProblemEventName::DriverLate => EventKind::DriverLate,
            },
            Payload::TripData(data) if data.complete => EventKind::TripData,
            Payload::TripData(_) => EventKind::TripSegment,
            Payload::CallCenterRequest(_) => EventKind::CallCenterRequest,
        }
    }
}
