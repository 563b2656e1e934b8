use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use fleetsim_core::{CoreError, CoreResult};
use fleetsim_shared::reservation::MAX_LATE_BUFFER_MINUTES;
use fleetsim_shared::{AccessDevice, Reservation, VehicleDevice};
use serde::Deserialize;

use crate::ack::TaskAckResponse;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReservationRequest {
    pub reservation_id: String,
    pub vehicle: VehicleDevice,
    #[serde(default)]
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

impl ReservationRequest {
    pub fn into_reservation(self) -> CoreResult<Reservation> {
        if self.reservation_id.trim().is_empty() {
            return Err(CoreError::ValidationError("reservation_id must not be empty".into()));
        }
        validate_window(self.start_time, self.end_time)?;
        validate_late_buffer(self.late_buffer_minutes)?;

        let mut reservation = Reservation::new(
            self.reservation_id,
            self.vehicle,
            self.access,
            self.start_time,
            self.end_time,
        );
        reservation.timezone = self.timezone;
        reservation.late_alarm = self.late_alarm;
        reservation.late_buffer_minutes = self.late_buffer_minutes;
        Ok(reservation)
    }
}

pub(crate) fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::ValidationError(format!(
            "end_time {} precedes start_time {}",
            end, start
        )));
    }
    Ok(())
}

pub(crate) fn validate_late_buffer(minutes: i64) -> CoreResult<()> {
    if !(0..=MAX_LATE_BUFFER_MINUTES).contains(&minutes) {
        return Err(CoreError::ValidationError(format!(
            "late_buffer_minutes must be between 0 and {}",
            MAX_LATE_BUFFER_MINUTES
        )));
    }
    Ok(())
}

/// POST /reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<ReservationRequest>,
) -> Result<Json<TaskAckResponse>, AppError> {
    let reservation = req.into_reservation()?;
    let ack = state.engine.handle_new_reservation(reservation).await;
    Ok(Json(ack.into()))
}

/// GET /reservations
pub async fn list_reservations(State(state): State<AppState>) -> Json<Vec<Reservation>> {
    Json(state.engine.reservations().await)
}

/// GET /reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    state
        .engine
        .reservation(&reservation_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(format!("Reservation {} not found", reservation_id)))
}
