use axum::{extract::State, Json};
use fleetsim_shared::{AccessDevice, DriverSwipe, VehicleDevice};
use serde::Deserialize;

use crate::ack::TaskAckResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub vehicle: VehicleDevice,
    #[serde(default)]
    pub access: AccessDevice,
}

/// POST /swipes
pub async fn create_swipe(
    State(state): State<AppState>,
    Json(req): Json<SwipeRequest>,
) -> Json<TaskAckResponse> {
    let swipe = DriverSwipe::new(req.vehicle, req.access);
    Json(state.engine.handle_new_driver_swipe(swipe).await.into())
}
