use axum::{extract::State, Json};
use fleetsim_shared::CallCenterResponse;

use crate::ack::TaskAckResponse;
use crate::error::AppError;
use crate::reservations::{validate_late_buffer, validate_window};
use crate::state::AppState;

/// POST /call-center/responses
///
/// A blank `reservation_id` refuses the escalated swipe; anything else
/// grants a reservation, whose window and late buffer must be well-formed.
pub async fn create_response(
    State(state): State<AppState>,
    Json(response): Json<CallCenterResponse>,
) -> Result<Json<TaskAckResponse>, AppError> {
    if !response.is_refusal() {
        validate_window(response.start_time, response.end_time)?;
        validate_late_buffer(response.late_buffer_minutes)?;
    }

    let ack = state.engine.handle_call_center_response(response).await;
    Ok(Json(ack.into()))
}
