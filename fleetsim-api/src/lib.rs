use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod ack;
pub mod call_center;
pub mod error;
pub mod reservations;
pub mod state;
pub mod swipes;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/reservations",
            post(reservations::create_reservation).get(reservations::list_reservations),
        )
        .route("/reservations/{id}", get(reservations::get_reservation))
        .route("/swipes", post(swipes::create_swipe))
        .route("/call-center/responses", post(call_center::create_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
