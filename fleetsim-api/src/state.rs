use fleetsim_reservation::ReservationEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: ReservationEngine,
}

impl AppState {
    pub fn new(engine: ReservationEngine) -> Self {
        Self { engine }
    }
}
