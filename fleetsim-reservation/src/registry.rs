use crate::correlation::CorrelationStore;
use fleetsim_shared::Reservation;

/// Everything the engine mutates, kept behind a single lock
pub struct Registry {
    pub reservations: Vec<Reservation>,
    pub correlations: CorrelationStore,
}

impl Registry {
    pub fn new(correlations: CorrelationStore) -> Self {
        Self {
            reservations: Vec::new(),
            correlations,
        }
    }

    pub fn position(&self, reservation_id: &str) -> Option<usize> {
        self.reservations
            .iter()
            .position(|r| r.reservation_id == reservation_id)
    }

    pub fn get(&self, reservation_id: &str) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| r.reservation_id == reservation_id)
    }

    pub fn get_mut(&mut self, reservation_id: &str) -> Option<&mut Reservation> {
        self.reservations
            .iter_mut()
            .find(|r| r.reservation_id == reservation_id)
    }
}
