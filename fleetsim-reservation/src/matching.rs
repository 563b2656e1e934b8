use chrono::{DateTime, Utc};
use fleetsim_shared::{DriverSwipe, Reservation};

/// Index of the reservation a swipe belongs to.
///
/// The vehicle must match, the reservation must be active at `now` and the
/// swipe must present the reserved credential. If several qualify, the one
/// registered last wins.
pub fn find_match(
    reservations: &[Reservation],
    swipe: &DriverSwipe,
    now: DateTime<Utc>,
) -> Option<usize> {
    reservations
        .iter()
        .enumerate()
        .filter(|(_, r)| r.vehicle == swipe.vehicle)
        .filter(|(_, r)| r.is_active_at(now))
        .filter(|(_, r)| r.access.identifies_same_credential(&swipe.access))
        .map(|(idx, _)| idx)
        .last()
}
