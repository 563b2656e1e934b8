pub mod device;
pub mod models;
pub mod reservation;
pub mod status;
pub mod swipe;
pub mod trip;

pub use device::{AccessDevice, VehicleDevice};
pub use models::events::{Channel, EventKind, Notification, Payload};
pub use reservation::Reservation;
pub use status::TechStatus;
pub use swipe::{CallCenterResponse, DriverSwipe};
pub use trip::{Trip, TripStatus};
