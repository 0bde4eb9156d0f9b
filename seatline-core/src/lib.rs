pub mod models;
pub mod repository;
pub mod seat_map;

pub use models::{
    Booking, BookingId, BookingStatus, CatalogPolicy, FlightId, FlightRoute, NewBooking,
    NewFlightRoute, NewPlane, NewSchedule, Plane, PlaneId, Schedule, ScheduleId, ScheduleStatus,
};
pub use repository::{CatalogRepository, ClaimOutcome, ReservationLedger};
pub use seat_map::SeatMap;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid request: {0}")]
    Invalid(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Seat {seat_number} on schedule {schedule_id} is already reserved")]
    SeatTaken {
        schedule_id: ScheduleId,
        seat_number: String,
    },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
