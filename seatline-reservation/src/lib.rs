pub mod attempt;
pub mod engine;
pub mod ledger;

pub use attempt::{AttemptError, AttemptState, BookingAttempt, RejectionKind};
pub use engine::{SeatAvailability, SeatReservationEngine, SeatStatus};
pub use ledger::InMemoryLedger;
