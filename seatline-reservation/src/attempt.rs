use seatline_core::{BookingId, ClaimOutcome, CoreError, NewBooking, SeatMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InvalidSeat,
    SeatTaken,
}

/// Lifecycle of one booking attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Received,
    Validated,
    Claimed(BookingId),
    Rejected(RejectionKind),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Claimed(_) | AttemptState::Rejected(_))
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::Received => f.write_str("RECEIVED"),
            AttemptState::Validated => f.write_str("VALIDATED"),
            AttemptState::Claimed(id) => write!(f, "CLAIMED({})", id),
            AttemptState::Rejected(kind) => write!(f, "REJECTED({:?})", kind),
        }
    }
}

/// A single request moving through `Received → Validated → Claimed/Rejected`.
///
/// Attempts share nothing; whatever survives an attempt lives in the ledger.
#[derive(Debug)]
pub struct BookingAttempt {
    request: NewBooking,
    state: AttemptState,
}

impl BookingAttempt {
    pub fn new(request: NewBooking) -> Self {
        Self {
            request,
            state: AttemptState::Received,
        }
    }

    pub fn request(&self) -> &NewBooking {
        &self.request
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Transition: Received → Validated, or Rejected(InvalidSeat)
    pub fn validate(&mut self, seat_map: &SeatMap) -> Result<&AttemptState, AttemptError> {
        if self.state != AttemptState::Received {
            return Err(AttemptError::InvalidTransition {
                from: self.state.to_string(),
                to: "VALIDATED".to_string(),
            });
        }

        self.state = if seat_map.contains(&self.request.seat_number) {
            AttemptState::Validated
        } else {
            AttemptState::Rejected(RejectionKind::InvalidSeat)
        };
        Ok(&self.state)
    }

    /// Transition: Validated → Claimed, or Rejected(SeatTaken)
    pub fn settle(&mut self, outcome: &ClaimOutcome) -> Result<&AttemptState, AttemptError> {
        if self.state != AttemptState::Validated {
            return Err(AttemptError::InvalidTransition {
                from: self.state.to_string(),
                to: "CLAIMED".to_string(),
            });
        }

        self.state = match outcome {
            ClaimOutcome::Committed(booking) => AttemptState::Claimed(booking.booking_id),
            ClaimOutcome::Conflict => AttemptState::Rejected(RejectionKind::SeatTaken),
        };
        Ok(&self.state)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Invalid attempt transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl From<AttemptError> for CoreError {
    fn from(err: AttemptError) -> Self {
        CoreError::Internal(err.to_string())
    }
}
