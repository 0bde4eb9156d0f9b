use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Largest cabin a plane may declare.
pub const MAX_TOTAL_SEATS: i64 = 1_000;

/// Column widths of the Postgres catalog and booking tables.
pub const MAX_MODEL_LEN: usize = 100;
pub const MAX_FLIGHT_NUMBER_LEN: usize = 20;
pub const MAX_AIRPORT_LEN: usize = 10;
pub const MAX_SEAT_NUMBER_LEN: usize = 8;
pub const MAX_CUSTOMER_NAME_LEN: usize = 200;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(PlaneId);
entity_id!(FlightId);
entity_id!(ScheduleId);
entity_id!(
    /// Assigned by the ledger on commit, strictly increasing.
    BookingId
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plane {
    pub plane_id: PlaneId,
    pub model: String,
    pub total_seats: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlightRoute {
    pub flight_id: FlightId,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub plane_id: PlaneId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "SCHEDULED",
        }
    }
}

impl FromStr for ScheduleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(ScheduleStatus::Scheduled),
            other => Err(CoreError::Storage(format!("unknown schedule status {}", other))),
        }
    }
}

/// One dated departure of a route.
///
/// `plane_id` is the route's plane at creation time and never follows later
/// reassignments, so the seat map of a schedule is fixed for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub schedule_id: ScheduleId,
    pub flight_id: FlightId,
    pub plane_id: PlaneId,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
    pub status: ScheduleStatus,
}

impl Schedule {
    /// Half-open interval intersection: touching schedules do not overlap.
    pub fn overlaps(&self, departure: NaiveDateTime, arrival: NaiveDateTime) -> bool {
        self.departure_time < arrival && departure < self.arrival_time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            other => Err(CoreError::Storage(format!("unknown booking status {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: BookingId,
    pub schedule_id: ScheduleId,
    pub seat_number: String,
    pub customer_name: String,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
}

/// Policy knobs for the catalog, loaded from business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPolicy {
    pub reject_overlapping_schedules: bool,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            reject_overlapping_schedules: true,
        }
    }
}

// ============================================================================
// Creation requests
// ============================================================================

fn required(field: &str, value: String, max_len: usize) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Invalid(format!("{} must not be blank", field)));
    }
    within(field, trimmed, max_len)?;
    Ok(trimmed.to_string())
}

/// Upper-cased, then measured: case mapping can change the length.
fn code(field: &str, value: String, max_len: usize) -> CoreResult<String> {
    let upper = required(field, value, usize::MAX)?.to_uppercase();
    within(field, &upper, max_len)?;
    Ok(upper)
}

fn within(field: &str, value: &str, max_len: usize) -> CoreResult<()> {
    if value.chars().count() > max_len {
        return Err(CoreError::Invalid(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlane {
    pub model: String,
    pub total_seats: i64,
}

impl NewPlane {
    pub fn validate(self) -> CoreResult<Self> {
        let model = required("model", self.model, MAX_MODEL_LEN)?;
        if self.total_seats <= 0 {
            return Err(CoreError::Invalid("totalSeats must be positive".to_string()));
        }
        if self.total_seats > MAX_TOTAL_SEATS {
            return Err(CoreError::Invalid(format!(
                "totalSeats must not exceed {}",
                MAX_TOTAL_SEATS
            )));
        }
        Ok(Self {
            model,
            total_seats: self.total_seats,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlightRoute {
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub plane_id: PlaneId,
}

impl NewFlightRoute {
    pub fn validate(self) -> CoreResult<Self> {
        let flight_number = code("flightNumber", self.flight_number, MAX_FLIGHT_NUMBER_LEN)?;
        let departure_airport = code("departureAirport", self.departure_airport, MAX_AIRPORT_LEN)?;
        let arrival_airport = code("arrivalAirport", self.arrival_airport, MAX_AIRPORT_LEN)?;

        if departure_airport == arrival_airport {
            return Err(CoreError::Invalid(format!(
                "departure and arrival airport are both {}",
                departure_airport
            )));
        }

        Ok(Self {
            flight_number,
            departure_airport,
            arrival_airport,
            plane_id: self.plane_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    pub flight_id: FlightId,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
}

impl NewSchedule {
    /// `now` is the local wall clock the times are compared against.
    pub fn validate(self, now: NaiveDateTime) -> CoreResult<Self> {
        if self.departure_time >= self.arrival_time {
            return Err(CoreError::Invalid(
                "departureTime must be before arrivalTime".to_string(),
            ));
        }
        if self.departure_time <= now {
            return Err(CoreError::Invalid("departureTime must be in the future".to_string()));
        }
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(CoreError::Invalid("basePrice must be a non-negative amount".to_string()));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub schedule_id: ScheduleId,
    pub seat_number: String,
    pub customer_name: String,
}

impl NewBooking {
    /// The seat number is kept verbatim; only its canonical spelling names a seat.
    pub fn validate(self) -> CoreResult<Self> {
        if self.seat_number.trim().is_empty() {
            return Err(CoreError::Invalid("seatNumber must not be blank".to_string()));
        }
        within("seatNumber", &self.seat_number, MAX_SEAT_NUMBER_LEN)?;
        Ok(Self {
            schedule_id: self.schedule_id,
            seat_number: self.seat_number,
            customer_name: required("customerName", self.customer_name, MAX_CUSTOMER_NAME_LEN)?,
        })
    }

    pub fn commit(self, booking_id: BookingId, booked_at: DateTime<Utc>) -> Booking {
        Booking {
            booking_id,
            schedule_id: self.schedule_id,
            seat_number: self.seat_number,
            customer_name: self.customer_name,
            status: BookingStatus::Confirmed,
            booked_at,
        }
    }
}
