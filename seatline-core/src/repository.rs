use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{
    Booking, BookingId, FlightId, FlightRoute, NewBooking, NewFlightRoute, NewPlane, NewSchedule,
    Plane, PlaneId, Schedule, ScheduleId,
};
use crate::CoreResult;

/// Repository trait for plane, route and schedule definitions
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_plane(&self, plane: NewPlane) -> CoreResult<Plane>;

    async fn get_plane(&self, id: PlaneId) -> CoreResult<Option<Plane>>;

    async fn create_flight_route(&self, route: NewFlightRoute) -> CoreResult<FlightRoute>;

    async fn get_flight_route(&self, id: FlightId) -> CoreResult<Option<FlightRoute>>;

    async fn list_flight_routes(&self) -> CoreResult<Vec<FlightRoute>>;

    /// Points the route at another plane. Existing schedules keep theirs.
    async fn reassign_plane(&self, flight_id: FlightId, plane_id: PlaneId) -> CoreResult<FlightRoute>;

    /// Reads the route's plane once and snapshots it into the new schedule.
    async fn create_schedule(&self, schedule: NewSchedule, now: NaiveDateTime) -> CoreResult<Schedule>;

    async fn get_schedule(&self, id: ScheduleId) -> CoreResult<Option<Schedule>>;

    async fn search_schedules(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> CoreResult<Vec<Schedule>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Committed(Booking),
    Conflict,
}

/// Durable record of committed bookings.
///
/// `try_claim` is the only write: absence check and insert happen as one
/// indivisible step scoped to `(schedule_id, seat_number)`. Implementations
/// must not serialize claims on unrelated keys.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    async fn try_claim(&self, booking: NewBooking) -> CoreResult<ClaimOutcome>;

    /// Committed seats of a schedule, sorted.
    async fn reserved_seats(&self, schedule_id: ScheduleId) -> CoreResult<Vec<String>>;

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>>;
}
