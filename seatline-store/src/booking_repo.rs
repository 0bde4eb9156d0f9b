use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seatline_core::{
    Booking, BookingId, ClaimOutcome, CoreError, CoreResult, NewBooking, ReservationLedger,
    ScheduleId,
};
use sqlx::PgPool;
use tracing::debug;

use crate::database::storage_error;

/// Postgres reservation ledger.
///
/// The claim is a single `INSERT ... ON CONFLICT DO NOTHING` against the
/// partial unique index on confirmed `(schedule_id, seat_number)`; an empty
/// `RETURNING` means another transaction already holds the seat.
pub struct PgReservationLedger {
    pool: PgPool,
}

impl PgReservationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: i64,
    schedule_id: i64,
    seat_number: String,
    customer_name: String,
    status: String,
    booked_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            booking_id: BookingId(row.booking_id),
            schedule_id: ScheduleId(row.schedule_id),
            seat_number: row.seat_number,
            customer_name: row.customer_name,
            status: row.status.parse()?,
            booked_at: row.booked_at,
        })
    }
}

#[async_trait]
impl ReservationLedger for PgReservationLedger {
    async fn try_claim(&self, booking: NewBooking) -> CoreResult<ClaimOutcome> {
        let row = sqlx::query_as::<_, BookingRow>(
            "INSERT INTO bookings (schedule_id, seat_number, customer_name, status, booked_at)
             VALUES ($1, $2, $3, 'CONFIRMED', $4)
             ON CONFLICT (schedule_id, seat_number) WHERE status = 'CONFIRMED' DO NOTHING
             RETURNING booking_id, schedule_id, seat_number, customer_name, status, booked_at",
        )
        .bind(booking.schedule_id.0)
        .bind(&booking.seat_number)
        .bind(&booking.customer_name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to claim seat", e))?;

        match row {
            Some(row) => Ok(ClaimOutcome::Committed(Booking::try_from(row)?)),
            None => {
                debug!("Seat {} on schedule {} already claimed", booking.seat_number, booking.schedule_id);
                Ok(ClaimOutcome::Conflict)
            }
        }
    }

    async fn reserved_seats(&self, schedule_id: ScheduleId) -> CoreResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT seat_number FROM bookings
             WHERE schedule_id = $1 AND status = 'CONFIRMED'
             ORDER BY seat_number COLLATE \"C\"",
        )
        .bind(schedule_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load reserved seats", e))
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT booking_id, schedule_id, seat_number, customer_name, status, booked_at
             FROM bookings WHERE booking_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load booking", e))?;

        row.map(Booking::try_from).transpose()
    }
}
