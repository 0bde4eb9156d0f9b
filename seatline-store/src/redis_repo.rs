use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use seatline_core::{
    Booking, BookingId, BookingStatus, ClaimOutcome, CoreError, CoreResult, NewBooking,
    ReservationLedger, ScheduleId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const BOOKING_SEQUENCE_KEY: &str = "seatline:booking:seq";
const BOOKINGS_KEY: &str = "seatline:bookings";

/// Claims the seat key, draws the next booking id and records the booking,
/// all inside one script so the server runs it without interleaving.
///
/// KEYS: seat, sequence, bookings hash, reserved set. ARGV: booking record.
/// Returns the new booking id, or 0 if the seat key already exists.
const CLAIM_SCRIPT: &str = r#"
if redis.call("EXISTS", KEYS[1]) == 1 then
    return 0
end
local id = redis.call("INCR", KEYS[2])
redis.call("SET", KEYS[1], id)
redis.call("HSET", KEYS[3], id, ARGV[1])
redis.call("SADD", KEYS[4], ARGV[2])
return id
"#;

/// Booking as stored in the bookings hash; the id is the hash field.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBooking {
    schedule_id: ScheduleId,
    seat_number: String,
    customer_name: String,
    status: BookingStatus,
    booked_at: DateTime<Utc>,
}

impl StoredBooking {
    fn into_booking(self, booking_id: BookingId) -> Booking {
        Booking {
            booking_id,
            schedule_id: self.schedule_id,
            seat_number: self.seat_number,
            customer_name: self.customer_name,
            status: self.status,
            booked_at: self.booked_at,
        }
    }
}

fn seat_key(schedule_id: ScheduleId, seat_number: &str) -> String {
    format!("seatline:schedule:{}:seat:{}", schedule_id, seat_number)
}

fn reserved_key(schedule_id: ScheduleId) -> String {
    format!("seatline:schedule:{}:reserved", schedule_id)
}

fn redis_error(context: &str, err: redis::RedisError) -> CoreError {
    error!("{}: {}", context, err);
    CoreError::Storage(format!("{}: {}", context, err))
}

#[derive(Clone)]
pub struct RedisLedger {
    conn: ConnectionManager,
    claim: Script,
}

impl RedisLedger {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            claim: Script::new(CLAIM_SCRIPT),
        })
    }
}

#[async_trait]
impl ReservationLedger for RedisLedger {
    async fn try_claim(&self, booking: NewBooking) -> CoreResult<ClaimOutcome> {
        let booked_at = Utc::now();
        let record = serde_json::to_string(&StoredBooking {
            schedule_id: booking.schedule_id,
            seat_number: booking.seat_number.clone(),
            customer_name: booking.customer_name.clone(),
            status: BookingStatus::Confirmed,
            booked_at,
        })
        .map_err(|e| CoreError::Internal(format!("Failed to encode booking: {}", e)))?;

        let mut conn = self.conn.clone();
        let id: i64 = self
            .claim
            .key(seat_key(booking.schedule_id, &booking.seat_number))
            .key(BOOKING_SEQUENCE_KEY)
            .key(BOOKINGS_KEY)
            .key(reserved_key(booking.schedule_id))
            .arg(record)
            .arg(&booking.seat_number)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| redis_error("Failed to run claim script", e))?;

        if id == 0 {
            debug!("Seat {} on schedule {} already claimed", booking.seat_number, booking.schedule_id);
            return Ok(ClaimOutcome::Conflict);
        }

        Ok(ClaimOutcome::Committed(booking.commit(BookingId(id), booked_at)))
    }

    async fn reserved_seats(&self, schedule_id: ScheduleId) -> CoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut seats: Vec<String> = conn
            .smembers(reserved_key(schedule_id))
            .await
            .map_err(|e| redis_error("Failed to load reserved seats", e))?;
        seats.sort();
        Ok(seats)
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        let mut conn = self.conn.clone();
        let record: Option<String> = conn
            .hget(BOOKINGS_KEY, id.0)
            .await
            .map_err(|e| redis_error("Failed to load booking", e))?;

        record
            .map(|raw| {
                serde_json::from_str::<StoredBooking>(&raw)
                    .map(|stored| stored.into_booking(id))
                    .map_err(|e| CoreError::Storage(format!("Corrupt booking {}: {}", id, e)))
            })
            .transpose()
    }
}
