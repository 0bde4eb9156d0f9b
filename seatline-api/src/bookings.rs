use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use seatline_core::{Booking, BookingId, CoreError, CoreResult, NewBooking, ScheduleId};
use seatline_shared::Masked;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub schedule_id: ScheduleId,
    pub seat_number: String,
    pub customer_name: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/booking", post(create_booking))
        .route("/api/v1/booking/{booking_id}", get(get_booking))
        .route("/api/v1/booking/schedule/{schedule_id}/reserved", get(reserved_seats))
        .route("/api/v1/booking/schedule/{schedule_id}/stream", get(stream_claims))
}

fn outcome_label(result: &CoreResult<Booking>) -> &'static str {
    match result {
        Ok(_) => "committed",
        Err(CoreError::SeatTaken { .. }) => "seat_taken",
        Err(CoreError::Invalid(_)) => "invalid",
        Err(CoreError::NotFound(_)) => "not_found",
        Err(_) => "error",
    }
}

/// POST /api/v1/booking
async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    info!(
        "Booking request: seat {} on schedule {} for {}",
        req.seat_number,
        req.schedule_id,
        Masked(&req.customer_name)
    );

    let result = {
        let _timer = state.metrics.claim_timer();
        state
            .engine
            .book(NewBooking {
                schedule_id: req.schedule_id,
                seat_number: req.seat_number,
                customer_name: req.customer_name,
            })
            .await
    };
    state.metrics.record_attempt(outcome_label(&result));

    Ok((StatusCode::CREATED, Json(result?)))
}

/// GET /api/v1/booking/{booking_id}
async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.engine.get_booking(booking_id).await?))
}

/// GET /api/v1/booking/schedule/{schedule_id}/reserved
async fn reserved_seats(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.engine.reserved_seats(schedule_id).await?))
}

/// GET /api/v1/booking/schedule/{schedule_id}/stream
///
/// Server-sent `seat_claimed` events for one schedule. Lagging subscribers
/// silently skip what they missed.
async fn stream_claims(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.catalog.get_schedule(schedule_id).await?.is_none() {
        return Err(AppError::NotFoundError(format!("Schedule {} not found", schedule_id)));
    }

    let receiver = state.engine.subscribe();
    debug!("SSE subscriber attached to schedule {}", schedule_id);

    let stream = BroadcastStream::new(receiver).filter_map(move |message| async move {
        match message {
            Ok(event) if event.belongs_to(schedule_id.0) => Event::default()
                .event("seat_claimed")
                .json_data(&event)
                .ok()
                .map(Ok),
            Ok(_) => None,
            Err(lagged) => {
                debug!("SSE subscriber on schedule {} lagged: {}", schedule_id, lagged);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
