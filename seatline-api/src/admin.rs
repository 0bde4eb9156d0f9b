use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use seatline_core::{FlightId, NewFlightRoute, NewPlane, NewSchedule, Plane, PlaneId};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::flights::{flight_view, schedule_view, FlightResponse, ScheduleResponse};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaneRequest {
    pub model: String,
    pub total_seats: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlightRequest {
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub plane_id: PlaneId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub flight_id: FlightId,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/management/planes", post(create_plane))
        .route("/api/v1/admin/management/flights", post(create_flight))
        .route("/api/v1/admin/management/schedules", post(create_schedule))
        .route(
            "/api/v1/admin/management/flights/{flight_id}/plane/{plane_id}",
            put(reassign_plane),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/admin/management/planes
async fn create_plane(
    State(state): State<AppState>,
    Json(req): Json<CreatePlaneRequest>,
) -> Result<(StatusCode, Json<Plane>), AppError> {
    let plane = state
        .catalog
        .create_plane(NewPlane {
            model: req.model,
            total_seats: req.total_seats,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(plane)))
}

/// POST /api/v1/admin/management/flights
async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<CreateFlightRequest>,
) -> Result<(StatusCode, Json<FlightResponse>), AppError> {
    let route = state
        .catalog
        .create_flight_route(NewFlightRoute {
            flight_number: req.flight_number,
            departure_airport: req.departure_airport,
            arrival_airport: req.arrival_airport,
            plane_id: req.plane_id,
        })
        .await?;

    let view = flight_view(state.catalog.as_ref(), route).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/v1/admin/management/schedules
async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), AppError> {
    let now = Local::now().naive_local();
    let schedule = state
        .catalog
        .create_schedule(
            NewSchedule {
                flight_id: req.flight_id,
                departure_time: req.departure_time,
                arrival_time: req.arrival_time,
                base_price: req.base_price,
            },
            now,
        )
        .await?;

    let view = schedule_view(state.catalog.as_ref(), schedule).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/v1/admin/management/flights/{flight_id}/plane/{plane_id}
async fn reassign_plane(
    State(state): State<AppState>,
    Path((flight_id, plane_id)): Path<(FlightId, PlaneId)>,
) -> Result<Json<FlightResponse>, AppError> {
    let route = state.catalog.reassign_plane(flight_id, plane_id).await?;
    info!("Admin reassigned flight {} to plane {}", route.flight_number, plane_id);

    Ok(Json(flight_view(state.catalog.as_ref(), route).await?))
}
