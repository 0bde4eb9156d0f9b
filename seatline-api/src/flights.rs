//! Read-only views over the catalog, and the response shapes shared with the
//! admin surface.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use seatline_core::{
    CatalogRepository, FlightId, FlightRoute, Plane, PlaneId, Schedule, ScheduleId,
    ScheduleStatus,
};
use seatline_reservation::SeatAvailability;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightResponse {
    pub flight_id: FlightId,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub plane: Plane,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: ScheduleId,
    pub flight_id: FlightId,
    pub plane: Plane,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
    pub status: ScheduleStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

impl SearchRequest {
    fn validate(&self, today: NaiveDate) -> Result<(), AppError> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(AppError::ValidationError(
                "origin and destination must not be blank".to_string(),
            ));
        }
        if self.departure_date < today {
            return Err(AppError::ValidationError(format!(
                "departureDate {} is in the past",
                self.departure_date
            )));
        }
        Ok(())
    }
}

pub(crate) async fn load_plane(catalog: &dyn CatalogRepository, id: PlaneId) -> Result<Plane, AppError> {
    catalog
        .get_plane(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Plane {} not found", id)))
}

pub(crate) async fn flight_view(
    catalog: &dyn CatalogRepository,
    route: FlightRoute,
) -> Result<FlightResponse, AppError> {
    let plane = load_plane(catalog, route.plane_id).await?;
    Ok(FlightResponse {
        flight_id: route.flight_id,
        flight_number: route.flight_number,
        departure_airport: route.departure_airport,
        arrival_airport: route.arrival_airport,
        plane,
    })
}

/// Shows the plane the schedule was created with, not the route's current one.
pub(crate) async fn schedule_view(
    catalog: &dyn CatalogRepository,
    schedule: Schedule,
) -> Result<ScheduleResponse, AppError> {
    let plane = load_plane(catalog, schedule.plane_id).await?;
    Ok(ScheduleResponse {
        schedule_id: schedule.schedule_id,
        flight_id: schedule.flight_id,
        plane,
        departure_time: schedule.departure_time,
        arrival_time: schedule.arrival_time,
        base_price: schedule.base_price,
        status: schedule.status,
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/flights/search", post(search_schedules))
        .route("/api/v1/flights/schedules/{schedule_id}", get(get_schedule))
        .route("/api/v1/flights/schedules/{schedule_id}/seats", get(get_seat_map))
        .route("/api/v1/flights/routes", get(list_routes))
        .route("/api/v1/flights/planes/{plane_id}", get(get_plane))
}

/// POST /api/v1/flights/search
async fn search_schedules(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<ScheduleResponse>>, AppError> {
    req.validate(Local::now().date_naive())?;

    let schedules = state
        .catalog
        .search_schedules(&req.origin, &req.destination, req.departure_date)
        .await?;

    let mut views = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        views.push(schedule_view(state.catalog.as_ref(), schedule).await?);
    }
    Ok(Json(views))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let schedule = state
        .catalog
        .get_schedule(schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Schedule {} not found", schedule_id)))?;

    Ok(Json(schedule_view(state.catalog.as_ref(), schedule).await?))
}

async fn get_seat_map(
    State(state): State<AppState>,
    Path(schedule_id): Path<ScheduleId>,
) -> Result<Json<SeatAvailability>, AppError> {
    Ok(Json(state.engine.seat_availability(schedule_id).await?))
}

async fn list_routes(State(state): State<AppState>) -> Result<Json<Vec<FlightResponse>>, AppError> {
    let routes = state.catalog.list_flight_routes().await?;

    let mut views = Vec::with_capacity(routes.len());
    for route in routes {
        views.push(flight_view(state.catalog.as_ref(), route).await?);
    }
    Ok(Json(views))
}

async fn get_plane(
    State(state): State<AppState>,
    Path(plane_id): Path<PlaneId>,
) -> Result<Json<Plane>, AppError> {
    Ok(Json(load_plane(state.catalog.as_ref(), plane_id).await?))
}
