use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use seatline_core::{
    CatalogPolicy, CatalogRepository, CoreError, CoreResult, FlightId, FlightRoute,
    NewFlightRoute, NewPlane, NewSchedule, Plane, PlaneId, Schedule, ScheduleId,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::database::{is_unique_violation, storage_error};

pub struct PgCatalogRepository {
    pool: PgPool,
    policy: CatalogPolicy,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool, policy: CatalogPolicy) -> Self {
        Self { pool, policy }
    }
}

#[derive(sqlx::FromRow)]
struct PlaneRow {
    plane_id: i64,
    model: String,
    total_seats: i32,
}

impl From<PlaneRow> for Plane {
    fn from(row: PlaneRow) -> Self {
        Plane {
            plane_id: PlaneId(row.plane_id),
            model: row.model,
            total_seats: row.total_seats,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    flight_id: i64,
    flight_number: String,
    departure_airport: String,
    arrival_airport: String,
    plane_id: i64,
}

impl From<RouteRow> for FlightRoute {
    fn from(row: RouteRow) -> Self {
        FlightRoute {
            flight_id: FlightId(row.flight_id),
            flight_number: row.flight_number,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            plane_id: PlaneId(row.plane_id),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    schedule_id: i64,
    flight_id: i64,
    plane_id: i64,
    departure_time: NaiveDateTime,
    arrival_time: NaiveDateTime,
    base_price: f64,
    status: String,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = CoreError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(Schedule {
            schedule_id: ScheduleId(row.schedule_id),
            flight_id: FlightId(row.flight_id),
            plane_id: PlaneId(row.plane_id),
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            base_price: row.base_price,
            status: row.status.parse()?,
        })
    }
}

const SCHEDULE_COLUMNS: &str =
    "schedule_id, flight_id, plane_id, departure_time, arrival_time, base_price, status";

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create_plane(&self, plane: NewPlane) -> CoreResult<Plane> {
        let plane = plane.validate()?;

        let row = sqlx::query_as::<_, PlaneRow>(
            "INSERT INTO planes (model, total_seats) VALUES ($1, $2)
             RETURNING plane_id, model, total_seats",
        )
        .bind(&plane.model)
        .bind(plane.total_seats as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!("Plane model {} already exists", plane.model))
            } else {
                storage_error("Failed to insert plane", e)
            }
        })?;

        let created = Plane::from(row);
        info!("Plane {} created: {} with {} seats", created.plane_id, created.model, created.total_seats);
        Ok(created)
    }

    async fn get_plane(&self, id: PlaneId) -> CoreResult<Option<Plane>> {
        let row = sqlx::query_as::<_, PlaneRow>(
            "SELECT plane_id, model, total_seats FROM planes WHERE plane_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load plane", e))?;

        Ok(row.map(Plane::from))
    }

    async fn create_flight_route(&self, route: NewFlightRoute) -> CoreResult<FlightRoute> {
        let route = route.validate()?;

        if self.get_plane(route.plane_id).await?.is_none() {
            return Err(CoreError::Invalid(format!("Plane {} does not exist", route.plane_id)));
        }

        let row = sqlx::query_as::<_, RouteRow>(
            "INSERT INTO flight_routes (flight_number, departure_airport, arrival_airport, plane_id)
             VALUES ($1, $2, $3, $4)
             RETURNING flight_id, flight_number, departure_airport, arrival_airport, plane_id",
        )
        .bind(&route.flight_number)
        .bind(&route.departure_airport)
        .bind(&route.arrival_airport)
        .bind(route.plane_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(format!("Flight number {} already exists", route.flight_number))
            } else {
                storage_error("Failed to insert flight route", e)
            }
        })?;

        let created = FlightRoute::from(row);
        info!(
            "Flight route {} created: {} -> {} on plane {}",
            created.flight_number, created.departure_airport, created.arrival_airport, created.plane_id
        );
        Ok(created)
    }

    async fn get_flight_route(&self, id: FlightId) -> CoreResult<Option<FlightRoute>> {
        let row = sqlx::query_as::<_, RouteRow>(
            "SELECT flight_id, flight_number, departure_airport, arrival_airport, plane_id
             FROM flight_routes WHERE flight_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load flight route", e))?;

        Ok(row.map(FlightRoute::from))
    }

    async fn list_flight_routes(&self) -> CoreResult<Vec<FlightRoute>> {
        let rows = sqlx::query_as::<_, RouteRow>(
            "SELECT flight_id, flight_number, departure_airport, arrival_airport, plane_id
             FROM flight_routes ORDER BY flight_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list flight routes", e))?;

        Ok(rows.into_iter().map(FlightRoute::from).collect())
    }

    async fn reassign_plane(&self, flight_id: FlightId, plane_id: PlaneId) -> CoreResult<FlightRoute> {
        if self.get_plane(plane_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Plane {}", plane_id)));
        }

        let row = sqlx::query_as::<_, RouteRow>(
            "UPDATE flight_routes SET plane_id = $2 WHERE flight_id = $1
             RETURNING flight_id, flight_number, departure_airport, arrival_airport, plane_id",
        )
        .bind(flight_id.0)
        .bind(plane_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to reassign plane", e))?
        .ok_or_else(|| CoreError::NotFound(format!("Flight route {}", flight_id)))?;

        let route = FlightRoute::from(row);
        info!("Flight {} reassigned to plane {}", route.flight_number, plane_id);
        Ok(route)
    }

    async fn create_schedule(&self, schedule: NewSchedule, now: NaiveDateTime) -> CoreResult<Schedule> {
        let schedule = schedule.validate(now)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin transaction", e))?;

        let plane_id = sqlx::query_scalar::<_, i64>("SELECT plane_id FROM flight_routes WHERE flight_id = $1")
            .bind(schedule.flight_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to load flight route", e))?
            .ok_or_else(|| {
                CoreError::Invalid(format!("Flight route {} does not exist", schedule.flight_id))
            })?;

        if self.policy.reject_overlapping_schedules {
            // Serializes schedule creation per plane for the overlap check.
            sqlx::query("SELECT plane_id FROM planes WHERE plane_id = $1 FOR UPDATE")
                .bind(plane_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("Failed to lock plane", e))?;

            let clash = sqlx::query_scalar::<_, i64>(
                "SELECT schedule_id FROM schedules
                 WHERE plane_id = $1 AND departure_time < $3 AND $2 < arrival_time
                 LIMIT 1",
            )
            .bind(plane_id)
            .bind(schedule.departure_time)
            .bind(schedule.arrival_time)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to check schedule overlap", e))?;

            if let Some(existing) = clash {
                warn!("Schedule overlaps schedule {} on plane {}", existing, plane_id);
                return Err(CoreError::Conflict(format!(
                    "Plane {} is already scheduled by schedule {} in that window",
                    plane_id, existing
                )));
            }
        }

        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "INSERT INTO schedules (flight_id, plane_id, departure_time, arrival_time, base_price, status)
             VALUES ($1, $2, $3, $4, $5, 'SCHEDULED')
             RETURNING {}",
            SCHEDULE_COLUMNS
        ))
        .bind(schedule.flight_id.0)
        .bind(plane_id)
        .bind(schedule.departure_time)
        .bind(schedule.arrival_time)
        .bind(schedule.base_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_error("Failed to insert schedule", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit schedule", e))?;

        let created = Schedule::try_from(row)?;
        info!(
            "Schedule {} created for flight {} on plane {} departing {}",
            created.schedule_id, created.flight_id, created.plane_id, created.departure_time
        );
        Ok(created)
    }

    async fn get_schedule(&self, id: ScheduleId) -> CoreResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {} FROM schedules WHERE schedule_id = $1",
            SCHEDULE_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load schedule", e))?;

        row.map(Schedule::try_from).transpose()
    }

    async fn search_schedules(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> CoreResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT s.schedule_id, s.flight_id, s.plane_id, s.departure_time, s.arrival_time,
                    s.base_price, s.status
             FROM schedules s
             JOIN flight_routes r ON r.flight_id = s.flight_id
             WHERE UPPER(r.departure_airport) = UPPER($1)
               AND UPPER(r.arrival_airport) = UPPER($2)
               AND s.departure_time::date = $3
             ORDER BY s.departure_time",
        )
        .bind(origin.trim())
        .bind(destination.trim())
        .bind(departure_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to search schedules", e))?;

        rows.into_iter().map(Schedule::try_from).collect()
    }
}
