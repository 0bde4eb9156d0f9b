use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use seatline_core::{
    CatalogPolicy, CatalogRepository, CoreError, CoreResult, FlightId, FlightRoute,
    NewFlightRoute, NewPlane, NewSchedule, Plane, PlaneId, Schedule, ScheduleId, ScheduleStatus,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Default)]
struct Tables {
    planes: BTreeMap<PlaneId, Plane>,
    routes: BTreeMap<FlightId, FlightRoute>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    last_plane_id: i64,
    last_flight_id: i64,
    last_schedule_id: i64,
}

/// In-memory catalog.
///
/// Admin writes take the table lock exclusively; seat map resolution on the
/// booking path only ever takes the read side.
pub struct InMemoryCatalog {
    tables: RwLock<Tables>,
    policy: CatalogPolicy,
}

impl InMemoryCatalog {
    pub fn new(policy: CatalogPolicy) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            policy,
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(CatalogPolicy::default())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn create_plane(&self, plane: NewPlane) -> CoreResult<Plane> {
        let plane = plane.validate()?;
        let mut tables = self.tables.write().await;

        if tables.planes.values().any(|p| p.model.eq_ignore_ascii_case(&plane.model)) {
            return Err(CoreError::Conflict(format!("Plane model {} already exists", plane.model)));
        }

        tables.last_plane_id += 1;
        let created = Plane {
            plane_id: PlaneId(tables.last_plane_id),
            model: plane.model,
            total_seats: plane.total_seats as i32,
        };
        tables.planes.insert(created.plane_id, created.clone());

        info!("Plane {} created: {} with {} seats", created.plane_id, created.model, created.total_seats);
        Ok(created)
    }

    async fn get_plane(&self, id: PlaneId) -> CoreResult<Option<Plane>> {
        Ok(self.tables.read().await.planes.get(&id).cloned())
    }

    async fn create_flight_route(&self, route: NewFlightRoute) -> CoreResult<FlightRoute> {
        let route = route.validate()?;
        let mut tables = self.tables.write().await;

        if !tables.planes.contains_key(&route.plane_id) {
            return Err(CoreError::Invalid(format!("Plane {} does not exist", route.plane_id)));
        }
        if tables.routes.values().any(|r| r.flight_number == route.flight_number) {
            return Err(CoreError::Conflict(format!(
                "Flight number {} already exists",
                route.flight_number
            )));
        }

        tables.last_flight_id += 1;
        let created = FlightRoute {
            flight_id: FlightId(tables.last_flight_id),
            flight_number: route.flight_number,
            departure_airport: route.departure_airport,
            arrival_airport: route.arrival_airport,
            plane_id: route.plane_id,
        };
        tables.routes.insert(created.flight_id, created.clone());

        info!(
            "Flight route {} created: {} -> {} on plane {}",
            created.flight_number, created.departure_airport, created.arrival_airport, created.plane_id
        );
        Ok(created)
    }

    async fn get_flight_route(&self, id: FlightId) -> CoreResult<Option<FlightRoute>> {
        Ok(self.tables.read().await.routes.get(&id).cloned())
    }

    async fn list_flight_routes(&self) -> CoreResult<Vec<FlightRoute>> {
        Ok(self.tables.read().await.routes.values().cloned().collect())
    }

    async fn reassign_plane(&self, flight_id: FlightId, plane_id: PlaneId) -> CoreResult<FlightRoute> {
        let mut tables = self.tables.write().await;

        if !tables.planes.contains_key(&plane_id) {
            return Err(CoreError::NotFound(format!("Plane {}", plane_id)));
        }
        let route = tables
            .routes
            .get_mut(&flight_id)
            .ok_or_else(|| CoreError::NotFound(format!("Flight route {}", flight_id)))?;

        let previous = route.plane_id;
        route.plane_id = plane_id;

        info!(
            "Flight {} reassigned from plane {} to plane {}",
            route.flight_number, previous, plane_id
        );
        Ok(route.clone())
    }

    async fn create_schedule(&self, schedule: NewSchedule, now: NaiveDateTime) -> CoreResult<Schedule> {
        let schedule = schedule.validate(now)?;
        let mut tables = self.tables.write().await;

        let plane_id = tables
            .routes
            .get(&schedule.flight_id)
            .map(|route| route.plane_id)
            .ok_or_else(|| {
                CoreError::Invalid(format!("Flight route {} does not exist", schedule.flight_id))
            })?;

        if self.policy.reject_overlapping_schedules {
            let clash = tables.schedules.values().find(|s| {
                s.plane_id == plane_id && s.overlaps(schedule.departure_time, schedule.arrival_time)
            });
            if let Some(existing) = clash {
                warn!("Schedule overlaps schedule {} on plane {}", existing.schedule_id, plane_id);
                return Err(CoreError::Conflict(format!(
                    "Plane {} is already scheduled by schedule {} in that window",
                    plane_id, existing.schedule_id
                )));
            }
        }

        tables.last_schedule_id += 1;
        let created = Schedule {
            schedule_id: ScheduleId(tables.last_schedule_id),
            flight_id: schedule.flight_id,
            plane_id,
            departure_time: schedule.departure_time,
            arrival_time: schedule.arrival_time,
            base_price: schedule.base_price,
            status: ScheduleStatus::Scheduled,
        };
        tables.schedules.insert(created.schedule_id, created.clone());

        info!(
            "Schedule {} created for flight {} on plane {} departing {}",
            created.schedule_id, created.flight_id, plane_id, created.departure_time
        );
        Ok(created)
    }

    async fn get_schedule(&self, id: ScheduleId) -> CoreResult<Option<Schedule>> {
        Ok(self.tables.read().await.schedules.get(&id).cloned())
    }

    async fn search_schedules(
        &self,
        origin: &str,
        destination: &str,
        departure_date: NaiveDate,
    ) -> CoreResult<Vec<Schedule>> {
        let tables = self.tables.read().await;

        let mut found: Vec<Schedule> = tables
            .schedules
            .values()
            .filter(|s| s.departure_time.date() == departure_date)
            .filter(|s| {
                tables.routes.get(&s.flight_id).is_some_and(|r| {
                    r.departure_airport.eq_ignore_ascii_case(origin.trim())
                        && r.arrival_airport.eq_ignore_ascii_case(destination.trim())
                })
            })
            .cloned()
            .collect();
        found.sort_by_key(|s| s.departure_time);

        Ok(found)
    }
}
