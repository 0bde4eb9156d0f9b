use seatline_core::{CatalogRepository, CoreError, CoreResult, ScheduleId, SeatMap};
use std::sync::Arc;

/// Derives the seat map of a schedule from the plane snapshotted into it.
#[derive(Clone)]
pub struct SeatMapResolver {
    catalog: Arc<dyn CatalogRepository>,
}

impl SeatMapResolver {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn resolve(&self, schedule_id: ScheduleId) -> CoreResult<SeatMap> {
        let schedule = self
            .catalog
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Schedule {}", schedule_id)))?;

        // Never the route's current plane: bookings already made must stay valid.
        let plane = self
            .catalog
            .get_plane(schedule.plane_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Plane {} of schedule {}",
                    schedule.plane_id, schedule_id
                ))
            })?;

        Ok(SeatMap::for_plane(&plane))
    }
}
