use seatline_catalog::SeatMapResolver;
use seatline_core::{
    Booking, BookingId, ClaimOutcome, CoreError, CoreResult, NewBooking, ReservationLedger,
    ScheduleId,
};
use seatline_shared::{Masked, SeatClaimedEvent};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::attempt::{AttemptState, BookingAttempt};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatAvailability {
    pub schedule_id: ScheduleId,
    pub seats: BTreeMap<String, SeatStatus>,
}

/// Validates a requested seat against the schedule's seat map and claims it
/// in the ledger.
///
/// The engine keeps no per-schedule state and takes no locks of its own: the
/// ledger's claim is the only synchronization point.
pub struct SeatReservationEngine {
    resolver: SeatMapResolver,
    ledger: Arc<dyn ReservationLedger>,
    events: broadcast::Sender<SeatClaimedEvent>,
}

impl SeatReservationEngine {
    pub fn new(resolver: SeatMapResolver, ledger: Arc<dyn ReservationLedger>, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            resolver,
            ledger,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatClaimedEvent> {
        self.events.subscribe()
    }

    pub async fn book(&self, request: NewBooking) -> CoreResult<Booking> {
        let request = request.validate()?;
        let schedule_id = request.schedule_id;
        let mut attempt = BookingAttempt::new(request);

        let seat_map = self.resolver.resolve(schedule_id).await?;

        let state = attempt.validate(&seat_map)?.clone();
        if let AttemptState::Rejected(kind) = state {
            warn!(
                "Booking rejected ({:?}): seat {} is not on schedule {}",
                kind,
                attempt.request().seat_number,
                schedule_id
            );
            return Err(CoreError::Invalid(format!(
                "Seat {} does not exist on schedule {}",
                attempt.request().seat_number,
                schedule_id
            )));
        }
        debug!("Attempt for seat {} on schedule {} validated", attempt.request().seat_number, schedule_id);

        let outcome = self.ledger.try_claim(attempt.request().clone()).await?;
        attempt.settle(&outcome)?;

        match outcome {
            ClaimOutcome::Committed(booking) => {
                info!(
                    "Booking {} confirmed: seat {} on schedule {} for {}",
                    booking.booking_id,
                    booking.seat_number,
                    schedule_id,
                    Masked(&booking.customer_name)
                );

                // No subscribers is fine.
                let _ = self.events.send(SeatClaimedEvent {
                    schedule_id: booking.schedule_id.0,
                    seat_number: booking.seat_number.clone(),
                    booking_id: booking.booking_id.0,
                    claimed_at: booking.booked_at,
                });

                Ok(booking)
            }
            ClaimOutcome::Conflict => {
                let request = attempt.request();
                warn!(
                    "Seat conflict: {} on schedule {} already reserved, rejecting {}",
                    request.seat_number,
                    schedule_id,
                    Masked(&request.customer_name)
                );
                Err(CoreError::SeatTaken {
                    schedule_id,
                    seat_number: request.seat_number.clone(),
                })
            }
        }
    }

    pub async fn reserved_seats(&self, schedule_id: ScheduleId) -> CoreResult<Vec<String>> {
        self.resolver.resolve(schedule_id).await?;
        self.ledger.reserved_seats(schedule_id).await
    }

    pub async fn seat_availability(&self, schedule_id: ScheduleId) -> CoreResult<SeatAvailability> {
        let seat_map = self.resolver.resolve(schedule_id).await?;
        let reserved: BTreeSet<String> = self.ledger.reserved_seats(schedule_id).await?.into_iter().collect();

        let seats = seat_map
            .iter()
            .map(|seat| {
                let status = if reserved.contains(&seat) {
                    SeatStatus::Booked
                } else {
                    SeatStatus::Available
                };
                (seat, status)
            })
            .collect();

        Ok(SeatAvailability { schedule_id, seats })
    }

    pub async fn get_booking(&self, booking_id: BookingId) -> CoreResult<Booking> {
        self.ledger
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryLedger;
    use chrono::{NaiveDate, NaiveDateTime};
    use seatline_catalog::InMemoryCatalog;
    use seatline_core::{
        CatalogRepository, NewFlightRoute, NewPlane, NewSchedule, PlaneId, Schedule,
    };

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    struct Fixture {
        catalog: Arc<InMemoryCatalog>,
        engine: Arc<SeatReservationEngine>,
        small: PlaneId,
        large: PlaneId,
        schedule: Schedule,
    }

    /// Boeing 737 (180) and Airbus A380 (550); AI101 DEL→BOM on the 737 with one schedule.
    async fn fixture() -> Fixture {
        let catalog = Arc::new(InMemoryCatalog::default());
        let small = catalog
            .create_plane(NewPlane { model: "Boeing 737".to_string(), total_seats: 180 })
            .await
            .unwrap();
        let large = catalog
            .create_plane(NewPlane { model: "Airbus A380".to_string(), total_seats: 550 })
            .await
            .unwrap();
        let route = catalog
            .create_flight_route(NewFlightRoute {
                flight_number: "AI101".to_string(),
                departure_airport: "DEL".to_string(),
                arrival_airport: "BOM".to_string(),
                plane_id: small.plane_id,
            })
            .await
            .unwrap();
        let schedule = catalog
            .create_schedule(
                NewSchedule {
                    flight_id: route.flight_id,
                    departure_time: at(2, 10),
                    arrival_time: at(2, 14),
                    base_price: 5500.0,
                },
                at(1, 0),
            )
            .await
            .unwrap();

        let resolver = SeatMapResolver::new(catalog.clone());
        let engine = Arc::new(SeatReservationEngine::new(resolver, Arc::new(InMemoryLedger::new()), 16));

        Fixture {
            catalog,
            engine,
            small: small.plane_id,
            large: large.plane_id,
            schedule,
        }
    }

    fn request(schedule_id: ScheduleId, seat: &str, customer: &str) -> NewBooking {
        NewBooking {
            schedule_id,
            seat_number: seat.to_string(),
            customer_name: customer.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reference_scenario() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;
        f.catalog.reassign_plane(f.schedule.flight_id, f.large).await.unwrap();

        let alice = f.engine.book(request(id, "A01", "Alice Smith")).await.unwrap();
        assert_eq!(alice.seat_number, "A01");

        let bob = f.engine.book(request(id, "A01", "Bob Johnson")).await;
        assert!(matches!(bob, Err(CoreError::SeatTaken { .. })));

        f.engine.book(request(id, "B02", "Charlie Brown")).await.unwrap();

        assert_eq!(f.engine.reserved_seats(id).await.unwrap(), vec!["A01", "B02"]);
        assert_eq!(f.engine.get_booking(alice.booking_id).await.unwrap().customer_name, "Alice Smith");
    }

    #[tokio::test]
    async fn test_seats_validated_against_snapshot_plane() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;
        f.catalog.reassign_plane(f.schedule.flight_id, f.large).await.unwrap();

        // Row 31 exists on the A380 but not on the 737 the schedule was created with.
        let result = f.engine.book(request(id, "A31", "Alice Smith")).await;
        assert!(matches!(result, Err(CoreError::Invalid(_))));

        let stored = f.catalog.get_schedule(id).await.unwrap().unwrap();
        assert_eq!(stored.plane_id, f.small);
        f.engine.book(request(id, "F30", "Alice Smith")).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;

        let malformed = f.engine.book(request(id, "a01", "Alice Smith")).await;
        assert!(matches!(malformed, Err(CoreError::Invalid(_))));

        let padded = f.engine.book(request(id, " A01 ", "Alice Smith")).await;
        assert!(matches!(padded, Err(CoreError::Invalid(_))));

        let nameless = f.engine.book(request(id, "A01", "  ")).await;
        assert!(matches!(nameless, Err(CoreError::Invalid(_))));

        let unknown = f.engine.book(request(ScheduleId(404), "A01", "Alice Smith")).await;
        assert!(matches!(unknown, Err(CoreError::NotFound(_))));

        let missing = f.engine.get_booking(BookingId(404)).await;
        assert!(matches!(missing, Err(CoreError::NotFound(_))));

        assert!(f.engine.reserved_seats(id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_race_for_one_seat_has_single_winner() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;
        let mut handles = Vec::new();

        for i in 0..50 {
            let engine = f.engine.clone();
            handles.push(tokio::spawn(async move {
                engine.book(request(id, "C10", &format!("Customer {}", i))).await
            }));
        }

        let mut winners = 0;
        let mut taken = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(CoreError::SeatTaken { .. }) => taken += 1,
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(taken, 49);
        assert_eq!(f.engine.reserved_seats(id).await.unwrap(), vec!["C10"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_distinct_seats_never_fail_each_other() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;
        let mut handles = Vec::new();

        for index in 0..180 {
            let engine = f.engine.clone();
            handles.push(tokio::spawn(async move {
                let seat = seatline_core::SeatMap::label(index);
                engine.book(request(id, &seat, "Charlie Brown")).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let availability = f.engine.seat_availability(id).await.unwrap();
        assert_eq!(availability.seats.len(), 180);
        assert!(availability.seats.values().all(|s| *s == SeatStatus::Booked));
    }

    #[tokio::test]
    async fn test_seat_availability_and_events() {
        let f = fixture().await;
        let id = f.schedule.schedule_id;
        let mut events = f.engine.subscribe();

        let booking = f.engine.book(request(id, "B02", "Charlie Brown")).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.schedule_id, id.0);
        assert_eq!(event.seat_number, "B02");
        assert_eq!(event.booking_id, booking.booking_id.0);

        let availability = f.engine.seat_availability(id).await.unwrap();
        assert_eq!(availability.seats.get("B02"), Some(&SeatStatus::Booked));
        assert_eq!(availability.seats.get("A01"), Some(&SeatStatus::Available));
        assert_eq!(availability.seats.len(), 180);

        let json = serde_json::to_value(&availability).unwrap();
        assert_eq!(json["seats"]["B02"], "BOOKED");
    }
}
