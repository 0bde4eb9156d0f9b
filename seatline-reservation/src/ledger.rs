use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use seatline_core::{
    Booking, BookingId, ClaimOutcome, CoreResult, NewBooking, ReservationLedger, ScheduleId,
};
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory reservation ledger.
///
/// Seats are keyed by `(schedule, seat)` in a sharded map. A claim is the
/// vacant-entry insert under that key's shard lock, so two claimants of the
/// same seat serialize while unrelated seats proceed in parallel.
pub struct InMemoryLedger {
    seats: DashMap<(ScheduleId, String), BookingId>,
    bookings: DashMap<BookingId, Booking>,
    last_booking_id: AtomicI64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            seats: DashMap::new(),
            bookings: DashMap::new(),
            last_booking_id: AtomicI64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn try_claim(&self, booking: NewBooking) -> CoreResult<ClaimOutcome> {
        let key = (booking.schedule_id, booking.seat_number.clone());

        match self.seats.entry(key) {
            Entry::Occupied(_) => Ok(ClaimOutcome::Conflict),
            Entry::Vacant(slot) => {
                let booking_id = BookingId(self.last_booking_id.fetch_add(1, Ordering::SeqCst) + 1);
                let committed = booking.commit(booking_id, Utc::now());
                // Nobody holds the id yet, so publishing the record first is unobservable.
                self.bookings.insert(booking_id, committed.clone());
                slot.insert(booking_id);
                Ok(ClaimOutcome::Committed(committed))
            }
        }
    }

    async fn reserved_seats(&self, schedule_id: ScheduleId) -> CoreResult<Vec<String>> {
        let mut seats: Vec<String> = self
            .seats
            .iter()
            .filter(|entry| entry.key().0 == schedule_id)
            .map(|entry| entry.key().1.clone())
            .collect();
        seats.sort();
        Ok(seats)
    }

    async fn get_booking(&self, id: BookingId) -> CoreResult<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request(schedule: i64, seat: &str, customer: &str) -> NewBooking {
        NewBooking {
            schedule_id: ScheduleId(schedule),
            seat_number: seat.to_string(),
            customer_name: customer.to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_claim_on_same_seat_conflicts() {
        let ledger = InMemoryLedger::new();

        let first = ledger.try_claim(request(1, "A01", "Alice Smith")).await.unwrap();
        let booking = match first {
            ClaimOutcome::Committed(booking) => booking,
            ClaimOutcome::Conflict => panic!("first claim must commit"),
        };
        assert_eq!(booking.booking_id, BookingId(1));

        let second = ledger.try_claim(request(1, "A01", "Bob Johnson")).await.unwrap();
        assert_eq!(second, ClaimOutcome::Conflict);

        let stored = ledger.get_booking(booking.booking_id).await.unwrap().unwrap();
        assert_eq!(stored.customer_name, "Alice Smith");
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_same_seat_on_other_schedule_is_independent() {
        let ledger = InMemoryLedger::new();
        ledger.try_claim(request(1, "A01", "Alice Smith")).await.unwrap();

        let other = ledger.try_claim(request(2, "A01", "Bob Johnson")).await.unwrap();
        assert!(matches!(other, ClaimOutcome::Committed(_)));

        assert_eq!(ledger.reserved_seats(ScheduleId(1)).await.unwrap(), vec!["A01"]);
        assert_eq!(ledger.reserved_seats(ScheduleId(2)).await.unwrap(), vec!["A01"]);
        assert!(ledger.reserved_seats(ScheduleId(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_booking_ids_increase() {
        let ledger = InMemoryLedger::new();
        let mut last = 0;
        for seat in ["C01", "A01", "B02"] {
            match ledger.try_claim(request(1, seat, "Charlie Brown")).await.unwrap() {
                ClaimOutcome::Committed(booking) => {
                    assert!(booking.booking_id.0 > last);
                    last = booking.booking_id.0;
                }
                ClaimOutcome::Conflict => panic!("distinct seats must commit"),
            }
        }
        assert_eq!(
            ledger.reserved_seats(ScheduleId(1)).await.unwrap(),
            vec!["A01", "B02", "C01"]
        );
        assert!(ledger.get_booking(BookingId(99)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_commit_exactly_once() {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut handles = Vec::new();

        for i in 0..64 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .try_claim(request(1, "A01", &format!("customer-{}", i)))
                    .await
                    .unwrap()
            }));
        }

        let mut committed = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), ClaimOutcome::Committed(_)) {
                committed += 1;
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(ledger.len(), 1);
    }
}
