use chrono::{DateTime, Utc};

/// Published once per committed booking, after the ledger accepted the claim.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeatClaimedEvent {
    pub schedule_id: i64,
    pub seat_number: String,
    pub booking_id: i64,
    pub claimed_at: DateTime<Utc>,
}

impl SeatClaimedEvent {
    pub fn belongs_to(&self, schedule_id: i64) -> bool {
        self.schedule_id == schedule_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_uses_camel_case_keys() {
        let event = SeatClaimedEvent {
            schedule_id: 7,
            seat_number: "A01".to_string(),
            booking_id: 42,
            claimed_at: Utc::now(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["scheduleId"], 7);
        assert_eq!(value["seatNumber"], "A01");
        assert_eq!(value["bookingId"], 42);
        assert!(value.get("claimedAt").is_some());

        assert!(event.belongs_to(7));
        assert!(!event.belongs_to(8));
    }
}
