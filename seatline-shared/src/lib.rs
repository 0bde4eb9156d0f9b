pub mod models;
pub mod pii;

pub use models::events::SeatClaimedEvent;
pub use pii::Masked;
