pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod redis_repo;

pub use app_config::{CatalogBackend, Config, LedgerBackend};
pub use booking_repo::PgReservationLedger;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use redis_repo::RedisLedger;
