use seatline_core::CatalogPolicy;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Memory,
    Postgres,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub catalog: CatalogBackend,
    pub ledger: LedgerBackend,
}

impl StorageConfig {
    pub fn needs_postgres(&self) -> bool {
        self.catalog == CatalogBackend::Postgres || self.ledger == LedgerBackend::Postgres
    }

    /// A durable ledger needs a durable catalog. Postgres bookings reference
    /// catalog rows, and Redis seat keys outlive in-memory schedule ids.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        match (self.catalog, self.ledger) {
            (CatalogBackend::Memory, LedgerBackend::Postgres | LedgerBackend::Redis) => {
                Err(config::ConfigError::Message(format!(
                    "storage.ledger = {:?} requires storage.catalog = postgres",
                    self.ledger
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_true")]
    pub reject_overlapping_schedules: bool,
    /// Capacity of the seat-claimed broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_true() -> bool {
    true
}

fn default_event_buffer() -> usize {
    256
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            reject_overlapping_schedules: default_true(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl BusinessRules {
    pub fn catalog_policy(&self) -> CatalogPolicy {
        CatalogPolicy {
            reject_overlapping_schedules: self.reject_overlapping_schedules,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. SEATLINE__STORAGE__LEDGER=redis
            .add_source(config::Environment::with_prefix("SEATLINE").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.storage.validate()?;
        Ok(config)
    }
}
