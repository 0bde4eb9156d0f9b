use anyhow::Context;
use seatline_catalog::{InMemoryCatalog, SeatMapResolver};
use seatline_core::{CatalogRepository, ReservationLedger};
use seatline_reservation::{InMemoryLedger, SeatReservationEngine};
use seatline_store::app_config::BusinessRules;
use seatline_store::{
    CatalogBackend, Config, DbClient, LedgerBackend, PgCatalogRepository, PgReservationLedger,
    RedisLedger,
};
use std::sync::Arc;
use tracing::info;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub engine: Arc<SeatReservationEngine>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn ReservationLedger>,
        rules: &BusinessRules,
    ) -> anyhow::Result<Self> {
        let resolver = SeatMapResolver::new(catalog.clone());
        let engine = SeatReservationEngine::new(resolver, ledger, rules.event_buffer);
        let metrics = Metrics::new().context("Failed to register metrics")?;

        Ok(Self {
            catalog,
            engine: Arc::new(engine),
            metrics: Arc::new(metrics),
        })
    }

    /// Catalog and ledger both in process memory.
    pub fn in_memory(rules: &BusinessRules) -> anyhow::Result<Self> {
        Self::new(
            Arc::new(InMemoryCatalog::new(rules.catalog_policy())),
            Arc::new(InMemoryLedger::new()),
            rules,
        )
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.storage.validate().context("Unsupported storage combination")?;

        let db = if config.storage.needs_postgres() {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Some(db)
        } else {
            None
        };

        let catalog: Arc<dyn CatalogRepository> = match (config.storage.catalog, &db) {
            (CatalogBackend::Postgres, Some(db)) => Arc::new(PgCatalogRepository::new(
                db.pool.clone(),
                config.business_rules.catalog_policy(),
            )),
            _ => Arc::new(InMemoryCatalog::new(config.business_rules.catalog_policy())),
        };

        let ledger: Arc<dyn ReservationLedger> = match (config.storage.ledger, &db) {
            (LedgerBackend::Postgres, Some(db)) => Arc::new(PgReservationLedger::new(db.pool.clone())),
            (LedgerBackend::Redis, _) => Arc::new(
                RedisLedger::new(&config.redis.url)
                    .await
                    .context("Failed to connect to Redis")?,
            ),
            _ => Arc::new(InMemoryLedger::new()),
        };

        info!(
            "Storage: catalog={:?}, ledger={:?}",
            config.storage.catalog, config.storage.ledger
        );
        Self::new(catalog, ledger, &config.business_rules)
    }
}
