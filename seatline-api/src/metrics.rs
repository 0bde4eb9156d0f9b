use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramTimer, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::AppError;
use crate::state::AppState;

pub struct Metrics {
    registry: Registry,
    booking_attempts: IntCounterVec,
    claim_duration: Histogram,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let booking_attempts = IntCounterVec::new(
            Opts::new("seatline_booking_attempts_total", "Booking attempts by outcome"),
            &["outcome"],
        )?;
        let claim_duration = Histogram::with_opts(HistogramOpts::new(
            "seatline_claim_duration_seconds",
            "Time spent validating and claiming a seat",
        ))?;

        registry.register(Box::new(booking_attempts.clone()))?;
        registry.register(Box::new(claim_duration.clone()))?;

        Ok(Self {
            registry,
            booking_attempts,
            claim_duration,
        })
    }

    pub fn record_attempt(&self, outcome: &str) {
        self.booking_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn attempts(&self, outcome: &str) -> u64 {
        self.booking_attempts.with_label_values(&[outcome]).get()
    }

    /// Observes on drop.
    pub fn claim_timer(&self) -> HistogramTimer {
        self.claim_duration.start_timer()
    }

    pub fn render(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::InternalServerError(format!("Metrics are not UTF-8: {}", e)))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
