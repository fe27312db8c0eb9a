//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `elosya_engagement_events_total{kind}` - Accepted engagement transitions
//! - `elosya_payouts_total{source}` - Threshold payouts and coin credits
//! - `elosya_coin_gifts_rejected_total` - Coin sends refused by the engine
//! - `elosya_apply_duration_seconds` - Load + decide + commit latency

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Owns its registry so several ledgers can live in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Accepted engagement transitions, by kind
    pub engagement_events: IntCounterVec,

    /// Credits paid to creators, by source
    pub payouts: IntCounterVec,

    /// Coin gifts refused by the engine
    pub coin_gifts_rejected: IntCounter,

    /// Apply duration histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let engagement_events = IntCounterVec::new(
            Opts::new(
                "elosya_engagement_events_total",
                "Accepted engagement transitions",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(engagement_events.clone()))?;

        let payouts = IntCounterVec::new(
            Opts::new("elosya_payouts_total", "Credits paid to creators"),
            &["source"],
        )?;
        registry.register(Box::new(payouts.clone()))?;

        let coin_gifts_rejected = IntCounter::new(
            "elosya_coin_gifts_rejected_total",
            "Coin gifts refused by the engine",
        )?;
        registry.register(Box::new(coin_gifts_rejected.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new(
                "elosya_apply_duration_seconds",
                "Histogram of load, decide and commit latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            engagement_events,
            payouts,
            coin_gifts_rejected,
            apply_duration,
            registry,
        })
    }

    /// Record an accepted engagement transition
    pub fn record_engagement(&self, kind: &str) {
        self.engagement_events.with_label_values(&[kind]).inc();
    }

    /// Record a credit paid to a creator
    pub fn record_payout(&self, source: &str) {
        self.payouts.with_label_values(&[source]).inc();
    }

    /// Record a refused coin gift
    pub fn record_coin_gift_rejected(&self) {
        self.coin_gifts_rejected.inc();
    }

    /// Record apply duration
    pub fn record_apply_duration(&self, duration_seconds: f64) {
        self.apply_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("coin_gifts_rejected", &self.coin_gifts_rejected.get())
            .finish_non_exhaustive()
    }
}
