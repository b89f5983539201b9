//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `scoring_entries_total` - Ball entries accepted
//! - `scoring_rejections_total` - Mutating calls rejected before any write
//! - `scoring_consensus_total` - Balls verified by consensus
//! - `scoring_resolutions_total` - Disputes resolved by an official
//! - `scoring_open_disputes` - Ball keys currently disputed
//! - `scoring_audit_failures_total` - Audit writes that failed (best-effort)
//! - `scoring_submit_duration_seconds` - Histogram of submit latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Ball entries accepted
    pub entries_total: IntCounter,

    /// Mutating calls rejected before any write
    pub rejections_total: IntCounter,

    /// Balls verified by consensus
    pub consensus_total: IntCounter,

    /// Disputes resolved by an official
    pub resolutions_total: IntCounter,

    /// Ball keys currently disputed
    pub open_disputes: IntGauge,

    /// Audit writes that failed
    pub audit_failures_total: IntCounter,

    /// Submit latency histogram
    pub submit_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    ///
    /// Each collector owns its registry, so independent engine instances
    /// (and tests) do not collide on metric names.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let entries_total = IntCounter::new("scoring_entries_total", "Ball entries accepted")?;
        registry.register(Box::new(entries_total.clone()))?;

        let rejections_total = IntCounter::new(
            "scoring_rejections_total",
            "Mutating calls rejected before any write",
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let consensus_total =
            IntCounter::new("scoring_consensus_total", "Balls verified by consensus")?;
        registry.register(Box::new(consensus_total.clone()))?;

        let resolutions_total = IntCounter::new(
            "scoring_resolutions_total",
            "Disputes resolved by an official",
        )?;
        registry.register(Box::new(resolutions_total.clone()))?;

        let open_disputes = IntGauge::new("scoring_open_disputes", "Ball keys currently disputed")?;
        registry.register(Box::new(open_disputes.clone()))?;

        let audit_failures_total = IntCounter::new(
            "scoring_audit_failures_total",
            "Audit writes that failed (best-effort)",
        )?;
        registry.register(Box::new(audit_failures_total.clone()))?;

        let submit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "scoring_submit_duration_seconds",
                "Histogram of submit latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(submit_duration.clone()))?;

        Ok(Self {
            entries_total,
            rejections_total,
            consensus_total,
            resolutions_total,
            open_disputes,
            audit_failures_total,
            submit_duration,
            registry,
        })
    }

    /// Record an accepted entry
    pub fn record_entry(&self) {
        self.entries_total.inc();
    }

    /// Record a rejected mutating call
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record a ball verified by consensus
    pub fn record_consensus(&self) {
        self.consensus_total.inc();
    }

    /// Record a dispute resolution
    pub fn record_resolution(&self) {
        self.resolutions_total.inc();
    }

    /// Record a newly opened dispute
    pub fn record_dispute_opened(&self) {
        self.open_disputes.inc();
    }

    /// Record a dispute leaving the open set
    pub fn record_dispute_closed(&self) {
        self.open_disputes.dec();
    }

    /// Record a failed audit write
    pub fn record_audit_failure(&self) {
        self.audit_failures_total.inc();
    }

    /// Record submit latency
    pub fn record_submit_duration(&self, duration_seconds: f64) {
        self.submit_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.entries_total.get(), 0);
        assert_eq!(metrics.open_disputes.get(), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_entry();
        metrics.record_entry();
        metrics.record_consensus();
        assert_eq!(metrics.entries_total.get(), 2);
        assert_eq!(metrics.consensus_total.get(), 1);
    }

    #[test]
    fn test_dispute_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dispute_opened();
        metrics.record_dispute_opened();
        metrics.record_dispute_closed();
        assert_eq!(metrics.open_disputes.get(), 1);
    }
}
