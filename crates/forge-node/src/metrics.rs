//! Prometheus metrics (supplements S-2, S-3 of SPEC_FULL.md), grounded on
//! the pack's `setup_prometheus`-style registration helpers.

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry};

pub struct ProposerMetrics {
    pub registry: Registry,

    /// S-2: circuit-breaker observability.
    pub builder_circuit_broken: IntGauge,
    pub builder_consecutive_misses: IntGauge,
    pub builder_epoch_misses: IntGauge,
    pub builder_errors_total: IntCounter,

    /// S-3: per-stage proposal timing.
    pub proposal_stage_seconds: HistogramVec,

    pub payload_winner_local_total: IntCounter,
    pub payload_winner_builder_total: IntCounter,
    pub payload_fallback_to_local_total: IntCounter,
}

fn register_int_gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    let gauge = IntGauge::with_opts(Opts::new(name, help)).unwrap();
    registry.register(Box::new(gauge.clone())).unwrap();
    gauge
}

fn register_int_counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::with_opts(Opts::new(name, help)).unwrap();
    registry.register(Box::new(counter.clone())).unwrap();
    counter
}

impl ProposerMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proposal_stage_seconds = HistogramVec::new(
            HistogramOpts::new(
                "forge_proposal_stage_seconds",
                "Wall-clock duration of each proposal-construction stage",
            ),
            &["stage"],
        )
        .unwrap();
        registry
            .register(Box::new(proposal_stage_seconds.clone()))
            .unwrap();

        Self {
            builder_circuit_broken: register_int_gauge(
                &registry,
                "forge_builder_circuit_broken",
                "1 if the builder circuit breaker is currently tripped, else 0",
            ),
            builder_consecutive_misses: register_int_gauge(
                &registry,
                "forge_builder_consecutive_misses",
                "Consecutive missed slots observed ending at slot-1",
            ),
            builder_epoch_misses: register_int_gauge(
                &registry,
                "forge_builder_epoch_misses",
                "Missed slots observed within the trailing epoch window",
            ),
            builder_errors_total: register_int_counter(
                &registry,
                "forge_builder_errors_total",
                "Builder requests that were demoted to \"no bid\"",
            ),
            proposal_stage_seconds,
            payload_winner_local_total: register_int_counter(
                &registry,
                "forge_payload_winner_local_total",
                "Proposals where the locally-built payload won",
            ),
            payload_winner_builder_total: register_int_counter(
                &registry,
                "forge_payload_winner_builder_total",
                "Proposals where the builder's payload won",
            ),
            payload_fallback_to_local_total: register_int_counter(
                &registry,
                "forge_payload_fallback_to_local_total",
                "Proposals where the builder payload was chosen but failed to set, forcing a local fallback",
            ),
            registry,
        }
    }

    pub fn observe_stage(&self, stage: &str, seconds: f64) {
        self.proposal_stage_seconds.with_label_values(&[stage]).observe(seconds);
    }
}

impl Default for ProposerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op timer guard: records the elapsed wall time into `histogram` for
/// `stage` when dropped, so callers can just `let _t = metrics.timer("c6");`
/// at the top of a scope.
pub struct StageTimer<'a> {
    metrics: &'a ProposerMetrics,
    stage: &'static str,
    started: std::time::Instant,
}

impl ProposerMetrics {
    pub fn timer(&self, stage: &'static str) -> StageTimer<'_> {
        StageTimer {
            metrics: self,
            stage,
            started: std::time::Instant::now(),
        }
    }
}

impl Drop for StageTimer<'_> {
    fn drop(&mut self) {
        self.metrics.observe_stage(self.stage, self.started.elapsed().as_secs_f64());
    }
}
