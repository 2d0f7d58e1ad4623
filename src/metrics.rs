use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        describe_pipeline_metrics();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time registration so every series shows up on /metrics before its first sample.
pub fn describe_pipeline_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_candidates_total", "Stories collected from the source.");
        describe_counter!("digest_fetch_errors_total", "Item fetches that failed.");
        describe_counter!("digest_validated_total", "Candidates that passed validation.");
        describe_counter!("digest_rejected_total", "Candidates dropped by validation.");
        describe_counter!("digest_annotated_total", "Items annotated by the model.");
        describe_counter!(
            "digest_analysis_failures_total",
            "Items whose model call or response failed."
        );
        describe_counter!("digest_delivery_attempts_total", "Chat send attempts for digests.");
        describe_counter!("digest_alerts_total", "Operator alerts, by result.");
        describe_counter!("digest_runs_total", "Pipeline runs, by outcome.");
        describe_counter!("digest_scheduler_ticks_total", "Interval scheduler ticks.");
        describe_histogram!("digest_run_duration_ms", "Wall time of one pipeline run.");
        describe_histogram!("digest_source_fetch_ms", "Time to fetch the top id list.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the pipeline last finished.");
    });
}
