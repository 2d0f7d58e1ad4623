//! Tech news digest service, binary entrypoint.
//! Boots the Axum HTTP server with the trigger routes and, when configured,
//! the interval scheduler and the Prometheus endpoint.

use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tech_news_digest::{
    api::{self, AppState},
    config::AgentConfig,
    init_tracing,
    metrics::Metrics,
    scheduler::spawn_digest_scheduler,
};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AgentConfig::from_env();
    let (interval_secs, metrics_enabled) = match &cfg {
        Ok(c) => (c.interval_secs, c.metrics_enabled),
        Err(_) => (None, false),
    };

    // Missing configuration still serves /api/test and reports 500 on triggers.
    let state = AppState::from_config(cfg);

    if let (Some(secs), Some(job)) = (interval_secs, state.job()) {
        tracing::info!(target: "scheduler", interval_secs = secs, "interval scheduler enabled");
        spawn_digest_scheduler(job, Duration::from_secs(secs));
    }

    let mut router = api::router(state);
    if metrics_enabled {
        let metrics = Metrics::init()?;
        router = router.merge(metrics.router());
    }

    Ok(router.into())
}
