// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::DigestJob;

/// Spawn a loop that runs `job` every `interval`. The first run happens one full
/// interval after spawning; runs never overlap because each tick awaits the previous run.
pub fn spawn_digest_scheduler(job: Arc<dyn DigestJob>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("digest_scheduler_ticks_total").increment(1);
            match job.run().await {
                Ok(outcome) => tracing::info!(
                    target: "scheduler",
                    distributed = outcome.distributed(),
                    "scheduled run finished"
                ),
                Err(failure) => tracing::error!(
                    target: "scheduler",
                    error = %failure,
                    notified = failure.notified,
                    "scheduled run failed"
                ),
            }
        }
    })
}
