use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use super::{ChatClient, SendOptions};
use crate::digest::{sanitize, Digest};
use crate::error::PipelineError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const ALERT_PREFIX: &str = "⚠️ News Agent Alert:";

const DIGEST_OPTS: SendOptions = SendOptions {
    rich_formatting: true,
    link_preview: true,
};
const ALERT_OPTS: SendOptions = SendOptions {
    rich_formatting: true,
    link_preview: false,
};

/// Sends digests (with retry) and operator alerts (best effort) to one chat.
#[derive(Clone)]
pub struct Distributor {
    client: Arc<dyn ChatClient>,
    chat_id: String,
    max_attempts: u32,
    base_delay: Duration,
}

impl Distributor {
    pub fn new(client: Arc<dyn ChatClient>, chat_id: String) -> Self {
        Self {
            client,
            chat_id,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn with_retries(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Send the digest. Attempt `n` failing waits `n × base_delay` before the next one;
    /// sends are strictly sequential. The last error surfaces once attempts run out.
    pub async fn distribute(&self, digest: &Digest) -> Result<(), PipelineError> {
        let text = digest.render();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            counter!("digest_delivery_attempts_total").increment(1);
            match self.client.send(&self.chat_id, &text, DIGEST_OPTS).await {
                Ok(()) => {
                    tracing::info!(
                        target: "notify",
                        stage = "distributing",
                        attempt,
                        items = digest.len(),
                        transport = self.client.name(),
                        "digest delivered"
                    );
                    return Ok(());
                }
                Err(e) if attempt < self.max_attempts => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        target: "notify",
                        stage = "distributing",
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %format!("{e:#}"),
                        "delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    tracing::error!(
                        target: "notify",
                        stage = "distributing",
                        attempt,
                        error = %format!("{e:#}"),
                        "delivery failed, giving up"
                    );
                    return Err(PipelineError::Delivery {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    /// Wait after failed attempt `n`: `n × base_delay`, saturating.
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Post a short alert. Never fails: a send error is logged and reported as `false`,
    /// so the failure that triggered the alert is the one that propagates.
    pub async fn notify_error(&self, description: &str) -> bool {
        let text = format!("{ALERT_PREFIX}\n{}", sanitize(description));
        match self.client.send(&self.chat_id, &text, ALERT_OPTS).await {
            Ok(()) => {
                counter!("digest_alerts_total", "result" => "sent").increment(1);
                true
            }
            Err(e) => {
                tracing::error!(
                    target: "notify",
                    error = %format!("{e:#}"),
                    "failed to send error notification"
                );
                counter!("digest_alerts_total", "result" => "failed").increment(1);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::DryRunChat;

    #[test]
    fn backoff_grows_linearly() {
        let d = Distributor::new(Arc::new(DryRunChat), "c".into())
            .with_base_delay(Duration::from_millis(250));
        assert_eq!(d.backoff(1), Duration::from_millis(250));
        assert_eq!(d.backoff(3), Duration::from_millis(750));
    }

    #[test]
    fn huge_base_delay_saturates_instead_of_panicking() {
        let d = Distributor::new(Arc::new(DryRunChat), "c".into())
            .with_base_delay(Duration::MAX / 2);
        assert_eq!(d.backoff(3), Duration::MAX);
    }
}
