//! Orchestrator: collect → validate → analyze → distribute.
//!
//! Stages run strictly one after another. An empty stage ends the run with one alert
//! and counts as a soft success. Any hard failure gets one best-effort alert and then
//! goes back to the caller unchanged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use chrono::NaiveDateTime;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tracing::Instrument;

use crate::analyze::ai_adapter::build_language_model;
use crate::analyze::Analyzer;
use crate::config::AgentConfig;
use crate::digest::compose;
use crate::error::{PipelineError, RunFailure};
use crate::ingest::providers::hacker_news::HackerNewsClient;
use crate::ingest::{collect_top, types::SourceClient};
use crate::notify::{ChatClient, Distributor, DryRunChat, TelegramClient};
use crate::validate::validate;

/// A stage whose output can come up empty and end the run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collecting,
    Validating,
    Analyzing,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Collecting => "collecting",
            Stage::Validating => "validating",
            Stage::Analyzing => "analyzing",
        }
    }

    /// Alert text when this stage hands over nothing.
    pub fn empty_message(self) -> &'static str {
        match self {
            Stage::Collecting => "No items were collected from the news source",
            Stage::Validating => "No items passed validation, all collected news items were malformed",
            Stage::Analyzing => "No items survived analysis, check language model connectivity",
        }
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Distributed { count: usize },
    /// Soft success: `stage` produced nothing, the run stopped after alerting.
    Empty { stage: Stage, notified: bool },
}

impl RunOutcome {
    pub fn distributed(&self) -> usize {
        match self {
            RunOutcome::Distributed { count } => *count,
            RunOutcome::Empty { .. } => 0,
        }
    }
}

/// One pipeline pass. The HTTP trigger and the scheduler only see this.
#[async_trait::async_trait]
pub trait DigestJob: Send + Sync {
    async fn run(&self) -> Result<RunOutcome, RunFailure>;
}

pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[derive(Clone)]
pub struct NewsAgent {
    source: Arc<dyn SourceClient>,
    analyzer: Analyzer,
    distributor: Distributor,
    news_limit: usize,
    clock: Clock,
}

impl NewsAgent {
    pub fn new(
        source: Arc<dyn SourceClient>,
        analyzer: Analyzer,
        distributor: Distributor,
        news_limit: usize,
    ) -> Self {
        Self {
            source,
            analyzer,
            distributor,
            news_limit,
            clock: local_now,
        }
    }

    /// Wire the production clients. Each gets its own credential from `cfg`.
    pub fn from_config(cfg: &AgentConfig) -> anyhow::Result<Self> {
        let source: Arc<dyn SourceClient> = Arc::new(HackerNewsClient::new()?);
        let model = build_language_model(cfg)?;
        let chat: Arc<dyn ChatClient> = if cfg.dry_run {
            Arc::new(DryRunChat)
        } else {
            Arc::new(TelegramClient::new(cfg.telegram_bot_token.clone()))
        };
        let distributor = Distributor::new(chat, cfg.telegram_chat_id.clone())
            .with_base_delay(Duration::from_millis(cfg.retry_base_delay_ms));
        tracing::info!(
            target: "pipeline",
            provider = model.name(),
            news_limit = cfg.news_limit,
            dry_run = cfg.dry_run,
            "news agent initialized"
        );
        Ok(Self::new(source, Analyzer::new(model), distributor, cfg.news_limit))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run the pipeline once.
    pub async fn execute(&self) -> Result<RunOutcome, RunFailure> {
        crate::metrics::describe_pipeline_metrics();
        let run_id = chrono::Utc::now().timestamp_millis();
        let span = tracing::info_span!("run", run_id);
        let t0 = Instant::now();

        // Own task so a panic anywhere in the stages still becomes a reported failure.
        let this = self.clone();
        let joined = tokio::spawn(async move { this.stages().await }.instrument(span.clone())).await;
        let result = match joined {
            Ok(r) => r,
            Err(e) => Err(PipelineError::Unexpected(anyhow!("pipeline task failed: {e}"))),
        };

        histogram!("digest_run_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("digest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        async move {
            match result {
                Ok(outcome) => {
                    let label = match outcome {
                        RunOutcome::Distributed { .. } => "distributed",
                        RunOutcome::Empty { .. } => "empty",
                    };
                    counter!("digest_runs_total", "outcome" => label).increment(1);
                    tracing::info!(target: "pipeline", ?outcome, "run finished");
                    Ok(outcome)
                }
                Err(error) => {
                    counter!("digest_runs_total", "outcome" => "failed").increment(1);
                    tracing::error!(
                        target: "pipeline",
                        kind = error.kind(),
                        error = %error,
                        "news agent execution failed"
                    );
                    let notified = self
                        .distributor
                        .notify_error(&format!("NewsAgent execution failed: {error}"))
                        .await;
                    Err(RunFailure { error, notified })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn stages(&self) -> Result<RunOutcome, PipelineError> {
        tracing::info!(target: "pipeline", stage = Stage::Collecting.as_str(), limit = self.news_limit, "collecting");
        let raw = collect_top(&self.source, self.news_limit).await?;
        if raw.is_empty() {
            return Ok(self.stop_empty(Stage::Collecting).await);
        }

        let valid = validate(raw);
        if valid.is_empty() {
            return Ok(self.stop_empty(Stage::Validating).await);
        }

        tracing::info!(target: "pipeline", stage = Stage::Analyzing.as_str(), items = valid.len(), "analyzing");
        let annotated = self.analyzer.analyze(valid).await;
        if annotated.is_empty() {
            return Ok(self.stop_empty(Stage::Analyzing).await);
        }

        let digest = compose(annotated, (self.clock)());
        tracing::info!(target: "pipeline", stage = "distributing", items = digest.len(), "distributing");
        self.distributor.distribute(&digest).await?;
        Ok(RunOutcome::Distributed {
            count: digest.len(),
        })
    }

    async fn stop_empty(&self, stage: Stage) -> RunOutcome {
        tracing::warn!(target: "pipeline", stage = stage.as_str(), "{}", stage.empty_message());
        let notified = self.distributor.notify_error(stage.empty_message()).await;
        RunOutcome::Empty { stage, notified }
    }
}

#[async_trait::async_trait]
impl DigestJob for NewsAgent {
    async fn run(&self) -> Result<RunOutcome, RunFailure> {
        self.execute().await
    }
}
