// tests/common/mod.rs
//
// In-memory stand-ins for the three outside services the pipeline talks to.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use tech_news_digest::analyze::{CompletionOptions, LanguageModel};
use tech_news_digest::analyze::Analyzer;
use tech_news_digest::ingest::types::{RawCandidate, SourceClient};
use tech_news_digest::notify::distributor::ALERT_PREFIX;
use tech_news_digest::notify::{ChatClient, Distributor, SendOptions};
use tech_news_digest::NewsAgent;

pub const CHAT_ID: &str = "chat-42";

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(9, 15, 0))
        .expect("valid fixed time")
}

pub fn story(id: u64, title: &str, score: i64) -> RawCandidate {
    RawCandidate {
        id,
        title: Some(title.to_string()),
        url: Some(format!("https://news.example/{id}")),
        text: None,
        score: Some(score),
        time: Some(1_760_000_000),
        author: Some("alice".into()),
        kind: Some("story".into()),
    }
}

// ---------------- source ----------------

#[derive(Default)]
pub struct StubSource {
    pub items: Vec<RawCandidate>,
    pub fail_ids: bool,
}

impl StubSource {
    pub fn with(items: Vec<RawCandidate>) -> Self {
        Self {
            items,
            fail_ids: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            items: Vec::new(),
            fail_ids: true,
        }
    }
}

#[async_trait::async_trait]
impl SourceClient for StubSource {
    async fn fetch_top_ids(&self) -> Result<Vec<u64>> {
        if self.fail_ids {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.items.iter().map(|c| c.id).collect())
    }

    async fn fetch_one(&self, id: u64) -> Result<RawCandidate> {
        self.items
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("item {id} not found"))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// ---------------- model ----------------

/// Answers by item title. Titles without a scripted answer get a transport error.
/// A title with a delay sleeps on the tokio clock before answering.
#[derive(Default)]
pub struct ScriptedModel {
    answers: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    pub calls: AtomicU32,
    pub seen_opts: Mutex<Vec<CompletionOptions>>,
}

impl ScriptedModel {
    pub fn answer(mut self, title: &str, raw: &str) -> Self {
        self.answers.insert(title.to_string(), raw.to_string());
        self
    }

    pub fn delay(mut self, title: &str, by: Duration) -> Self {
        self.delays.insert(title.to_string(), by);
        self
    }
}

pub fn annotation_json(summary: &str, relevance: i64, impact: &str) -> String {
    serde_json::json!({ "summary": summary, "relevance": relevance, "impact": impact }).to_string()
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, opts: CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_opts.lock().push(opts);
        let title = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Title: "))
            .unwrap_or_default();
        if let Some(by) = self.delays.get(title) {
            tokio::time::sleep(*by).await;
        }
        self.answers
            .get(title)
            .cloned()
            .ok_or_else(|| anyhow!("model unavailable"))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------- chat ----------------

#[derive(Debug, Clone)]
pub struct Sent {
    pub chat_id: String,
    pub text: String,
    pub opts: SendOptions,
}

impl Sent {
    pub fn is_alert(&self) -> bool {
        self.text.starts_with(ALERT_PREFIX)
    }
}

/// Records successful sends. Digest sends fail while `digest_failures` is positive;
/// alerts fail when `fail_alerts` is set.
#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<Sent>>,
    pub attempts: AtomicU32,
    digest_failures: AtomicU32,
    fail_alerts: bool,
}

impl RecordingChat {
    pub fn failing_digests(n: u32) -> Self {
        Self {
            digest_failures: AtomicU32::new(n),
            ..Default::default()
        }
    }

    pub fn failing_alerts() -> Self {
        Self {
            fail_alerts: true,
            ..Default::default()
        }
    }

    pub fn digests(&self) -> Vec<Sent> {
        self.sent.lock().iter().filter(|s| !s.is_alert()).cloned().collect()
    }

    pub fn alerts(&self) -> Vec<Sent> {
        self.sent.lock().iter().filter(|s| s.is_alert()).cloned().collect()
    }
}

#[async_trait::async_trait]
impl ChatClient for RecordingChat {
    async fn send(&self, chat_id: &str, text: &str, opts: SendOptions) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let alert = text.starts_with(ALERT_PREFIX);
        if alert && self.fail_alerts {
            return Err(anyhow!("alert channel down"));
        }
        if !alert {
            let left = self.digest_failures.load(Ordering::SeqCst);
            if left > 0 {
                self.digest_failures.store(left - 1, Ordering::SeqCst);
                return Err(anyhow!("telegram 502"));
            }
        }
        self.sent.lock().push(Sent {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            opts,
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ---------------- wiring ----------------

pub fn agent(source: StubSource, model: ScriptedModel, chat: Arc<RecordingChat>) -> NewsAgent {
    agent_with_limit(source, model, chat, 10)
}

pub fn agent_with_limit(
    source: StubSource,
    model: ScriptedModel,
    chat: Arc<RecordingChat>,
    limit: usize,
) -> NewsAgent {
    let distributor = Distributor::new(chat, CHAT_ID.to_string());
    NewsAgent::new(
        Arc::new(source),
        Analyzer::new(Arc::new(model)),
        distributor,
        limit,
    )
    .with_clock(fixed_now)
}
