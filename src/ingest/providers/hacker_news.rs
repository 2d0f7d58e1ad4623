// src/ingest/providers/hacker_news.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use std::time::Duration;

use crate::ingest::types::{RawCandidate, SourceClient};

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Hacker News Firebase API. Public, no credentials.
pub struct HackerNewsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HackerNewsClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (local mirror, test server).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("tech-news-digest/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building hacker news http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{id}.json", self.base_url)
    }
}

#[async_trait]
impl SourceClient for HackerNewsClient {
    async fn fetch_top_ids(&self) -> Result<Vec<u64>> {
        let t0 = std::time::Instant::now();
        let ids: Vec<u64> = self
            .http
            .get(format!("{}/topstories.json", self.base_url))
            .send()
            .await
            .context("fetch topstories")?
            .error_for_status()
            .context("topstories non-2xx")?
            .json()
            .await
            .context("parse topstories")?;
        histogram!("digest_source_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(target: "ingest", count = ids.len(), "fetched top story ids");
        Ok(ids)
    }

    async fn fetch_one(&self, id: u64) -> Result<RawCandidate> {
        // The API answers `null` for ids it does not know.
        let item: Option<RawCandidate> = self
            .http
            .get(self.item_url(id))
            .send()
            .await
            .with_context(|| format!("fetch item {id}"))?
            .error_for_status()
            .with_context(|| format!("item {id} non-2xx"))?
            .json()
            .await
            .with_context(|| format!("parse item {id}"))?;
        item.ok_or_else(|| anyhow!("item {id} not found"))
    }

    fn name(&self) -> &'static str {
        "HackerNews"
    }
}
