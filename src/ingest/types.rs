// src/ingest/types.rs
use anyhow::Result;

/// One item exactly as the news source returned it. Nothing is trusted yet.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawCandidate {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    /// unix seconds
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default, rename = "by")]
    pub author: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    /// Ids of the current top items, best first.
    async fn fetch_top_ids(&self) -> Result<Vec<u64>>;
    async fn fetch_one(&self, id: u64) -> Result<RawCandidate>;
    fn name(&self) -> &'static str;
}
