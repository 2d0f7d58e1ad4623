//! Schema gate between the source and the language model.
//!
//! Every candidate is checked on its own. A bad one is logged and dropped, never repaired,
//! and the call itself cannot fail.

use metrics::counter;
use serde::Serialize;
use url::Url;

use crate::error::ItemError;
use crate::ingest::types::RawCandidate;

/// A candidate whose every field met the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedItem {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub score: u64,
    pub time: i64,
    pub author: String,
    pub kind: String,
}

pub fn validate(items: Vec<RawCandidate>) -> Vec<ValidatedItem> {
    let total = items.len();
    let mut out = Vec::with_capacity(total);
    for raw in items {
        match validate_one(raw) {
            Ok(item) => out.push(item),
            Err(e) => {
                tracing::warn!(target: "validate", stage = "validating", error = %e, "dropping candidate");
                counter!("digest_rejected_total").increment(1);
            }
        }
    }
    counter!("digest_validated_total").increment(out.len() as u64);
    tracing::info!(target: "validate", kept = out.len(), total, "validated candidates");
    out
}

pub fn validate_one(raw: RawCandidate) -> Result<ValidatedItem, ItemError> {
    let id = raw.id;
    let reject = |reason: &str| ItemError::Schema {
        id,
        reason: reason.to_string(),
    };

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| reject("empty or missing title"))?;
    if let Some(u) = raw.url.as_deref() {
        Url::parse(u).map_err(|e| reject(&format!("malformed url: {e}")))?;
    }
    let score = raw.score.ok_or_else(|| reject("missing score"))?;
    let score = u64::try_from(score).map_err(|_| reject("negative score"))?;
    let time = raw.time.ok_or_else(|| reject("missing time"))?;
    let author = raw
        .author
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| reject("empty or missing author"))?;
    let kind = raw.kind.ok_or_else(|| reject("missing type"))?;

    Ok(ValidatedItem {
        id,
        title,
        url: raw.url,
        text: raw.text,
        score,
        time,
        author,
        kind,
    })
}
