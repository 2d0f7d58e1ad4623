// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::error::{ItemError, PipelineError};
use crate::ingest::types::{RawCandidate, SourceClient};
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Only this source category is digested; comments, jobs and polls are skipped.
pub const STORY_KIND: &str = "story";

/// Fetch the top `limit` items concurrently.
///
/// A failed item fetch drops that item only. Failing to get the id list fails the run.
/// Survivors are ordered by score, best first; equal scores keep the source's ranking.
pub async fn collect_top(
    source: &Arc<dyn SourceClient>,
    limit: usize,
) -> Result<Vec<RawCandidate>, PipelineError> {
    let ids = source
        .fetch_top_ids()
        .await
        .map_err(PipelineError::Source)?;
    tracing::info!(
        target: "ingest",
        provider = source.name(),
        available = ids.len(),
        limit,
        "fetched top ids"
    );

    let mut set = JoinSet::new();
    for (rank, id) in ids.into_iter().take(limit).enumerate() {
        let src = Arc::clone(source);
        set.spawn(async move {
            let res = src.fetch_one(id).await.map_err(|e| ItemError::Fetch {
                id,
                reason: format!("{e:#}"),
            });
            (rank, res)
        });
    }

    let mut kept: Vec<(usize, RawCandidate)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (rank, res) = match joined {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(target: "ingest", error = %e, "fetch task aborted");
                continue;
            }
        };
        match res {
            Ok(item) if item.kind.as_deref() == Some(STORY_KIND) => kept.push((rank, item)),
            Ok(item) => {
                tracing::debug!(
                    target: "ingest",
                    item_id = item.id,
                    kind = ?item.kind,
                    "skipping non-story item"
                );
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, "item fetch failed");
                counter!("digest_fetch_errors_total").increment(1);
            }
        }
    }

    kept.sort_by(|(ra, a), (rb, b)| {
        b.score
            .unwrap_or(0)
            .cmp(&a.score.unwrap_or(0))
            .then(ra.cmp(rb))
    });
    counter!("digest_candidates_total").increment(kept.len() as u64);
    tracing::info!(target: "ingest", collected = kept.len(), "collected candidates");
    Ok(kept.into_iter().map(|(_, c)| c).collect())
}
