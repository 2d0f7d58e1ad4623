// src/analyze/mod.rs
//! Analysis stage: one model call per item, all in flight at once, failures kept per item.

pub mod ai_adapter;
pub mod annotation;
pub mod prompt;

use metrics::counter;
use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::ItemError;
use crate::validate::ValidatedItem;

pub use crate::analyze::ai_adapter::{CompletionOptions, DynLanguageModel, LanguageModel};
pub use crate::analyze::annotation::{parse_annotation, Annotation};

/// A validated item plus its model annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedItem {
    #[serde(flatten)]
    pub item: ValidatedItem,
    pub summary: String,
    pub relevance: u8,
    pub impact: String,
}

impl AnnotatedItem {
    pub fn new(item: ValidatedItem, a: Annotation) -> Self {
        Self {
            item,
            summary: a.summary,
            relevance: a.relevance,
            impact: a.impact,
        }
    }
}

#[derive(Clone)]
pub struct Analyzer {
    model: DynLanguageModel,
    opts: CompletionOptions,
}

impl Analyzer {
    pub fn new(model: DynLanguageModel) -> Self {
        Self {
            model,
            opts: CompletionOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: CompletionOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Annotate every item concurrently. Survivors keep their input order, so ties
    /// downstream still fall back to source ranking. An empty result means nothing survived.
    pub async fn analyze(&self, items: Vec<ValidatedItem>) -> Vec<AnnotatedItem> {
        let total = items.len();
        let mut set = JoinSet::new();
        for (idx, item) in items.into_iter().enumerate() {
            let model = self.model.clone();
            let opts = self.opts;
            set.spawn(async move {
                let id = item.id;
                (idx, id, annotate_one(model.as_ref(), item, opts).await)
            });
        }

        let mut done: Vec<(usize, AnnotatedItem)> = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, _, Ok(annotated))) => done.push((idx, annotated)),
                Ok((_, id, Err(e))) => {
                    tracing::warn!(
                        target: "analyze",
                        stage = "analyzing",
                        item_id = id,
                        provider = self.model.name(),
                        error = %e,
                        "analysis failed"
                    );
                    counter!("digest_analysis_failures_total").increment(1);
                }
                Err(e) => {
                    tracing::error!(target: "analyze", error = %e, "analysis task aborted");
                    counter!("digest_analysis_failures_total").increment(1);
                }
            }
        }
        done.sort_by_key(|(idx, _)| *idx);

        counter!("digest_annotated_total").increment(done.len() as u64);
        tracing::info!(target: "analyze", annotated = done.len(), total, "analysis finished");
        done.into_iter().map(|(_, a)| a).collect()
    }
}

async fn annotate_one(
    model: &dyn LanguageModel,
    item: ValidatedItem,
    opts: CompletionOptions,
) -> Result<AnnotatedItem, ItemError> {
    let prompt = prompt::build_prompt(&item);
    let raw = model
        .complete(&prompt, opts)
        .await
        .map_err(|e| ItemError::Model(format!("{e:#}")))?;
    let annotation = parse_annotation(&raw).inspect_err(|_| {
        tracing::debug!(target: "analyze", item_id = item.id, raw = %raw, "unparsable model output");
    })?;
    Ok(AnnotatedItem::new(item, annotation))
}
