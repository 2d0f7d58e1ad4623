//! Error taxonomy shared by every pipeline stage.
//!
//! Adapters speak `anyhow`; the stages map those into these types at their boundary.

use thiserror::Error;

/// Failure confined to one candidate. Logged and dropped by the stage that hit it.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("fetch failed for item {id}: {reason}")]
    Fetch { id: u64, reason: String },

    #[error("item {id} rejected: {reason}")]
    Schema { id: u64, reason: String },

    #[error("model call failed: {0}")]
    Model(String),

    #[error("unparsable model response: {0}")]
    Parse(String),

    #[error("relevance {0} outside 1..=10")]
    RelevanceOutOfRange(i64),
}

/// Hard failure that ends a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to collect news stories: {0:#}")]
    Source(anyhow::Error),

    #[error("Failed to distribute news after {attempts} attempts: {source:#}")]
    Delivery {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0:#}")]
    Unexpected(anyhow::Error),
}

impl PipelineError {
    /// Short label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Source(_) => "source",
            PipelineError::Delivery { .. } => "delivery",
            PipelineError::Unexpected(_) => "unexpected",
        }
    }

    /// Top-level line only, without the cause chain. Safe to hand to callers outside.
    pub fn summary(&self) -> String {
        match self {
            PipelineError::Source(_) => "Failed to collect news stories".to_string(),
            PipelineError::Delivery { attempts, .. } => {
                format!("Failed to distribute news after {attempts} attempts")
            }
            PipelineError::Unexpected(_) => "NewsAgent execution failed".to_string(),
        }
    }
}

/// The original error of a failed run, plus whether the operator alert went out.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: PipelineError,
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_mentions_attempts_and_cause() {
        let e = PipelineError::Delivery {
            attempts: 3,
            source: anyhow::anyhow!("telegram 502"),
        };
        let s = e.to_string();
        assert!(s.contains("3 attempts"), "{s}");
        assert!(s.contains("telegram 502"), "{s}");
        assert_eq!(e.kind(), "delivery");
    }

    #[test]
    fn summary_leaves_out_the_cause() {
        let e = PipelineError::Delivery {
            attempts: 3,
            source: anyhow::anyhow!("telegram 502: bot token rejected"),
        };
        assert_eq!(e.summary(), "Failed to distribute news after 3 attempts");
        let e = PipelineError::Source(anyhow::anyhow!("GET https://hn/topstories.json: refused"));
        assert_eq!(e.summary(), "Failed to collect news stories");
        assert!(!PipelineError::Unexpected(anyhow::anyhow!("secret")).summary().contains("secret"));
    }

    #[test]
    fn run_failure_displays_inner_error() {
        let f = RunFailure {
            error: PipelineError::Unexpected(anyhow::anyhow!("boom")),
            notified: false,
        };
        assert_eq!(f.to_string(), "boom");
    }
}
