//! Strict parsing of the model's JSON answer.

use serde::{Deserialize, Serialize};

use crate::error::ItemError;

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const IMPACT_MAX_CHARS: usize = 100;
pub const RELEVANCE_MIN: u8 = 1;
pub const RELEVANCE_MAX: u8 = 10;

/// The (summary, relevance, impact) triple for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub summary: String,
    pub relevance: u8,
    pub impact: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Wire {
    summary: String,
    relevance: i64,
    impact: String,
}

/// Parse the raw completion. Exactly the three keys, integer relevance in 1..=10.
/// Over-long text is cut, not re-requested. Out-of-range relevance rejects the item.
pub fn parse_annotation(raw: &str) -> Result<Annotation, ItemError> {
    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(|e| ItemError::Parse(e.to_string()))?;
    // serde would happily read a 3-element array into `Wire`
    if !value.is_object() {
        return Err(ItemError::Parse("expected a JSON object".into()));
    }
    let wire: Wire = serde_json::from_value(value).map_err(|e| ItemError::Parse(e.to_string()))?;
    let relevance = u8::try_from(wire.relevance)
        .ok()
        .filter(|r| (RELEVANCE_MIN..=RELEVANCE_MAX).contains(r))
        .ok_or(ItemError::RelevanceOutOfRange(wire.relevance))?;
    Ok(Annotation {
        summary: truncate_chars(&wire.summary, SUMMARY_MAX_CHARS),
        relevance,
        impact: truncate_chars(&wire.impact, IMPACT_MAX_CHARS),
    })
}

/// Cut to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
