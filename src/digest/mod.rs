// src/digest/mod.rs
//! Ranking and message composition. Pure: same items and clock in, same text out.

pub mod topics;

use chrono::{NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analyze::annotation::{truncate_chars, IMPACT_MAX_CHARS, SUMMARY_MAX_CHARS};
use crate::analyze::AnnotatedItem;
use crate::digest::topics::{matched_topics, TOPIC_BONUS};

pub const MAX_DIGEST_ITEMS: usize = 5;
pub const RELEVANCE_GLYPH: &str = "🎯";
pub const MAX_RELEVANCE_GLYPHS: usize = 5;
pub const SEPARATOR: &str = "┄┄┄┄┄┄┄┄┄┄┄┄";
pub const TITLE_LINE: &str = "🎯 Today's Tech Insights";
pub const TEXT_ONLY_MARKER: &str = "📝 Text-only post";

static RE_ANGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[<>]").expect("angle bracket regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DaySegment {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl DaySegment {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Night => "🌙",
            Self::Morning => "🌅",
            Self::Afternoon => "☀️",
            Self::Evening => "🌆",
        }
    }
}

/// One selected item with its composite score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub item: AnnotatedItem,
    pub score: u32,
}

/// The message for one run: header plus at most five ranked items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub generated_at: NaiveDateTime,
    pub items: Vec<RankedItem>,
}

impl Digest {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn header(&self) -> String {
        let date = self.generated_at.format("%B %-d, %Y");
        let segment = DaySegment::from_hour(self.generated_at.hour());
        format!(
            "{TITLE_LINE}\n📅 {date}\n\n{} Latest updates on Bitcoin, AI, and Tech:",
            segment.glyph()
        )
    }

    /// Full chat message, HTML-safe with respect to angle brackets.
    pub fn render(&self) -> String {
        let mut out = self.header();
        for ranked in &self.items {
            out.push_str(&render_item(&ranked.item));
        }
        out
    }
}

/// `relevance + 2 × distinct interest keywords in title, summary and impact`.
pub fn composite_score(item: &AnnotatedItem) -> u32 {
    let content = format!("{} {} {}", item.item.title, item.summary, item.impact);
    u32::from(item.relevance) + TOPIC_BONUS * matched_topics(&content).len() as u32
}

/// Rank by composite score (stable on ties) and keep the top five.
pub fn compose(items: Vec<AnnotatedItem>, now: NaiveDateTime) -> Digest {
    let mut ranked: Vec<RankedItem> = items
        .into_iter()
        .map(|item| RankedItem {
            score: composite_score(&item),
            item,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_DIGEST_ITEMS);
    Digest {
        generated_at: now,
        items: ranked,
    }
}

/// Strip `<` and `>` so model or source text can't inject markup.
pub fn sanitize(s: &str) -> String {
    RE_ANGLE.replace_all(s, "").into_owned()
}

/// `ceil(relevance / 2)` glyphs, at most five.
pub fn relevance_indicator(relevance: u8) -> String {
    let n = usize::from(relevance).div_ceil(2).min(MAX_RELEVANCE_GLYPHS);
    RELEVANCE_GLYPH.repeat(n)
}

fn render_item(item: &AnnotatedItem) -> String {
    let title = sanitize(&item.item.title);
    let summary = sanitize(&truncate_chars(&item.summary, SUMMARY_MAX_CHARS));
    let impact = sanitize(&truncate_chars(&item.impact, IMPACT_MAX_CHARS));

    let glyphs: String = matched_topics(&format!("{title} {summary}"))
        .into_iter()
        .map(|(_, g)| g)
        .collect();
    let headline = if glyphs.is_empty() {
        title
    } else {
        format!("{glyphs} {title}")
    };

    let source = match item.item.url.as_deref() {
        Some(url) => format!("🔗 {}", sanitize(url)),
        None => TEXT_ONLY_MARKER.to_string(),
    };

    format!(
        "\n{SEPARATOR}\n\n{headline}\n\n{summary}\n\n🔮 {impact}\n\n{} {}/10\n\n{source}",
        relevance_indicator(item.relevance),
        item.relevance,
    )
}
