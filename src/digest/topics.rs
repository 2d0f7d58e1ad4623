//! Interest vocabulary used for ranking and for the glyphs in front of each title.

/// (keyword, glyph). Keywords are matched as lowercase substrings.
pub const INTEREST_TOPICS: &[(&str, &str)] = &[
    ("bitcoin", "₿"),
    ("crypto", "🪙"),
    ("stablecoin", "💵"),
    ("payments", "💳"),
    ("ai", "🤖"),
    ("coding", "👨‍💻"),
    ("programming", "⌨️"),
    ("developer", "🛠️"),
    ("blockchain", "⛓️"),
    ("machine learning", "🧠"),
];

/// Points added per distinct keyword found.
pub const TOPIC_BONUS: u32 = 2;

/// Keywords present in `haystack`, in vocabulary order. Each counts once.
pub fn matched_topics(haystack: &str) -> Vec<(&'static str, &'static str)> {
    let lower = haystack.to_lowercase();
    INTEREST_TOPICS
        .iter()
        .copied()
        .filter(|(kw, _)| lower.contains(kw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_and_distinct() {
        let m = matched_topics("Bitcoin BITCOIN bitcoin and Blockchain");
        let kws: Vec<&str> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(kws, vec!["bitcoin", "blockchain"]);
    }

    #[test]
    fn multi_word_keyword_matches() {
        let m = matched_topics("New Machine Learning compiler");
        assert!(m.iter().any(|(k, g)| *k == "machine learning" && *g == "🧠"));
    }

    #[test]
    fn nothing_matches_plain_text() {
        assert!(matched_topics("Gardening tips for the weekend").is_empty());
    }
}
