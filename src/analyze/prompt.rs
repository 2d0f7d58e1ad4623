//! Prompt sent to the language model for one item.

use crate::validate::ValidatedItem;

pub const PLACEHOLDER: &str = "N/A";

pub fn build_prompt(item: &ValidatedItem) -> String {
    format!(
        r#"You are a news analyzer. Analyze this tech news item and provide a response in ONLY valid JSON format with these exact keys: summary, relevance, impact.

News Item:
Title: {title}
URL: {url}
Text: {text}
Score: {score}

Requirements:
1. summary: A brief 2-3 sentence summary (max 200 characters)
2. relevance: An integer from 1-10
3. impact: A brief one-sentence impact assessment (max 100 characters)

Return ONLY the JSON object, nothing else. Example format:
{{"summary": "Brief summary here", "relevance": 8, "impact": "Brief impact here"}}"#,
        title = item.title,
        url = item.url.as_deref().unwrap_or(PLACEHOLDER),
        text = item.text.as_deref().unwrap_or(PLACEHOLDER),
        score = item.score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: Option<&str>, text: Option<&str>) -> ValidatedItem {
        ValidatedItem {
            id: 1,
            title: "Postgres 18 ships async IO".into(),
            url: url.map(str::to_string),
            text: text.map(str::to_string),
            score: 321,
            time: 0,
            author: "x".into(),
            kind: "story".into(),
        }
    }

    #[test]
    fn embeds_fields_and_placeholders() {
        let p = build_prompt(&item(None, None));
        assert!(p.contains("Title: Postgres 18 ships async IO"));
        assert!(p.contains("URL: N/A"));
        assert!(p.contains("Text: N/A"));
        assert!(p.contains("Score: 321"));
        assert!(p.contains(r#"{"summary": "Brief summary here""#));
    }

    #[test]
    fn embeds_url_when_present() {
        let p = build_prompt(&item(Some("https://postgresql.org"), Some("body")));
        assert!(p.contains("URL: https://postgresql.org"));
        assert!(p.contains("Text: body"));
    }
}
