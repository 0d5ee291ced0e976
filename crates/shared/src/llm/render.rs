use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::recommendations::{
    Recommendation, RecommendationParseError, validate_recommendation_value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationSet {
    pub items: Vec<Recommendation>,
    pub source: ReplySource,
}

/// Converts model text to HTML that is safe to inject. Text is escaped first,
/// so only the `<strong>` and `<br />` tags produced here can appear.
pub fn render_markup(text: &str) -> String {
    let escaped = escape_html(text);
    let bolded = replace_bold(&escaped);
    bolded.replace("\r\n", "<br />").replace('\n', "<br />")
}

/// Greedy slice from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_recommendations(text: &str) -> Result<Vec<Recommendation>, RecommendationParseError> {
    let raw = extract_json_object(text).ok_or(RecommendationParseError::MissingJson)?;
    let value: Value = serde_json::from_str(raw)?;
    validate_recommendation_value(&value)
}

/// Parsed model recommendations, or `fallback` when the text holds no
/// usable payload.
pub fn resolve_recommendations(text: &str, fallback: Vec<Recommendation>) -> RecommendationSet {
    match parse_recommendations(text) {
        Ok(items) => RecommendationSet {
            items,
            source: ReplySource::Model,
        },
        Err(err) => {
            debug!(error = %err, "using fallback recommendations");
            RecommendationSet {
                items: fallback,
                source: ReplySource::Fallback,
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// Pairs `**` markers left to right; an unmatched trailing marker stays literal.
fn replace_bold(text: &str) -> String {
    let segments = text.split("**").collect::<Vec<_>>();
    let pairs = (segments.len() - 1) / 2;
    let mut out = String::with_capacity(text.len());

    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            if index <= pairs * 2 {
                out.push_str(if index % 2 == 1 { "<strong>" } else { "</strong>" });
            } else {
                out.push_str("**");
            }
        }
        out.push_str(segment);
    }

    out
}
