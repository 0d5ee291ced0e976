use std::sync::LazyLock;

use jsonschema::JSONSchema;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::safety::is_safe_link;

pub const MAX_RECOMMENDATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Course,
    Calculator,
    Resource,
    Upsell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub url: String,
    pub priority: RecommendationPriority,
    pub cta: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationPayload {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Error)]
pub enum RecommendationParseError {
    #[error("no json object found in model output")]
    MissingJson,
    #[error("model output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("recommendation schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("recommendations failed schema validation: {0:?}")]
    SchemaViolation(Vec<String>),
    #[error("no usable recommendations in model output")]
    Empty,
}

pub fn recommendation_schema() -> Value {
    serde_json::to_value(schema_for!(RecommendationPayload))
        .expect("recommendation schema should be serializable")
}

static RECOMMENDATION_VALIDATOR: LazyLock<Result<JSONSchema, String>> = LazyLock::new(|| {
    JSONSchema::compile(&recommendation_schema()).map_err(|err| err.to_string())
});

/// Validates a decoded payload and keeps at most [`MAX_RECOMMENDATIONS`]
/// items that have a title and a safe link.
pub fn validate_recommendation_value(
    payload: &Value,
) -> Result<Vec<Recommendation>, RecommendationParseError> {
    let validator = RECOMMENDATION_VALIDATOR
        .as_ref()
        .map_err(|message| RecommendationParseError::SchemaCompile(message.clone()))?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(RecommendationParseError::SchemaViolation(errors));
    }

    let parsed: RecommendationPayload = serde_json::from_value(payload.clone())?;
    let items = parsed
        .recommendations
        .into_iter()
        .filter(|item| !item.title.trim().is_empty() && is_safe_link(&item.url))
        .take(MAX_RECOMMENDATIONS)
        .collect::<Vec<_>>();

    if items.is_empty() {
        return Err(RecommendationParseError::Empty);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        MAX_RECOMMENDATIONS, RecommendationKind, RecommendationParseError,
        RecommendationPriority, validate_recommendation_value,
    };

    fn item(title: &str, url: &str) -> serde_json::Value {
        json!({
            "type": "course",
            "title": title,
            "description": "Learn the basics.",
            "url": url,
            "priority": "high",
            "cta": "Start now"
        })
    }

    #[test]
    fn accepts_valid_payload_without_reasoning() {
        let items = validate_recommendation_value(&json!({
            "recommendations": [item("Fundamentals", "/courses/prompt-writing-fundamentals")]
        }))
        .expect("valid payload should pass");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, RecommendationKind::Course);
        assert_eq!(items[0].priority, RecommendationPriority::High);
        assert!(items[0].reasoning.is_empty());
    }

    #[test]
    fn rejects_unknown_priority() {
        let mut bad = item("Fundamentals", "/courses");
        bad["priority"] = json!("urgent");

        let err = validate_recommendation_value(&json!({ "recommendations": [bad] }))
            .expect_err("unknown priority should fail");
        assert!(matches!(err, RecommendationParseError::SchemaViolation(_)));
    }

    #[test]
    fn rejects_missing_array() {
        let err = validate_recommendation_value(&json!({ "items": [] }))
            .expect_err("missing recommendations should fail");
        assert!(matches!(err, RecommendationParseError::SchemaViolation(_)));
    }

    #[test]
    fn drops_unsafe_links_and_empty_titles() {
        let items = validate_recommendation_value(&json!({
            "recommendations": [
                item("Bad link", "javascript:alert(1)"),
                item("   ", "/pricing"),
                item("Pricing", "/pricing"),
            ]
        }))
        .expect("one item should survive");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Pricing");
    }

    #[test]
    fn all_filtered_is_empty_error() {
        let err = validate_recommendation_value(&json!({
            "recommendations": [item("Bad", "http://insecure.example")]
        }))
        .expect_err("no safe items");
        assert!(matches!(err, RecommendationParseError::Empty));

        let err = validate_recommendation_value(&json!({ "recommendations": [] }))
            .expect_err("empty array");
        assert!(matches!(err, RecommendationParseError::Empty));
    }

    #[test]
    fn caps_item_count() {
        let many = (0..7)
            .map(|index| item(&format!("Item {index}"), "/resources"))
            .collect::<Vec<_>>();

        let items = validate_recommendation_value(&json!({ "recommendations": many }))
            .expect("valid payload");
        assert_eq!(items.len(), MAX_RECOMMENDATIONS);
    }
}
