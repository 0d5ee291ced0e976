//! Business calculators: pure arithmetic over fixed multiplier tables.
//!
//! Results are rendered to fixed-precision strings once, so identical inputs
//! always serialize to identical bytes and the strings can be interpolated
//! into prompts verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod content_speed;
pub mod prompt_roi;

pub const WEEKS_PER_YEAR: f64 = 52.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    ContentSpeed,
    PromptRoi,
}

impl CalculatorKind {
    pub const ALL: [Self; 2] = [Self::ContentSpeed, Self::PromptRoi];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentSpeed => "content-speed",
            Self::PromptRoi => "prompt-roi",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::ContentSpeed => "Content Creation Speed Calculator",
            Self::PromptRoi => "Prompt Training ROI Calculator",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "content-speed" | "content_speed" => Some(Self::ContentSpeed),
            "prompt-roi" | "prompt_roi" | "roi" => Some(Self::PromptRoi),
            _ => None,
        }
    }

    pub fn from_key(raw: &str) -> Result<Self, CalculatorError> {
        Self::parse(raw).ok_or_else(|| CalculatorError::UnknownKind(raw.trim().to_string()))
    }
}

#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("unknown calculator: {0}")]
    UnknownKind(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("calculator inputs are malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Decodes `inputs` for `kind`, runs the calculation, and returns the results as JSON.
pub fn calculate_value(kind: CalculatorKind, inputs: &Value) -> Result<Value, CalculatorError> {
    match kind {
        CalculatorKind::ContentSpeed => {
            let inputs: content_speed::ContentSpeedInputs =
                serde_json::from_value(inputs.clone())?;
            Ok(serde_json::to_value(content_speed::calculate(&inputs)?)?)
        }
        CalculatorKind::PromptRoi => {
            let inputs: prompt_roi::PromptRoiInputs = serde_json::from_value(inputs.clone())?;
            Ok(serde_json::to_value(prompt_roi::calculate(&inputs)?)?)
        }
    }
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, CalculatorError> {
    if !value.is_finite() {
        return Err(CalculatorError::InvalidInput {
            field,
            reason: "must be a finite number".to_string(),
        });
    }
    if value <= 0.0 {
        return Err(CalculatorError::InvalidInput {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// Rejects results that overflowed or became undefined for extreme inputs.
pub(crate) fn require_finite_result(
    field: &'static str,
    value: f64,
) -> Result<f64, CalculatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculatorError::InvalidInput {
            field,
            reason: "inputs produce a result out of range".to_string(),
        })
    }
}

pub(crate) fn format_hours(value: f64) -> String {
    format!("{value:.1}")
}

pub(crate) fn format_whole(value: f64) -> String {
    format!("{value:.0}")
}
