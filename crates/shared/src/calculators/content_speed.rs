use serde::{Deserialize, Serialize};

use super::{
    CalculatorError, WEEKS_PER_YEAR, format_hours, format_whole, require_finite_result,
    require_positive,
};

/// Extra time spent reviewing and editing AI-assisted drafts.
pub const REVIEW_OVERHEAD: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    BlogPosts,
    SocialMedia,
    EmailCampaigns,
    ProductDescriptions,
    TechnicalDocs,
}

impl ContentType {
    pub const ALL: [Self; 5] = [
        Self::BlogPosts,
        Self::SocialMedia,
        Self::EmailCampaigns,
        Self::ProductDescriptions,
        Self::TechnicalDocs,
    ];

    pub const fn speed_multiplier(self) -> f64 {
        match self {
            Self::BlogPosts => 4.5,
            Self::SocialMedia => 6.0,
            Self::EmailCampaigns => 5.0,
            Self::ProductDescriptions => 5.5,
            Self::TechnicalDocs => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Beginner => 0.6,
            Self::Intermediate => 0.8,
            Self::Advanced => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSpeedInputs {
    pub current_words_per_hour: f64,
    pub content_type: ContentType,
    pub weekly_pieces: f64,
    pub average_word_count: f64,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSpeedResults {
    pub current_process: ProcessHours,
    pub ai_assisted: ProcessHours,
    pub savings: TimeSavings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHours {
    pub hours_per_piece: String,
    pub weekly_hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSavings {
    pub weekly_hours: String,
    pub yearly_hours: String,
    pub speed_increase_percent: String,
}

pub fn calculate(inputs: &ContentSpeedInputs) -> Result<ContentSpeedResults, CalculatorError> {
    let words_per_hour = require_positive("currentWordsPerHour", inputs.current_words_per_hour)?;
    let weekly_pieces = require_positive("weeklyPieces", inputs.weekly_pieces)?;
    let word_count = require_positive("averageWordCount", inputs.average_word_count)?;

    let baseline_hours = require_finite_result("hoursPerPiece", word_count / words_per_hour)?;
    let assisted_words_per_hour =
        words_per_hour * inputs.content_type.speed_multiplier() * inputs.skill_level.multiplier();
    let assisted_hours = require_finite_result(
        "aiHoursPerPiece",
        (word_count / assisted_words_per_hour) * REVIEW_OVERHEAD,
    )?;

    let baseline_weekly = require_finite_result("weeklyHours", baseline_hours * weekly_pieces)?;
    let assisted_weekly = require_finite_result("aiWeeklyHours", assisted_hours * weekly_pieces)?;
    let weekly_saved = (baseline_weekly - assisted_weekly).max(0.0);
    let yearly_saved = require_finite_result("yearlyHours", weekly_saved * WEEKS_PER_YEAR)?;
    let speed_increase = require_finite_result(
        "speedIncreasePercent",
        (baseline_hours / assisted_hours - 1.0) * 100.0,
    )?;

    Ok(ContentSpeedResults {
        current_process: ProcessHours {
            hours_per_piece: format_hours(baseline_hours),
            weekly_hours: format_hours(baseline_weekly),
        },
        ai_assisted: ProcessHours {
            hours_per_piece: format_hours(assisted_hours),
            weekly_hours: format_hours(assisted_weekly),
        },
        savings: TimeSavings {
            weekly_hours: format_hours(weekly_saved),
            yearly_hours: format_hours(yearly_saved),
            speed_increase_percent: format_whole(speed_increase.max(0.0)),
        },
    })
}
