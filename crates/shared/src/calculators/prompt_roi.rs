use serde::{Deserialize, Serialize};

use super::{
    CalculatorError, WEEKS_PER_YEAR, format_hours, format_whole, require_finite_result,
    require_positive,
};

pub const COURSE_COST_PER_SEAT: f64 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionLevel {
    Light,
    Moderate,
    Full,
}

impl AdoptionLevel {
    pub const ALL: [Self; 3] = [Self::Light, Self::Moderate, Self::Full];

    /// Fraction of writing time saved once the team applies trained prompting.
    pub const fn time_reduction(self) -> f64 {
        match self {
            Self::Light => 0.2,
            Self::Moderate => 0.35,
            Self::Full => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRoiInputs {
    pub team_size: f64,
    pub hours_per_week: f64,
    pub hourly_rate: f64,
    pub adoption_level: AdoptionLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRoiResults {
    pub savings: RoiSavings,
    pub roi: RoiReturn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiSavings {
    pub weekly_hours: String,
    pub yearly_hours: String,
    pub yearly_dollars: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiReturn {
    pub course_cost: String,
    pub payback_weeks: String,
    pub yearly_return_percent: String,
}

pub fn calculate(inputs: &PromptRoiInputs) -> Result<PromptRoiResults, CalculatorError> {
    let team_size = require_positive("teamSize", inputs.team_size)?;
    let hours_per_week = require_positive("hoursPerWeek", inputs.hours_per_week)?;
    let hourly_rate = require_positive("hourlyRate", inputs.hourly_rate)?;

    let weekly_hours = require_finite_result(
        "weeklyHours",
        team_size * hours_per_week * inputs.adoption_level.time_reduction(),
    )?;
    let yearly_hours = require_finite_result("yearlyHours", weekly_hours * WEEKS_PER_YEAR)?;
    let weekly_dollars = require_finite_result("weeklyDollars", weekly_hours * hourly_rate)?;
    let yearly_dollars = require_finite_result("yearlyDollars", yearly_hours * hourly_rate)?;
    let course_cost = require_finite_result("courseCost", team_size.ceil() * COURSE_COST_PER_SEAT)?;
    let payback_weeks = require_finite_result("paybackWeeks", course_cost / weekly_dollars)?;
    let yearly_return_percent = require_finite_result(
        "yearlyReturnPercent",
        (yearly_dollars - course_cost) / course_cost * 100.0,
    )?;

    Ok(PromptRoiResults {
        savings: RoiSavings {
            weekly_hours: format_hours(weekly_hours),
            yearly_hours: format_hours(yearly_hours),
            yearly_dollars: format_whole(yearly_dollars),
        },
        roi: RoiReturn {
            course_cost: format_whole(course_cost),
            payback_weeks: format_hours(payback_weeks),
            yearly_return_percent: format_whole(yearly_return_percent),
        },
    })
}
