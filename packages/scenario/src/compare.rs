//! Side-by-side comparison of scenario results.

use lcz_map_zone_models::{ScenarioKind, ScenarioResult, join_labels};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Direction of a scenario's expected change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Impact {
    /// Positive change.
    Warming,
    /// Zero or negative change.
    Cooling,
}

impl Impact {
    /// Classifies a signed change.
    #[must_use]
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Self::Warming
        } else {
            Self::Cooling
        }
    }
}

/// One flat row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ComparisonRow {
    /// 1-based position in the compared list.
    pub scenario_id: usize,
    /// Scenario flavor.
    #[serde(rename = "type")]
    pub kind: ScenarioKind,
    /// Comma-separated source classes.
    pub from_classes: String,
    /// Target class.
    pub to_class: String,
    /// Conversion rate as a whole percentage, e.g. `"30%"`.
    pub conversion_rate: String,
    /// Converted area in km².
    pub area_affected_km2: f64,
    /// Signed expected change in °C.
    pub temp_change: f64,
    /// Direction of the change.
    pub impact: Impact,
}

/// Builds one comparison row per scenario result, in input order.
#[must_use]
pub fn compare_scenarios(results: &[ScenarioResult]) -> Vec<ComparisonRow> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| ComparisonRow {
            scenario_id: i + 1,
            kind: result.kind,
            from_classes: join_labels(&result.source_classes),
            to_class: result.target_class.to_string(),
            conversion_rate: format!("{:.0}%", result.conversion_rate * 100.0),
            area_affected_km2: result.affected_area_km2,
            temp_change: result.expected_change,
            impact: Impact::from_change(result.expected_change),
        })
        .collect()
}
