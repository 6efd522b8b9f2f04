#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local Climate Zone (LCZ) class, sample, statistics, and scenario types.
//!
//! These are the plain data types exchanged between the zone catalog, the
//! spatial attributor, the statistics aggregator, and the scenario
//! simulator. Every value that can be unknown is an `Option` so callers can
//! tell "no effect" apart from "no data".

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An LCZ class code: `1`-`10` for built types, `A`-`G` for land cover.
///
/// Labels are normalized (trimmed, upper-cased) on construction. Ordering
/// is "natural": numeric codes first by value, then letter codes
/// alphabetically, so `2 < 10 < A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Creates a normalized class label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_ascii_uppercase())
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value of built-type codes (`1`-`10`).
    #[must_use]
    pub fn numeric(&self) -> Option<u32> {
        self.0.parse().ok()
    }

    /// Whether this is a built-type (numeric) class.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.numeric().is_some()
    }
}

impl Ord for ClassLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClassLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<String> for ClassLabel {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for ClassLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ClassLabel> for String {
    fn from(value: ClassLabel) -> Self {
        value.0
    }
}

impl AsRef<str> for ClassLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a class label is not present in the class table.
///
/// Distinct from a legitimate zero offset or delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClassError {
    /// The label that failed to resolve.
    pub label: String,
}

impl UnknownClassError {
    /// Creates an error for the given label.
    #[must_use]
    pub fn new(label: &ClassLabel) -> Self {
        Self {
            label: label.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for UnknownClassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown LCZ class '{}'", self.label)
    }
}

impl std::error::Error for UnknownClassError {}

/// An RGB color as used in classified LCZ rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance between two colors in RGB space.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr.mul_add(dr, dg.mul_add(dg, db * db))).sqrt()
    }

    /// Parses a `#RRGGBB` hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Self, InvalidColorError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || InvalidColorError {
            value: hex.to_owned(),
        };
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Formats the color as `#RRGGBB`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = InvalidColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColorError {
    /// The string that failed to parse.
    pub value: String,
}

impl std::fmt::Display for InvalidColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid color '{}': expected #RRGGBB", self.value)
    }
}

impl std::error::Error for InvalidColorError {}

/// Static definition of one LCZ class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClassDefinition {
    /// Class code (e.g. `"2"`, `"A"`).
    pub label: ClassLabel,
    /// Display name (e.g. "Compact midrise").
    pub name: String,
    /// Canonical color in classified rasters.
    pub color: Rgb,
    /// Literature temperature offset in °C relative to the baseline class.
    pub thermal_offset: f64,
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl LatLon {
    /// Creates a point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern edge (max latitude).
    pub north: f64,
    /// Southern edge (min latitude).
    pub south: f64,
    /// Eastern edge (max longitude).
    pub east: f64,
    /// Western edge (min longitude).
    pub west: f64,
}

impl Bounds {
    /// Creates a bounding box from its four edges.
    #[must_use]
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// Whether the box has positive extent in both axes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.north > self.south && self.east > self.west
    }

    /// Latitude span in degrees.
    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }
}

/// A temperature measurement at a point.
///
/// Owned by the caller. `class` is filled in by attribution and stays
/// `None` when no zone contains the point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Observed temperature in °C.
    pub temperature: f64,
    /// Attributed LCZ class.
    #[serde(rename = "lcz_class", default)]
    pub class: Option<ClassLabel>,
}

impl Sample {
    /// Creates an unattributed sample.
    #[must_use]
    pub const fn new(lat: f64, lon: f64, temperature: f64) -> Self {
        Self {
            lat,
            lon,
            temperature,
            class: None,
        }
    }

    /// Creates a sample that already carries a class.
    #[must_use]
    pub const fn with_class(lat: f64, lon: f64, temperature: f64, class: ClassLabel) -> Self {
        Self {
            lat,
            lon,
            temperature,
            class: Some(class),
        }
    }
}

/// Descriptive temperature statistics for one LCZ class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ZoneStatistics {
    /// Class code.
    #[serde(rename = "lcz_class")]
    pub class: ClassLabel,
    /// Mean temperature (°C).
    pub mean_temp: f64,
    /// Sample standard deviation; `None` when only one sample exists.
    pub std_temp: Option<f64>,
    /// Minimum temperature (°C).
    pub min_temp: f64,
    /// Maximum temperature (°C).
    pub max_temp: f64,
    /// Number of attributed samples.
    pub count: usize,
    /// Class display name, if the class is defined.
    pub description: Option<String>,
    /// Literature offset from the baseline class, if the class is defined.
    pub temp_delta_expected: Option<f64>,
    /// Observed mean minus the baseline class mean, if the baseline has data.
    pub temp_delta_observed: Option<f64>,
}

/// Qualitative interpretation of a signed temperature change.
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
#[serde(rename_all = "snake_case")]
pub enum ImpactBand {
    /// Change above +2 °C.
    #[strum(serialize = "significant warming")]
    SignificantWarming,
    /// Change in (+0.5, +2] °C.
    #[strum(serialize = "moderate warming")]
    ModerateWarming,
    /// Change in (-0.5, +0.5] °C.
    #[strum(serialize = "minimal impact")]
    MinimalImpact,
    /// Change in [-2, -0.5] °C.
    #[strum(serialize = "moderate cooling")]
    ModerateCooling,
    /// Change below -2 °C.
    #[strum(serialize = "significant cooling")]
    SignificantCooling,
}

impl ImpactBand {
    /// Classifies a signed temperature change.
    ///
    /// Exactly `-0.5` falls into [`Self::ModerateCooling`].
    #[must_use]
    pub fn from_delta(delta: f64) -> Self {
        if delta > 2.0 {
            Self::SignificantWarming
        } else if delta > 0.5 {
            Self::ModerateWarming
        } else if delta > -0.5 {
            Self::MinimalImpact
        } else if delta >= -2.0 {
            Self::ModerateCooling
        } else {
            Self::SignificantCooling
        }
    }
}

/// Presentational flavor of an area conversion scenario.
///
/// Both flavors share the same computation and differ only in how the
/// result is labeled.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioKind {
    /// Vegetation converted to built area; reported as an increase.
    Intensification,
    /// Built area converted to vegetation; reported as a decrease.
    Greening,
}

/// Outcome of an area conversion scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    /// Presentational flavor.
    pub kind: ScenarioKind,
    /// Classes being converted.
    pub source_classes: Vec<ClassLabel>,
    /// Class the area is converted to.
    pub target_class: ClassLabel,
    /// Fraction of the source area converted, in `[0, 1]`.
    pub conversion_rate: f64,
    /// Converted area in km².
    pub affected_area_km2: f64,
    /// Number of catalog zones in the source classes.
    pub zones_affected: usize,
    /// Unweighted mean of the source classes' mean temperatures.
    pub avg_source_temp: f64,
    /// Target class mean temperature.
    pub target_temp: f64,
    /// Signed expected change in °C.
    pub expected_change: f64,
    /// Interpretation of `expected_change`.
    pub band: ImpactBand,
}

impl ScenarioResult {
    /// Flattens the result into ordered key/value pairs for tabular export.
    ///
    /// Field names follow the scenario flavor: intensification reports
    /// vegetation/urban temperatures and an increase, greening reports
    /// urban/vegetation temperatures and a decrease. Values are identical.
    #[must_use]
    pub fn to_record(&self) -> Vec<(&'static str, String)> {
        let (sources_key, source_temp_key, target_temp_key, change_key) = match self.kind {
            ScenarioKind::Intensification => (
                "vegetation_classes",
                "avg_vegetation_temp",
                "target_urban_temp",
                "expected_temp_increase",
            ),
            ScenarioKind::Greening => (
                "urban_classes",
                "avg_urban_temp",
                "target_vegetation_temp",
                "expected_temp_decrease",
            ),
        };

        vec![
            ("scenario_type", self.kind.to_string()),
            (sources_key, join_labels(&self.source_classes)),
            ("target_class", self.target_class.to_string()),
            ("conversion_rate", self.conversion_rate.to_string()),
            (
                "total_area_converted_km2",
                self.affected_area_km2.to_string(),
            ),
            (source_temp_key, self.avg_source_temp.to_string()),
            (target_temp_key, self.target_temp.to_string()),
            (change_key, self.expected_change.to_string()),
            ("num_zones_affected", self.zones_affected.to_string()),
            ("interpretation", self.band.to_string()),
        ]
    }
}

/// Outcome of a literature-driven point conversion between two classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSimulation {
    /// Original class.
    pub from_class: ClassLabel,
    /// Original class display name.
    pub from_name: String,
    /// New class.
    pub to_class: ClassLabel,
    /// New class display name.
    pub to_name: String,
    /// Temperature before conversion (°C).
    pub base_temperature: f64,
    /// Offset difference `offset(to) - offset(from)`.
    pub delta: f64,
    /// `base_temperature + delta`.
    pub new_temperature: f64,
    /// Interpretation of `delta`.
    pub band: ImpactBand,
    /// Human-readable summary of the conversion.
    pub explanation: String,
}

/// Outcome of converting one catalog zone to another class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneChangeResult {
    /// Catalog zone id.
    pub zone_id: usize,
    /// Current class of the zone.
    pub old_class: ClassLabel,
    /// Hypothetical new class.
    pub new_class: ClassLabel,
    /// Observed mean temperature of the current class.
    pub old_temp: f64,
    /// Observed mean temperature of the new class.
    pub new_temp: f64,
    /// `new_temp - old_temp`.
    pub temp_change: f64,
    /// Zone area in km².
    pub area_km2: f64,
    /// Zone centroid.
    pub centroid: LatLon,
}

/// Which ingestion strategy produced a zone catalog.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    /// Authored vector boundaries (KML / `GeoJSON`).
    Vector,
    /// Grid cells classified from a color raster.
    Raster,
}

/// Joins labels with `", "`.
#[must_use]
pub fn join_labels(labels: &[ClassLabel]) -> String {
    labels
        .iter()
        .map(ClassLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_labels() {
        assert_eq!(ClassLabel::new(" a ").as_str(), "A");
        assert_eq!(ClassLabel::new("10"), ClassLabel::from("10"));
    }

    #[test]
    fn orders_numeric_labels_before_letters() {
        let mut labels: Vec<ClassLabel> = ["A", "10", "2", "G", "1"]
            .into_iter()
            .map(ClassLabel::new)
            .collect();
        labels.sort();
        let ordered: Vec<&str> = labels.iter().map(ClassLabel::as_str).collect();
        assert_eq!(ordered, ["1", "2", "10", "A", "G"]);
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::from_hex("#8C0000").unwrap(), Rgb::new(140, 0, 0));
        assert_eq!(Rgb::from_hex("6a6aff").unwrap(), Rgb::new(106, 106, 255));
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#GG0000").is_err());
        assert_eq!(Rgb::new(185, 219, 121).to_hex(), "#B9DB79");
    }

    #[test]
    fn color_distance_is_euclidean() {
        let d = Rgb::new(0, 0, 0).distance(Rgb::new(3, 4, 0));
        assert!((d - 5.0).abs() < f64::EPSILON);
        assert!(Rgb::new(9, 9, 9).distance(Rgb::new(9, 9, 9)).abs() < f64::EPSILON);
    }

    #[test]
    fn band_boundaries_are_inclusive_as_documented() {
        assert_eq!(ImpactBand::from_delta(2.0), ImpactBand::ModerateWarming);
        assert_eq!(ImpactBand::from_delta(2.01), ImpactBand::SignificantWarming);
        assert_eq!(ImpactBand::from_delta(0.5), ImpactBand::MinimalImpact);
        assert_eq!(ImpactBand::from_delta(0.51), ImpactBand::ModerateWarming);
        assert_eq!(ImpactBand::from_delta(0.0), ImpactBand::MinimalImpact);
        assert_eq!(ImpactBand::from_delta(-0.5), ImpactBand::ModerateCooling);
        assert_eq!(ImpactBand::from_delta(-2.0), ImpactBand::ModerateCooling);
        assert_eq!(ImpactBand::from_delta(-2.01), ImpactBand::SignificantCooling);
    }

    #[test]
    fn band_names_are_human_readable() {
        assert_eq!(
            ImpactBand::SignificantCooling.to_string(),
            "significant cooling"
        );
        assert_eq!(
            "moderate warming".parse::<ImpactBand>().unwrap(),
            ImpactBand::ModerateWarming
        );
    }

    #[test]
    fn scenario_records_differ_only_in_naming() {
        let result = ScenarioResult {
            kind: ScenarioKind::Intensification,
            source_classes: vec![ClassLabel::new("B"), ClassLabel::new("D")],
            target_class: ClassLabel::new("6"),
            conversion_rate: 0.5,
            affected_area_km2: 1.25,
            zones_affected: 3,
            avg_source_temp: 27.0,
            target_temp: 29.0,
            expected_change: 1.0,
            band: ImpactBand::ModerateWarming,
        };
        let greening = ScenarioResult {
            kind: ScenarioKind::Greening,
            ..result.clone()
        };

        let a = result.to_record();
        let b = greening.to_record();
        assert_eq!(a.len(), b.len());
        assert!(a.contains(&("expected_temp_increase", "1".to_owned())));
        assert!(b.contains(&("expected_temp_decrease", "1".to_owned())));
        assert!(a.contains(&("vegetation_classes", "B, D".to_owned())));
        assert!(b.contains(&("urban_classes", "B, D".to_owned())));
        for ((_, va), (_, vb)) in a.iter().zip(&b).skip(1) {
            assert_eq!(va, vb);
        }
    }

    #[test]
    fn bounds_center_is_midpoint() {
        let b = Bounds::new(-29.0, -30.0, -51.0, -52.0);
        let c = b.center();
        assert!((c.lat - -29.5).abs() < 1e-12);
        assert!((c.lon - -51.5).abs() < 1e-12);
        assert!(b.is_valid());
        assert!(!Bounds::new(0.0, 1.0, 1.0, 0.0).is_valid());
    }
}
