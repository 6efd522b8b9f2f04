//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid
//! configuration:
//!
//! ```toml
//! baseline_class = "D"
//! classes_path = "custom_classes.toml"
//!
//! [raster]
//! grid_size = 50
//! color_tolerance = 30.0
//!
//! [sampling]
//! points_per_zone = 5
//! seed = 42
//! max_attempts = 10
//!
//! [synthetic]
//! base_temperature = 28.0
//! temperature_noise = 0.5
//! position_jitter = 0.001
//! ```

use std::path::PathBuf;

use lcz_map_zone::{ClassTable, RasterOptions, ZoneError};
use lcz_map_zone_models::ClassLabel;
use serde::{Deserialize, Serialize};

/// Sampling point generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SamplingConfig {
    /// Points generated per zone, the centroid included.
    pub points_per_zone: usize,
    /// Seed for the deterministic generator.
    pub seed: u64,
    /// Rejection-sampling attempts per extra point.
    pub max_attempts: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            points_per_zone: 5,
            seed: 42,
            max_attempts: 10,
        }
    }
}

/// Synthetic temperature generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SyntheticConfig {
    /// Temperature of the baseline class in °C.
    pub base_temperature: f64,
    /// Standard deviation of the temperature noise in °C.
    pub temperature_noise: f64,
    /// Standard deviation of the position jitter around the centroid, in
    /// degrees.
    pub position_jitter: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            base_temperature: 28.0,
            temperature_noise: 0.5,
            position_jitter: 0.001,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Class observed deltas are measured against; the class table's
    /// baseline when unset.
    pub baseline_class: Option<ClassLabel>,
    /// Custom class table; the standard table is used when absent.
    pub classes_path: Option<PathBuf>,
    /// Raster ingestion settings.
    pub raster: RasterOptions,
    /// Sampling point settings.
    pub sampling: SamplingConfig,
    /// Synthetic sample settings.
    pub synthetic: SyntheticConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_class: None,
            classes_path: None,
            raster: RasterOptions::default(),
            sampling: SamplingConfig::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Toml`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ZoneError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// The configured baseline class, or the baseline of `classes`.
    #[must_use]
    pub fn baseline<'a>(&'a self, classes: &'a ClassTable) -> &'a ClassLabel {
        self.baseline_class
            .as_ref()
            .unwrap_or_else(|| classes.baseline())
    }

    /// Checks the configuration against the class table in use.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Config`] if the baseline class is not in the
    /// table, or a numeric setting is out of range.
    pub fn validate(&self, classes: &ClassTable) -> Result<(), ZoneError> {
        let fail = |message: String| -> Result<(), ZoneError> { Err(ZoneError::Config { message }) };

        if let Some(baseline) = &self.baseline_class {
            if !classes.contains(baseline) {
                return fail(format!("baseline class {baseline} is not in the class table"));
            }
        }
        if self.raster.grid_size == 0 {
            return fail("raster.grid_size must be at least 1".to_owned());
        }
        if !self.raster.color_tolerance.is_finite() || self.raster.color_tolerance < 0.0 {
            return fail(format!(
                "raster.color_tolerance must be non-negative, found {}",
                self.raster.color_tolerance
            ));
        }
        if self.sampling.points_per_zone == 0 {
            return fail("sampling.points_per_zone must be at least 1".to_owned());
        }
        let synthetic = &self.synthetic;
        if !synthetic.base_temperature.is_finite()
            || !(synthetic.temperature_noise >= 0.0 && synthetic.temperature_noise.is_finite())
            || !(synthetic.position_jitter >= 0.0 && synthetic.position_jitter.is_finite())
        {
            return fail("synthetic settings must be finite and non-negative".to_owned());
        }

        Ok(())
    }
}
