#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LCZ conversion scenarios.
//!
//! Two kinds of prediction are offered:
//!
//! - **Observed** area conversions ([`ScenarioSimulator::simulate_conversion`])
//!   combine catalog areas with aggregated class temperatures.
//! - **Literature** point conversions ([`ThermalDeltaModel::simulate_pair`])
//!   use only the per-class thermal offsets.

pub mod compare;
pub mod model;
pub mod presets;
pub mod simulator;

pub use compare::{ComparisonRow, Impact, compare_scenarios};
pub use model::ThermalDeltaModel;
pub use presets::what_if_scenarios;
pub use simulator::{ConversionScenario, ScenarioSimulator, ZoneClassChange};

use lcz_map_zone_models::UnknownClassError;
use thiserror::Error;

/// Errors that can occur while simulating a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Conversion rate outside `[0, 1]`.
    #[error("Conversion rate must be between 0 and 1, found {rate}")]
    InvalidRate {
        /// The rejected rate.
        rate: f64,
    },

    /// No source class was given.
    #[error("Scenario has no source classes")]
    EmptySources,

    /// No catalog zone has one of the source classes.
    #[error("No zones found for source classes {classes}")]
    NoSourceZones {
        /// Comma-separated source classes.
        classes: String,
    },

    /// The target class has no temperature statistics.
    #[error("Insufficient temperature data for target class {class}")]
    MissingTargetStatistics {
        /// The target class.
        class: String,
    },

    /// None of the source classes has temperature statistics.
    #[error("Insufficient temperature data for source classes {classes}")]
    MissingSourceStatistics {
        /// Comma-separated source classes.
        classes: String,
    },

    /// The zone id is not in the catalog.
    #[error("Zone {zone_id} does not exist")]
    UnknownZone {
        /// The rejected id.
        zone_id: usize,
    },

    /// A class label is not in the class table.
    #[error(transparent)]
    UnknownClass(#[from] UnknownClassError),
}

impl ScenarioError {
    /// Whether the error stems from missing zones or temperature data
    /// rather than invalid input.
    #[must_use]
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            Self::NoSourceZones { .. }
                | Self::MissingTargetStatistics { .. }
                | Self::MissingSourceStatistics { .. }
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use lcz_map_analytics::{StatisticsTable, aggregate};
    use lcz_map_zone::{ClassTable, RasterImage, RasterOptions, RasterSource, ZoneCatalog, ZoneSource};
    use lcz_map_zone_models::{Bounds, Rgb, Sample};

    /// A 3×3 raster catalog whose columns are classes B, D and 6.
    pub fn catalog() -> ZoneCatalog {
        let image = RasterImage::new(
            3,
            1,
            vec![
                Rgb::new(0x00, 0xAA, 0x00),
                Rgb::new(0xB9, 0xDB, 0x79),
                Rgb::new(0xFF, 0x99, 0x55),
            ],
        )
        .unwrap();
        let source = RasterSource::new(
            image,
            Bounds::new(-29.9, -30.2, -51.0, -51.3),
            RasterOptions {
                grid_size: 3,
                ..RasterOptions::default()
            },
        );
        ZoneCatalog::build(&ZoneSource::Raster(source), &ClassTable::standard()).unwrap()
    }

    /// Statistics with means B = 25, D = 27, 6 = 30.
    pub fn statistics() -> StatisticsTable {
        let samples: Vec<Sample> = [("B", 24.0), ("B", 26.0), ("D", 27.0), ("6", 30.0)]
            .into_iter()
            .map(|(class, temp)| Sample::with_class(0.0, 0.0, temp, class.into()))
            .collect();
        aggregate(&samples, &ClassTable::standard())
    }
}
