#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local Climate Zone ingestion and the zone catalog.
//!
//! A [`ZoneCatalog`] is built once from either authored vector boundaries
//! (KML placemarks or `GeoJSON` features) or a color-classified raster
//! overlay. Both strategies sit behind the [`ZoneBackend`] trait and the
//! [`ZoneSource`] tagged variant, so everything downstream of the catalog
//! is backend-agnostic. The catalog is immutable after construction.

pub mod catalog;
pub mod classes;
pub mod export;
pub mod geometry;
pub mod kml;
pub mod raster;
pub mod vector;

pub use catalog::{IngestReport, Ingested, Zone, ZoneBackend, ZoneCatalog, ZoneSource};
pub use classes::ClassTable;
pub use geometry::ZoneGeometry;
pub use raster::{RasterImage, RasterOptions, RasterSource};
pub use vector::{Placemark, VectorDocument, VectorLayer};

use thiserror::Error;

/// Errors that can occur while loading classes or ingesting zones.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The ingestion source is unreadable or malformed.
    #[error("Format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The class table or ingestion options are inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl ZoneError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
