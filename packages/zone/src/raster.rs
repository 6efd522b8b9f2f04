//! Raster ingestion: a color-classified LCZ image over a geographic box.
//!
//! The box is split into an N×N grid regardless of pixel resolution. Each
//! cell takes the most frequent color of its pixel block and is classified
//! to the nearest class color. Row 0 of the image is the northern edge.

use std::collections::HashMap;

use lcz_map_zone_models::{BackendKind, Bounds, Rgb};
use serde::{Deserialize, Serialize};

use crate::{
    ClassTable, ZoneError,
    catalog::{IngestReport, Ingested, Zone, ZoneBackend},
    geometry::ZoneGeometry,
};

/// Default number of grid cells along each axis.
pub const DEFAULT_GRID_SIZE: usize = 50;

/// Default maximum RGB distance between a cell color and its class color.
pub const DEFAULT_COLOR_TOLERANCE: f64 = 30.0;

/// Decoded RGB image, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl RasterImage {
    /// Creates an image from row-major pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Format`] if the image is empty or the pixel
    /// count does not match the dimensions.
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, ZoneError> {
        if width == 0 || height == 0 {
            return Err(ZoneError::format(format!(
                "raster image is empty ({width}x{height})"
            )));
        }
        if width.checked_mul(height) != Some(pixels.len()) {
            return Err(ZoneError::format(format!(
                "raster image is {width}x{height} but has {} pixels",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x`, row `y`.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }
}

/// Grid resolution and color matching tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RasterOptions {
    /// Cells along each axis.
    pub grid_size: usize,
    /// Cells whose color is farther than this from every class color are
    /// dropped.
    pub color_tolerance: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            color_tolerance: DEFAULT_COLOR_TOLERANCE,
        }
    }
}

/// A classified image together with its north/south/east/west box.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    /// Decoded image.
    pub image: RasterImage,
    /// Geographic extent of the image.
    pub bounds: Bounds,
    /// Grid and tolerance settings.
    pub options: RasterOptions,
}

impl RasterSource {
    /// Creates a raster source.
    #[must_use]
    pub const fn new(image: RasterImage, bounds: Bounds, options: RasterOptions) -> Self {
        Self {
            image,
            bounds,
            options,
        }
    }

    fn validate(&self) -> Result<(), ZoneError> {
        if !self.bounds.is_valid() {
            return Err(ZoneError::format(format!(
                "raster bounding box is empty or inverted: {:?}",
                self.bounds
            )));
        }
        if self.options.grid_size == 0 {
            return Err(ZoneError::config("raster grid size must be at least 1"));
        }
        if !self.options.color_tolerance.is_finite() || self.options.color_tolerance < 0.0 {
            return Err(ZoneError::config(format!(
                "raster color tolerance must be a non-negative number, found {}",
                self.options.color_tolerance
            )));
        }
        Ok(())
    }

    /// Most frequent color in the pixel block; ties go to the color seen
    /// first in row-major scan order.
    fn mode_color(&self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> Option<Rgb> {
        let mut slots: HashMap<Rgb, usize> = HashMap::new();
        let mut counts: Vec<(Rgb, usize)> = Vec::new();

        for y in rows {
            for x in cols.clone() {
                let Some(color) = self.image.pixel(x, y) else {
                    continue;
                };
                let slot = *slots.entry(color).or_insert_with(|| {
                    counts.push((color, 0));
                    counts.len() - 1
                });
                counts[slot].1 += 1;
            }
        }

        let mut best: Option<(Rgb, usize)> = None;
        for (color, count) in counts {
            match best {
                Some((_, current)) if count <= current => {}
                _ => best = Some((color, count)),
            }
        }
        best.map(|(color, _)| color)
    }

    /// Geographic box of grid cell (`row`, `col`), row 0 at the north edge.
    #[allow(clippy::cast_precision_loss)]
    fn cell_bounds(&self, row: usize, col: usize) -> Bounds {
        let n = self.options.grid_size;
        let b = &self.bounds;
        let lat_edge = |i: usize| {
            if i == n {
                b.south
            } else {
                b.lat_span().mul_add(-(i as f64) / n as f64, b.north)
            }
        };
        let lon_edge = |i: usize| {
            if i == n {
                b.east
            } else {
                b.lon_span().mul_add(i as f64 / n as f64, b.west)
            }
        };
        Bounds::new(lat_edge(row), lat_edge(row + 1), lon_edge(col + 1), lon_edge(col))
    }
}

/// Pixel range covered by grid cell `index` of `cells` along an axis of
/// `pixels` pixels. Every cell covers at least one pixel.
fn pixel_block(index: usize, cells: usize, pixels: usize) -> std::ops::Range<usize> {
    let start = index * pixels / cells;
    let end = ((index + 1) * pixels / cells).max(start + 1).min(pixels);
    start..end
}

impl ZoneBackend for RasterSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn parse(&self, classes: &ClassTable) -> Result<Ingested, ZoneError> {
        self.validate()?;

        let n = self.options.grid_size;
        let tolerance = self.options.color_tolerance;
        let mut zones = Vec::new();
        let mut report = IngestReport::default();

        for row in 0..n {
            let rows = pixel_block(row, n, self.image.height);
            for col in 0..n {
                report.candidates += 1;
                let cols = pixel_block(col, n, self.image.width);

                let Some(color) = self.mode_color(rows.clone(), cols) else {
                    report.dropped_invalid += 1;
                    continue;
                };
                let Some((definition, distance)) = classes.nearest_color(color) else {
                    report.dropped_unresolved += 1;
                    continue;
                };
                if distance > tolerance {
                    log::debug!(
                        "Cell {row},{col}: color {} is {distance:.1} from nearest class {}",
                        color.to_hex(),
                        definition.label
                    );
                    report.dropped_unresolved += 1;
                    continue;
                }

                let label = definition.label.clone();
                let name = format!("LCZ {label} - Cell {row},{col}");
                let geometry = ZoneGeometry::cell(&self.cell_bounds(row, col));
                if let Some(zone) = Zone::new(zones.len(), label, Some(name), geometry) {
                    zones.push(zone);
                } else {
                    report.dropped_invalid += 1;
                }
            }
        }

        if report.dropped_unresolved > 0 {
            log::warn!(
                "{} of {} raster cells had no class color within {tolerance}",
                report.dropped_unresolved,
                report.candidates
            );
        }

        Ok(Ingested { zones, report })
    }

    fn bounds(&self) -> Option<Bounds> {
        Some(self.bounds)
    }
}
