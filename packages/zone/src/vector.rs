//! Vector ingestion: named layers of labeled polygon placemarks.
//!
//! The in-memory [`VectorDocument`] is produced by the KML front end
//! ([`crate::kml::parse_kml`]) or the `GeoJSON` front end
//! ([`crate::export::parse_geojson`]).

use std::sync::LazyLock;

use geo::{BoundingRect, Polygon};
use lcz_map_zone_models::{BackendKind, Bounds, ClassLabel};
use regex::Regex;

use crate::{
    ClassTable, ZoneError,
    catalog::{IngestReport, Ingested, Zone, ZoneBackend},
    geometry::ZoneGeometry,
};

/// Leading class token of a label: an optional `LCZ` prefix, then a one or
/// two digit code or a single letter standing on its own.
static CLASS_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[Ll][Cc][Zz])?[\s_\-:]*([0-9]{1,2}|[A-Za-z])(?:[^0-9A-Za-z]|$)")
        .unwrap_or_else(|_| unreachable!())
});

/// A labeled boundary with one or more polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    /// Placemark label, e.g. `"LCZ 2 - Compact midrise"` or `"A"`.
    pub name: Option<String>,
    /// Polygons with holes; several entries form a multi-polygon.
    pub polygons: Vec<Polygon<f64>>,
}

/// A named group of placemarks (a KML folder or `GeoJSON` layer property).
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    /// Layer name. When it resolves to a class, every placemark in the
    /// layer takes that class.
    pub name: Option<String>,
    /// Placemarks in document order.
    pub placemarks: Vec<Placemark>,
}

/// Parsed vector source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorDocument {
    /// Layers in document order.
    pub layers: Vec<VectorLayer>,
}

impl VectorDocument {
    /// Total number of placemarks across all layers.
    #[must_use]
    pub fn placemark_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.placemarks.len()).sum()
    }
}

/// Resolves free text (a layer or placemark name) to a known class.
///
/// The whole trimmed text is tried first, then its leading class token.
#[must_use]
pub fn resolve_label(raw: &str, classes: &ClassTable) -> Option<ClassLabel> {
    if let Some(label) = classes.resolve(raw) {
        return Some(label);
    }
    CLASS_TOKEN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|token| classes.resolve(token.as_str()))
}

impl ZoneBackend for VectorDocument {
    fn kind(&self) -> BackendKind {
        BackendKind::Vector
    }

    fn parse(&self, classes: &ClassTable) -> Result<Ingested, ZoneError> {
        let mut zones = Vec::new();
        let mut report = IngestReport::default();
        let mut with_geometry = 0_usize;

        for layer in &self.layers {
            let layer_class = layer
                .name
                .as_deref()
                .and_then(|name| resolve_label(name, classes));

            for placemark in &layer.placemarks {
                report.candidates += 1;
                let label = placemark.name.as_deref().unwrap_or("<unnamed>");

                let geometry = ZoneGeometry::from_polygons(placemark.polygons.clone());
                if geometry.is_empty() {
                    log::warn!("Dropping placemark '{label}': no valid polygon geometry");
                    report.dropped_invalid += 1;
                    continue;
                }
                with_geometry += 1;

                let class = layer_class.clone().or_else(|| {
                    placemark
                        .name
                        .as_deref()
                        .and_then(|name| resolve_label(name, classes))
                });
                let Some(class) = class else {
                    log::warn!("Dropping placemark '{label}': could not resolve an LCZ class");
                    report.dropped_unresolved += 1;
                    continue;
                };

                match Zone::new(zones.len(), class, placemark.name.clone(), geometry) {
                    Some(zone) => zones.push(zone),
                    None => {
                        log::warn!("Dropping placemark '{label}': geometry has no centroid");
                        report.dropped_invalid += 1;
                    }
                }
            }
        }

        if with_geometry == 0 {
            return Err(ZoneError::format(format!(
                "none of {} placemarks has valid polygon geometry",
                report.candidates
            )));
        }

        Ok(Ingested { zones, report })
    }

    fn bounds(&self) -> Option<Bounds> {
        self.layers
            .iter()
            .flat_map(|layer| &layer.placemarks)
            .flat_map(|placemark| &placemark.polygons)
            .filter_map(|polygon| polygon.bounding_rect())
            .map(|rect| Bounds::new(rect.max().y, rect.min().y, rect.max().x, rect.min().x))
            .reduce(|acc, b| acc.union(&b))
    }
}
