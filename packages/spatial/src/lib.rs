#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for zone attribution.
//!
//! Builds an R-tree over the zone envelopes of a [`ZoneCatalog`] and
//! answers point-in-zone lookups. Used to attach an LCZ class to every
//! temperature sample before aggregation.

use lcz_map_zone::{ZoneCatalog, ZoneGeometry};
use lcz_map_zone_models::{ClassLabel, Sample};
use rstar::{AABB, RTree, RTreeObject};

/// A zone stored in the R-tree with its class.
#[derive(Debug, Clone)]
struct ZoneEntry {
    zone_id: usize,
    class: ClassLabel,
    envelope: AABB<[f64; 2]>,
    geometry: ZoneGeometry,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Outcome counts of one attribution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributionReport {
    /// Samples examined.
    pub total: usize,
    /// Samples that received a class in this pass.
    pub attributed: usize,
    /// Samples outside every zone; their class stays `None`.
    pub unattributed: usize,
    /// Samples that already carried a class and were left untouched.
    pub preassigned: usize,
}

/// R-tree over the zones of one catalog.
///
/// Owns copies of the zone geometries, so it can be shared independently
/// of the catalog it was built from.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    zones: RTree<ZoneEntry>,
}

impl SpatialIndex {
    /// Builds the index from a catalog.
    #[must_use]
    pub fn build(catalog: &ZoneCatalog) -> Self {
        let entries: Vec<ZoneEntry> = catalog
            .zones()
            .iter()
            .filter_map(|zone| {
                let Some(bounds) = zone.geometry.bounds() else {
                    log::warn!("Zone {} has no extent; leaving it out of the index", zone.id);
                    return None;
                };
                Some(ZoneEntry {
                    zone_id: zone.id,
                    class: zone.class.clone(),
                    envelope: AABB::from_corners(
                        [bounds.west, bounds.south],
                        [bounds.east, bounds.north],
                    ),
                    geometry: zone.geometry.clone(),
                })
            })
            .collect();

        let zones = RTree::bulk_load(entries);
        log::info!("Loaded {} zones into spatial index", zones.size());

        Self { zones }
    }

    /// Number of indexed zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.size()
    }

    /// Whether the index holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.size() == 0
    }

    fn locate_entry(&self, lat: f64, lon: f64) -> Option<&ZoneEntry> {
        let query_env = AABB::from_point([lon, lat]);

        // Zones can overlap; the earliest zone in catalog order wins no
        // matter what order the tree yields candidates in.
        self.zones
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.geometry.contains(lat, lon))
            .min_by_key(|entry| entry.zone_id)
    }

    /// Id of the zone containing the point, if any.
    #[must_use]
    pub fn locate(&self, lat: f64, lon: f64) -> Option<usize> {
        self.locate_entry(lat, lon).map(|entry| entry.zone_id)
    }

    /// Class of the zone containing the point, if any.
    #[must_use]
    pub fn class_at(&self, lat: f64, lon: f64) -> Option<&ClassLabel> {
        self.locate_entry(lat, lon).map(|entry| &entry.class)
    }

    /// Attaches a class to every sample that lies inside a zone.
    ///
    /// Order, length and coordinates of `samples` are preserved. Samples
    /// outside every zone keep `None`; samples that already carry a class
    /// are not touched.
    pub fn assign(&self, samples: &mut [Sample]) -> AttributionReport {
        let mut report = AttributionReport {
            total: samples.len(),
            ..AttributionReport::default()
        };

        for sample in samples.iter_mut() {
            if sample.class.is_some() {
                report.preassigned += 1;
                continue;
            }
            match self.class_at(sample.lat, sample.lon) {
                Some(class) => {
                    sample.class = Some(class.clone());
                    report.attributed += 1;
                }
                None => {
                    log::debug!(
                        "Sample at ({}, {}) is outside every zone",
                        sample.lat,
                        sample.lon
                    );
                    report.unattributed += 1;
                }
            }
        }

        if report.unattributed > 0 {
            log::warn!(
                "{} of {} samples fell outside every zone and stay unclassified",
                report.unattributed,
                report.total
            );
        }
        log::info!(
            "Attributed {} samples ({} already classified)",
            report.attributed,
            report.preassigned
        );

        report
    }
}

/// Builds a throwaway index over `catalog` and attributes `samples`.
pub fn assign(samples: &mut [Sample], catalog: &ZoneCatalog) -> AttributionReport {
    SpatialIndex::build(catalog).assign(samples)
}
