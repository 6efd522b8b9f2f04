//! The zone catalog and the ingestion backend interface.

use std::collections::BTreeMap;

use lcz_map_zone_models::{BackendKind, Bounds, ClassLabel, LatLon};

use crate::{
    ClassTable, ZoneError, geometry::ZoneGeometry, raster::RasterSource, vector::VectorDocument,
};

/// A ground area of homogeneous LCZ class.
///
/// Created once during ingestion and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    /// Position of the zone in its catalog.
    pub id: usize,
    /// Resolved class; always present in the class table used for ingestion.
    pub class: ClassLabel,
    /// Source label (placemark name or grid cell name).
    pub name: Option<String>,
    /// Zone geometry.
    pub geometry: ZoneGeometry,
    /// Geodesic area in km².
    pub area_km2: f64,
    /// Geometry centroid.
    pub centroid: LatLon,
}

impl Zone {
    /// Creates a zone, computing its area and centroid.
    ///
    /// Returns `None` if the geometry is empty.
    #[must_use]
    pub fn new(
        id: usize,
        class: ClassLabel,
        name: Option<String>,
        geometry: ZoneGeometry,
    ) -> Option<Self> {
        if geometry.is_empty() {
            return None;
        }
        let centroid = geometry.centroid()?;
        let area_km2 = geometry.area_km2();

        Some(Self {
            id,
            class,
            name,
            geometry,
            area_km2,
            centroid,
        })
    }
}

/// Per-item outcome counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Placemarks or grid cells examined.
    pub candidates: usize,
    /// Items dropped because their class could not be resolved.
    pub dropped_unresolved: usize,
    /// Items dropped because they had no usable geometry.
    pub dropped_invalid: usize,
}

impl IngestReport {
    /// Total items dropped for any reason.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped_unresolved + self.dropped_invalid
    }
}

/// Zones produced by a backend, with their ingestion report.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Zones in source order, ids assigned sequentially from 0.
    pub zones: Vec<Zone>,
    /// Drop counters.
    pub report: IngestReport,
}

/// Capability set shared by the ingestion strategies.
pub trait ZoneBackend {
    /// Which strategy this is.
    fn kind(&self) -> BackendKind;

    /// Parses the source into classified zones.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Format`] if the source is structurally unusable.
    /// Individual unresolvable items are dropped and counted instead.
    fn parse(&self, classes: &ClassTable) -> Result<Ingested, ZoneError>;

    /// Geographic extent of the source itself.
    fn bounds(&self) -> Option<Bounds>;

    /// Midpoint of [`Self::bounds`].
    fn center(&self) -> Option<LatLon> {
        self.bounds().map(|b| b.center())
    }
}

/// A zone source tagged by ingestion strategy.
#[derive(Debug, Clone)]
pub enum ZoneSource {
    /// Authored vector boundaries.
    Vector(VectorDocument),
    /// A color-classified raster overlay.
    Raster(RasterSource),
}

impl ZoneBackend for ZoneSource {
    fn kind(&self) -> BackendKind {
        match self {
            Self::Vector(doc) => doc.kind(),
            Self::Raster(raster) => raster.kind(),
        }
    }

    fn parse(&self, classes: &ClassTable) -> Result<Ingested, ZoneError> {
        match self {
            Self::Vector(doc) => doc.parse(classes),
            Self::Raster(raster) => raster.parse(classes),
        }
    }

    fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Vector(doc) => doc.bounds(),
            Self::Raster(raster) => raster.bounds(),
        }
    }
}

/// Normalized, read-only collection of classified zones.
///
/// Built once per ingestion call. Every zone's class is defined in the
/// class table the catalog was built with.
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    backend: BackendKind,
    zones: Vec<Zone>,
    report: IngestReport,
}

impl ZoneCatalog {
    /// Builds a catalog from any backend.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`ZoneError`].
    pub fn build<B: ZoneBackend + ?Sized>(
        source: &B,
        classes: &ClassTable,
    ) -> Result<Self, ZoneError> {
        let backend = source.kind();
        let Ingested { zones, report } = source.parse(classes)?;

        log::info!(
            "Built {backend} zone catalog: {} zones from {} candidates ({} unresolved, {} invalid)",
            zones.len(),
            report.candidates,
            report.dropped_unresolved,
            report.dropped_invalid,
        );

        Ok(Self {
            backend,
            zones,
            report,
        })
    }

    /// Which ingestion strategy produced this catalog.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Drop counters from ingestion.
    #[must_use]
    pub const fn report(&self) -> IngestReport {
        self.report
    }

    /// All zones in catalog order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Looks up a zone by id.
    #[must_use]
    pub fn zone(&self, id: usize) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether every candidate was dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Union of all zone extents, or `None` for an empty catalog.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.zones
            .iter()
            .filter_map(|zone| zone.geometry.bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    /// Midpoint of [`Self::bounds`].
    ///
    /// A cheap approximation, not the area-weighted centroid.
    #[must_use]
    pub fn center(&self) -> Option<LatLon> {
        self.bounds().map(|b| b.center())
    }

    /// Distinct classes present, in natural label order.
    #[must_use]
    pub fn classes(&self) -> Vec<ClassLabel> {
        self.area_by_class().into_keys().collect()
    }

    /// Total area per class in km².
    #[must_use]
    pub fn area_by_class(&self) -> BTreeMap<ClassLabel, f64> {
        let mut areas = BTreeMap::new();
        for zone in &self.zones {
            *areas.entry(zone.class.clone()).or_insert(0.0) += zone.area_km2;
        }
        areas
    }

    /// Total area of all zones in km².
    #[must_use]
    pub fn total_area_km2(&self) -> f64 {
        self.zones.iter().map(|zone| zone.area_km2).sum()
    }

    /// The zone with the largest area; the first one wins ties.
    #[must_use]
    pub fn largest_zone(&self) -> Option<&Zone> {
        self.zones.iter().fold(None, |best: Option<&Zone>, zone| {
            match best {
                Some(current) if zone.area_km2 <= current.area_km2 => Some(current),
                _ => Some(zone),
            }
        })
    }

    /// Zones whose class is one of `classes`, in catalog order.
    pub fn zones_in_classes<'a>(
        &'a self,
        classes: &'a [ClassLabel],
    ) -> impl Iterator<Item = &'a Zone> + 'a {
        self.zones
            .iter()
            .filter(move |zone| classes.contains(&zone.class))
    }
}
