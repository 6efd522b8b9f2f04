//! Zone geometry: authored polygons or raster grid cells.

use geo::{BoundingRect, Centroid, Contains, GeodesicArea, MultiPolygon, Point, Polygon, Rect};
use lcz_map_zone_models::{Bounds, LatLon};

/// Square meters per square kilometer.
const M2_PER_KM2: f64 = 1_000_000.0;

/// Geometry of a zone in WGS84 (x = longitude, y = latitude).
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneGeometry {
    /// One or more polygons from authored vector boundaries.
    Polygons(MultiPolygon<f64>),
    /// An axis-aligned raster grid cell.
    Cell(Rect<f64>),
}

impl ZoneGeometry {
    /// Builds polygon geometry, keeping only rings that enclose an area.
    #[must_use]
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Self {
        Self::Polygons(MultiPolygon(
            polygons.into_iter().filter(is_valid_polygon).collect(),
        ))
    }

    /// Builds a grid cell covering `bounds`.
    #[must_use]
    pub fn cell(bounds: &Bounds) -> Self {
        Self::Cell(Rect::new(
            geo::coord! { x: bounds.west, y: bounds.south },
            geo::coord! { x: bounds.east, y: bounds.north },
        ))
    }

    /// Whether the geometry has no usable polygon.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Polygons(mp) => mp.0.is_empty(),
            Self::Cell(_) => false,
        }
    }

    /// Axis-aligned extent of the geometry.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Polygons(mp) => mp.bounding_rect().map(rect_bounds),
            Self::Cell(rect) => Some(rect_bounds(*rect)),
        }
    }

    /// Whether the point lies in the geometry.
    ///
    /// Polygons use strict interior containment. Cells include their edges
    /// so that a complete grid leaves no gaps between neighbours.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match self {
            Self::Polygons(mp) => mp.contains(&Point::new(lon, lat)),
            Self::Cell(rect) => {
                (rect.min().x..=rect.max().x).contains(&lon)
                    && (rect.min().y..=rect.max().y).contains(&lat)
            }
        }
    }

    /// Geodesic area on the WGS84 ellipsoid, in km².
    #[must_use]
    pub fn area_km2(&self) -> f64 {
        self.to_multi_polygon().geodesic_area_unsigned() / M2_PER_KM2
    }

    /// Planar centroid in lon/lat space.
    #[must_use]
    pub fn centroid(&self) -> Option<LatLon> {
        match self {
            Self::Polygons(mp) => mp.centroid().map(|p| LatLon::new(p.y(), p.x())),
            Self::Cell(rect) => {
                let center = rect.center();
                Some(LatLon::new(center.y, center.x))
            }
        }
    }

    /// Converts to a multi-polygon for export and area computation.
    #[must_use]
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match self {
            Self::Polygons(mp) => mp.clone(),
            Self::Cell(rect) => MultiPolygon(vec![rect.to_polygon()]),
        }
    }
}

/// A polygon is usable when its closed exterior has at least three
/// distinct vertices.
fn is_valid_polygon(polygon: &Polygon<f64>) -> bool {
    polygon.exterior().0.len() >= 4
}

fn rect_bounds(rect: Rect<f64>) -> Bounds {
    Bounds::new(rect.max().y, rect.min().y, rect.max().x, rect.min().x)
}
