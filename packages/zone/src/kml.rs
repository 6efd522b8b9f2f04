//! KML front end for the vector and raster backends.
//!
//! KML is parsed with the lenient HTML tree builder, which lowercases tag
//! names and tolerates the namespaced extensions found in exported files.
//! `CDATA` sections (placemark descriptions) are removed beforehand because
//! the HTML tokenizer does not understand them.

use std::sync::LazyLock;

use geo::{Coord, LineString, Polygon};
use lcz_map_zone_models::Bounds;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    ZoneError,
    vector::{Placemark, VectorDocument, VectorLayer},
};

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").unwrap_or_else(|_| unreachable!()));

static KML_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[Kk][Mm][Ll][\s>]").unwrap_or_else(|_| unreachable!()));

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!())
}

/// A `GroundOverlay`: the raster image reference and its geographic box.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundOverlay {
    /// Overlay extent from `LatLonBox`.
    pub bounds: Bounds,
    /// `Icon/href` of the overlay image, relative to the KMZ root.
    pub icon_href: Option<String>,
}

/// Parses KML placemarks into layers.
///
/// Placemarks are grouped by their nearest enclosing `Folder` (or
/// `Document`); the group's direct `name` child becomes the layer name.
/// Each `Polygon` contributes one polygon built from its outer ring and any
/// inner rings, so a `MultiGeometry` yields a multi-polygon placemark.
///
/// # Errors
///
/// Returns [`ZoneError::Format`] if the text is not a KML document.
pub fn parse_kml(kml: &str) -> Result<VectorDocument, ZoneError> {
    let document = parse_document(kml)?;

    let placemark_sel = selector("placemark");
    let polygon_sel = selector("polygon");
    let outer_sel = selector("outerboundaryis coordinates");
    let inner_sel = selector("innerboundaryis coordinates");

    let mut groups: Vec<(Option<_>, VectorLayer)> = Vec::new();

    for element in document.select(&placemark_sel) {
        let container = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| matches!(e.value().name(), "folder" | "document"));
        let key = container.map(|c| c.id());

        let mut polygons = Vec::new();
        for polygon in element.select(&polygon_sel) {
            let Some(outer) = polygon.select(&outer_sel).next() else {
                log::debug!("Skipping polygon without an outer boundary");
                continue;
            };
            let exterior = parse_coordinates(&element_text(outer));
            let interiors = polygon
                .select(&inner_sel)
                .map(|inner| parse_coordinates(&element_text(inner)))
                .collect();
            polygons.push(Polygon::new(exterior, interiors));
        }

        let placemark = Placemark {
            name: child_text(element, "name"),
            polygons,
        };

        if let Some((_, layer)) = groups.iter_mut().find(|(k, _)| *k == key) {
            layer.placemarks.push(placemark);
        } else {
            groups.push((
                key,
                VectorLayer {
                    name: container.and_then(|c| child_text(c, "name")),
                    placemarks: vec![placemark],
                },
            ));
        }
    }

    let doc = VectorDocument {
        layers: groups.into_iter().map(|(_, layer)| layer).collect(),
    };
    log::debug!(
        "Parsed KML: {} layers, {} placemarks",
        doc.layers.len(),
        doc.placemark_count()
    );

    Ok(doc)
}

/// Parses the first `GroundOverlay` of a KML document.
///
/// # Errors
///
/// Returns [`ZoneError::Format`] if the text is not KML, has no
/// `LatLonBox`, or one of its edges is missing or non-numeric.
pub fn parse_ground_overlay(kml: &str) -> Result<GroundOverlay, ZoneError> {
    let document = parse_document(kml)?;

    let Some(lat_lon_box) = document.select(&selector("latlonbox")).next() else {
        return Err(ZoneError::format("KML has no LatLonBox"));
    };

    let edge = |name: &str| -> Result<f64, ZoneError> {
        let text = child_text(lat_lon_box, name)
            .ok_or_else(|| ZoneError::format(format!("LatLonBox is missing <{name}>")))?;
        text.parse()
            .map_err(|_| ZoneError::format(format!("LatLonBox <{name}> is not a number: {text}")))
    };
    let bounds = Bounds::new(edge("north")?, edge("south")?, edge("east")?, edge("west")?);

    let icon_href = document
        .select(&selector("groundoverlay icon href"))
        .next()
        .map(element_text)
        .filter(|href| !href.is_empty());

    Ok(GroundOverlay { bounds, icon_href })
}

/// Parses only the `LatLonBox` of a KML document.
///
/// # Errors
///
/// See [`parse_ground_overlay`].
pub fn parse_lat_lon_box(kml: &str) -> Result<Bounds, ZoneError> {
    parse_ground_overlay(kml).map(|overlay| overlay.bounds)
}

fn parse_document(kml: &str) -> Result<Html, ZoneError> {
    if !KML_ROOT.is_match(kml) {
        return Err(ZoneError::format("document has no <kml> root element"));
    }
    let stripped = CDATA.replace_all(kml, "");
    Ok(Html::parse_document(&stripped))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Text of the first direct child element called `name`, if non-empty.
fn child_text(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == name)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Parses a KML coordinate list (`lon,lat[,alt]` tuples separated by
/// whitespace). Malformed tuples are skipped.
fn parse_coordinates(text: &str) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = text
        .split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let lon = parts.next()?.trim().parse::<f64>().ok()?;
            let lat = parts.next()?.trim().parse::<f64>().ok()?;
            (lon.is_finite() && lat.is_finite()).then_some(Coord { x: lon, y: lat })
        })
        .collect();
    LineString::new(coords)
}
