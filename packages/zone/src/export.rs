//! `GeoJSON` export of a zone catalog, and the `GeoJSON` vector front end.
//!
//! Exported features carry the zone class under `lcz_class`, which is the
//! same property [`parse_geojson`] reads back, so an exported catalog can be
//! re-ingested through the vector backend.

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue, feature::Id};

use crate::{
    ClassTable, ZoneCatalog, ZoneError,
    vector::{Placemark, VectorDocument, VectorLayer},
};

/// Property holding the zone class.
const CLASS_PROPERTY: &str = "lcz_class";
/// Fallback class property used by layer-style exports.
const LAYER_PROPERTY: &str = "layer";
/// Property holding the zone label.
const NAME_PROPERTY: &str = "name";

/// Converts the catalog into a WGS84 `FeatureCollection`.
///
/// Each feature carries `zone_id`, `name`, `lcz_class`, `lcz_description`,
/// `temp_delta_expected`, `area_km2`, `centroid_lat` and `centroid_lon`.
#[must_use]
pub fn to_feature_collection(catalog: &ZoneCatalog, classes: &ClassTable) -> FeatureCollection {
    let features = catalog
        .zones()
        .iter()
        .map(|zone| {
            let definition = classes.get(&zone.class);

            let mut properties = JsonObject::new();
            properties.insert("zone_id".to_owned(), JsonValue::from(zone.id));
            properties.insert(
                NAME_PROPERTY.to_owned(),
                zone.name.clone().map_or(JsonValue::Null, JsonValue::from),
            );
            properties.insert(
                CLASS_PROPERTY.to_owned(),
                JsonValue::from(zone.class.as_str()),
            );
            properties.insert(
                "lcz_description".to_owned(),
                definition.map_or(JsonValue::Null, |d| JsonValue::from(d.name.as_str())),
            );
            properties.insert(
                "temp_delta_expected".to_owned(),
                definition.map_or(JsonValue::Null, |d| JsonValue::from(d.thermal_offset)),
            );
            properties.insert("area_km2".to_owned(), JsonValue::from(zone.area_km2));
            properties.insert(
                "centroid_lat".to_owned(),
                JsonValue::from(zone.centroid.lat),
            );
            properties.insert(
                "centroid_lon".to_owned(),
                JsonValue::from(zone.centroid.lon),
            );

            let multi_polygon = zone.geometry.to_multi_polygon();
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&multi_polygon))),
                id: Some(Id::Number(zone.id.into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Serializes the catalog as pretty-printed `GeoJSON`.
///
/// # Errors
///
/// Returns [`ZoneError::Json`] if serialization fails.
pub fn to_geojson_string(catalog: &ZoneCatalog, classes: &ClassTable) -> Result<String, ZoneError> {
    let collection = to_feature_collection(catalog, classes);
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// Parses a `GeoJSON` feature collection (or single feature) into a vector
/// document.
///
/// Consecutive features with the same `lcz_class` (or `layer`) property
/// share one layer named after that value, so feature order is kept.
/// Features without polygon geometry become placemarks with no polygons,
/// which the vector backend counts as invalid.
///
/// # Errors
///
/// Returns [`ZoneError::GeoJson`] if the text is not valid `GeoJSON`, or
/// [`ZoneError::Format`] if it is a bare geometry.
pub fn parse_geojson(text: &str) -> Result<VectorDocument, ZoneError> {
    let geojson: GeoJson = text.parse()?;
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(ZoneError::format(
                "expected a GeoJSON Feature or FeatureCollection, found a bare geometry",
            ));
        }
    };

    let mut layers: Vec<VectorLayer> = Vec::new();
    for feature in features {
        let layer_name =
            string_property(&feature, CLASS_PROPERTY).or_else(|| string_property(&feature, LAYER_PROPERTY));
        let placemark = Placemark {
            name: string_property(&feature, NAME_PROPERTY),
            polygons: feature
                .geometry
                .and_then(|geometry| polygons_of(geometry).map(|mp| mp.0))
                .unwrap_or_default(),
        };

        match layers.last_mut() {
            Some(layer) if layer.name == layer_name => layer.placemarks.push(placemark),
            _ => layers.push(VectorLayer {
                name: layer_name,
                placemarks: vec![placemark],
            }),
        }
    }

    Ok(VectorDocument { layers })
}

/// Reads a property as text; numbers are formatted, other types ignored.
fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn polygons_of(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;
    use crate::{
        RasterImage, RasterOptions, RasterSource, ZoneSource,
    };
    use lcz_map_zone_models::{Bounds, Rgb};

    fn vector_catalog() -> ZoneCatalog {
        let square = |west: f64, size: f64| {
            polygon![
                (x: west, y: -30.0),
                (x: west + size, y: -30.0),
                (x: west + size, y: -30.0 + size),
                (x: west, y: -30.0 + size),
            ]
        };
        let doc = VectorDocument {
            layers: vec![VectorLayer {
                name: None,
                placemarks: vec![
                    Placemark {
                        name: Some("A".to_owned()),
                        polygons: vec![square(-51.2, 0.01)],
                    },
                    Placemark {
                        name: Some("2 downtown".to_owned()),
                        polygons: vec![square(-51.18, 0.02), square(-51.1, 0.005)],
                    },
                    Placemark {
                        name: Some("A".to_owned()),
                        polygons: vec![square(-51.15, 0.01)],
                    },
                ],
            }],
        };
        ZoneCatalog::build(&ZoneSource::Vector(doc), &ClassTable::standard()).unwrap()
    }

    fn raster_catalog() -> ZoneCatalog {
        let image = RasterImage::new(
            2,
            1,
            vec![Rgb::new(0x6A, 0x6A, 0xFF), Rgb::new(0xB9, 0xDB, 0x79)],
        )
        .unwrap();
        let source = RasterSource::new(
            image,
            Bounds::new(-29.9, -30.1, -51.0, -51.2),
            RasterOptions {
                grid_size: 2,
                ..RasterOptions::default()
            },
        );
        ZoneCatalog::build(&ZoneSource::Raster(source), &ClassTable::standard()).unwrap()
    }

    fn assert_round_trip(catalog: &ZoneCatalog) {
        let classes = ClassTable::standard();
        let text = to_geojson_string(catalog, &classes).unwrap();
        let doc = parse_geojson(&text).unwrap();
        let reparsed = ZoneCatalog::build(&ZoneSource::Vector(doc), &classes).unwrap();

        assert_eq!(reparsed.len(), catalog.len());
        for (a, b) in catalog.zones().iter().zip(reparsed.zones()) {
            assert_eq!(a.class, b.class, "class of zone {}", a.id);
            assert!(
                (a.area_km2 - b.area_km2).abs() < 1e-6,
                "area of zone {}: {} vs {}",
                a.id,
                a.area_km2,
                b.area_km2
            );
            assert!((a.centroid.lat - b.centroid.lat).abs() < 1e-9);
            assert!((a.centroid.lon - b.centroid.lon).abs() < 1e-9);
        }
    }

    #[test]
    fn vector_catalog_round_trips() {
        assert_round_trip(&vector_catalog());
    }

    #[test]
    fn raster_catalog_round_trips() {
        let catalog = raster_catalog();
        assert_eq!(catalog.len(), 4);
        assert_round_trip(&catalog);
    }

    #[test]
    fn features_carry_class_metadata() {
        let collection = to_feature_collection(&vector_catalog(), &ClassTable::standard());
        assert_eq!(collection.features.len(), 3);

        let second = &collection.features[1];
        assert_eq!(second.property("lcz_class"), Some(&JsonValue::from("2")));
        assert_eq!(
            second.property("lcz_description"),
            Some(&JsonValue::from("Compact midrise"))
        );
        assert_eq!(
            second.property("temp_delta_expected"),
            Some(&JsonValue::from(3.5))
        );
        assert_eq!(second.id, Some(Id::Number(1.into())));
        assert!(second.property("centroid_lat").is_some());
    }

    #[test]
    fn keeps_feature_order_across_layers() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"layer": "B"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"lcz_class": 6, "name": "suburb"},
                 "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}},
                {"type": "Feature", "properties": {"layer": "B"},
                 "geometry": {"type": "Point", "coordinates": [0,0]}}
            ]
        }"#;
        let doc = parse_geojson(text).unwrap();
        let names: Vec<Option<&str>> = doc.layers.iter().map(|l| l.name.as_deref()).collect();
        assert_eq!(names, [Some("B"), Some("6"), Some("B")]);
        assert_eq!(doc.layers[1].placemarks[0].name.as_deref(), Some("suburb"));
        assert!(doc.layers[2].placemarks[0].polygons.is_empty());
    }

    #[test]
    fn prefixed_feature_names_build_a_catalog() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "LCZ 2 downtown"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"name": "Lcz_G river"},
                 "geometry": {"type": "Polygon", "coordinates": [[[2,0],[3,0],[3,1],[2,1],[2,0]]]}}
            ]
        }"#;
        let doc = parse_geojson(text).unwrap();
        let catalog = ZoneCatalog::build(&ZoneSource::Vector(doc), &ClassTable::standard()).unwrap();
        let labels: Vec<&str> = catalog.zones().iter().map(|z| z.class.as_str()).collect();
        assert_eq!(labels, ["2", "G"]);
    }

    #[test]
    fn rejects_bare_geometry() {
        let text = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(
            parse_geojson(text),
            Err(ZoneError::Format { .. })
        ));
        assert!(matches!(parse_geojson("not json"), Err(ZoneError::GeoJson(_))));
    }
}
