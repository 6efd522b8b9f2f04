//! Deterministic sampling points and synthetic temperature samples.
//!
//! Both generators draw from a [`StdRng`] seeded from
//! [`SamplingConfig::seed`] and walk the catalog in zone id order, so the
//! same catalog and configuration always produce the same output.

use std::f64::consts::TAU;

use lcz_map_zone::{ClassTable, Zone, ZoneCatalog};
use lcz_map_zone_models::{LatLon, Sample};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::{SamplingConfig, SyntheticConfig};

/// Draws from `N(0, std_dev)` using the Box-Muller transform.
fn normal(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    // `1 - u` keeps the logarithm argument in (0, 1].
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    std_dev * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Points for one zone: the centroid, then up to `points_per_zone - 1`
/// rejection-sampled interior points.
fn zone_points(zone: &Zone, config: &SamplingConfig, rng: &mut StdRng) -> Vec<LatLon> {
    let mut points = vec![zone.centroid];
    let extra = config.points_per_zone.saturating_sub(1);

    let Some(bounds) = zone.geometry.bounds().filter(|b| b.is_valid()) else {
        return points;
    };
    let has_extent = bounds.lat_span() > 0.0 && bounds.lon_span() > 0.0;
    if !has_extent {
        return points;
    }

    for _ in 0..extra {
        for _ in 0..config.max_attempts {
            let lat = rng.random_range(bounds.south..=bounds.north);
            let lon = rng.random_range(bounds.west..=bounds.east);
            if zone.geometry.contains(lat, lon) {
                points.push(LatLon::new(lat, lon));
                break;
            }
        }
    }

    points
}

/// Generates sampling points for every zone in the catalog.
///
/// Each zone contributes its centroid plus up to `points_per_zone - 1`
/// points drawn uniformly from its bounding box and kept only when inside
/// the zone. A point that is not found within `max_attempts` draws is
/// skipped, so thin or concave zones may contribute fewer points.
#[must_use]
pub fn sampling_points(catalog: &ZoneCatalog, config: &SamplingConfig) -> Vec<LatLon> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let points: Vec<LatLon> = catalog
        .zones()
        .iter()
        .flat_map(|zone| zone_points(zone, config, &mut rng))
        .collect();

    log::debug!(
        "Generated {} sampling points for {} zones",
        points.len(),
        catalog.len()
    );
    points
}

/// Generates synthetic temperature samples for demonstration runs.
///
/// Every zone gets `points_per_zone` samples scattered around its centroid
/// with `N(0, position_jitter)` degrees of noise. Temperatures are
/// `base_temperature` plus the class offset plus `N(0, temperature_noise)`,
/// rounded to 0.1 °C. Samples carry no class; attribution assigns it.
#[must_use]
pub fn synthetic_samples(
    catalog: &ZoneCatalog,
    classes: &ClassTable,
    sampling: &SamplingConfig,
    synthetic: &SyntheticConfig,
) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(sampling.seed);
    let mut samples = Vec::with_capacity(catalog.len() * sampling.points_per_zone);

    for zone in catalog.zones() {
        let offset = classes
            .get(&zone.class)
            .map_or(0.0, |definition| definition.thermal_offset);

        for _ in 0..sampling.points_per_zone {
            let lat = zone.centroid.lat + normal(&mut rng, synthetic.position_jitter);
            let lon = zone.centroid.lon + normal(&mut rng, synthetic.position_jitter);
            let temperature = synthetic.base_temperature
                + offset
                + normal(&mut rng, synthetic.temperature_noise);
            samples.push(Sample::new(lat, lon, (temperature * 10.0).round() / 10.0));
        }
    }

    log::info!(
        "Generated {} synthetic samples across {} zones",
        samples.len(),
        catalog.len()
    );
    samples
}
