//! The statistics aggregator and its result table.

use std::collections::BTreeMap;

use lcz_map_zone::ClassTable;
use lcz_map_zone_models::{ClassLabel, Sample, ZoneStatistics};
use serde::Serialize;

/// Per-class statistics, ordered by mean temperature (hottest first), then
/// by label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsTable {
    baseline: ClassLabel,
    rows: Vec<ZoneStatistics>,
}

impl StatisticsTable {
    /// All rows in table order.
    #[must_use]
    pub fn rows(&self) -> &[ZoneStatistics] {
        &self.rows
    }

    /// The class observed deltas are measured against.
    #[must_use]
    pub const fn baseline(&self) -> &ClassLabel {
        &self.baseline
    }

    /// Number of classes with data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no sample was attributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a class.
    #[must_use]
    pub fn get(&self, class: &ClassLabel) -> Option<&ZoneStatistics> {
        self.rows.iter().find(|row| &row.class == class)
    }

    /// Mean temperature of a class.
    #[must_use]
    pub fn mean_of(&self, class: &ClassLabel) -> Option<f64> {
        self.get(class).map(|row| row.mean_temp)
    }

    /// Row of the baseline class, if it has data.
    #[must_use]
    pub fn baseline_row(&self) -> Option<&ZoneStatistics> {
        self.get(&self.baseline)
    }

    /// Class with the highest mean temperature.
    #[must_use]
    pub fn hottest(&self) -> Option<&ZoneStatistics> {
        self.rows.first()
    }

    /// Class with the lowest mean temperature.
    #[must_use]
    pub fn coldest(&self) -> Option<&ZoneStatistics> {
        self.rows.last()
    }

    /// Difference between the hottest and coldest class means.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        Some(self.hottest()?.mean_temp - self.coldest()?.mean_temp)
    }
}

/// Aggregates samples against the class table's own baseline.
#[must_use]
pub fn aggregate(samples: &[Sample], classes: &ClassTable) -> StatisticsTable {
    aggregate_with_baseline(samples, classes, classes.baseline())
}

/// Aggregates samples, measuring observed deltas against `baseline`.
///
/// Samples without a class or with a non-finite temperature are excluded.
/// Classes missing from `classes` still get a row, with `None` metadata.
/// When the baseline class has no samples, every observed delta is `None`.
#[must_use]
pub fn aggregate_with_baseline(
    samples: &[Sample],
    classes: &ClassTable,
    baseline: &ClassLabel,
) -> StatisticsTable {
    let mut groups: BTreeMap<&ClassLabel, Vec<f64>> = BTreeMap::new();
    let mut skipped = 0_usize;

    for sample in samples {
        let Some(class) = &sample.class else {
            skipped += 1;
            continue;
        };
        if !sample.temperature.is_finite() {
            log::debug!(
                "Ignoring non-finite temperature at ({}, {})",
                sample.lat,
                sample.lon
            );
            skipped += 1;
            continue;
        }
        groups.entry(class).or_default().push(sample.temperature);
    }

    let baseline_mean = groups.get(baseline).map(|temps| mean(temps));
    if baseline_mean.is_none() && !groups.is_empty() {
        log::warn!("Baseline class {baseline} has no samples; observed deltas are unavailable");
    }

    let mut rows: Vec<ZoneStatistics> = groups
        .into_iter()
        .map(|(class, temps)| {
            let mean_temp = mean(&temps);
            let definition = classes.get(class);
            ZoneStatistics {
                class: class.clone(),
                mean_temp,
                std_temp: sample_std(&temps, mean_temp),
                min_temp: temps.iter().copied().fold(f64::INFINITY, f64::min),
                max_temp: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                count: temps.len(),
                description: definition.map(|d| d.name.clone()),
                temp_delta_expected: definition.map(|d| d.thermal_offset),
                temp_delta_observed: baseline_mean.map(|b| mean_temp - b),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.mean_temp
            .total_cmp(&a.mean_temp)
            .then_with(|| a.class.cmp(&b.class))
    });

    log::info!(
        "Aggregated {} classes from {} samples ({} excluded)",
        rows.len(),
        samples.len(),
        skipped
    );

    StatisticsTable {
        baseline: baseline.clone(),
        rows,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with Bessel's correction; `None` below two
/// values.
#[allow(clippy::cast_precision_loss)]
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(class: Option<&str>, temperature: f64) -> Sample {
        Sample {
            lat: 0.0,
            lon: 0.0,
            temperature,
            class: class.map(ClassLabel::new),
        }
    }

    fn example_samples() -> Vec<Sample> {
        vec![
            sample(Some("D"), 27.0),
            sample(Some("D"), 29.0),
            sample(Some("A"), 24.0),
        ]
    }

    #[test]
    fn computes_documented_example() {
        let table = aggregate(&example_samples(), &ClassTable::standard());
        assert_eq!(table.len(), 2);

        let d = table.get(&ClassLabel::new("D")).unwrap();
        assert!((d.mean_temp - 28.0).abs() < 1e-12);
        assert_eq!(d.count, 2);
        assert!((d.std_temp.unwrap() - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert!(d.temp_delta_observed.unwrap().abs() < 1e-12);
        assert_eq!(d.description.as_deref(), Some("Low plants"));

        let a = table.get(&ClassLabel::new("A")).unwrap();
        assert!((a.mean_temp - 24.0).abs() < 1e-12);
        assert_eq!(a.count, 1);
        assert_eq!(a.std_temp, None, "a single sample has no deviation");
        assert!((a.temp_delta_observed.unwrap() - -4.0).abs() < 1e-12);
        assert!((a.temp_delta_expected.unwrap() - -1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn orders_by_mean_then_label() {
        let samples = vec![
            sample(Some("B"), 25.0),
            sample(Some("2"), 30.0),
            sample(Some("A"), 25.0),
            sample(Some("D"), 26.0),
        ];
        let table = aggregate(&samples, &ClassTable::standard());
        let order: Vec<&str> = table.rows().iter().map(|r| r.class.as_str()).collect();
        assert_eq!(order, ["2", "D", "A", "B"]);
        assert_eq!(table.hottest().unwrap().class.as_str(), "2");
        assert_eq!(table.coldest().unwrap().class.as_str(), "B");
        assert!((table.spread().unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn excludes_unclassified_samples() {
        let mut samples = example_samples();
        samples.push(sample(None, 99.0));
        samples.push(sample(Some("A"), f64::NAN));
        let table = aggregate(&samples, &ClassTable::standard());
        assert_eq!(table.rows().iter().map(|r| r.count).sum::<usize>(), 3);
        assert!(table.rows().iter().all(|r| r.max_temp < 99.0));
    }

    #[test]
    fn missing_baseline_nulls_every_observed_delta() {
        let samples = vec![sample(Some("A"), 24.0), sample(Some("2"), 30.0)];
        let table = aggregate(&samples, &ClassTable::standard());
        assert!(table.baseline_row().is_none());
        assert!(table.rows().iter().all(|r| r.temp_delta_observed.is_none()));
    }

    #[test]
    fn unknown_class_has_null_metadata() {
        let samples = vec![sample(Some("Z"), 24.0)];
        let table = aggregate(&samples, &ClassTable::standard());
        let z = table.get(&ClassLabel::new("Z")).unwrap();
        assert_eq!(z.description, None);
        assert_eq!(z.temp_delta_expected, None);
        assert!((z.min_temp - 24.0).abs() < f64::EPSILON);
        assert!((z.max_temp - 24.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let samples = example_samples();
        let classes = ClassTable::standard();
        assert_eq!(aggregate(&samples, &classes), aggregate(&samples, &classes));
    }

    #[test]
    fn custom_baseline() {
        let table = aggregate_with_baseline(
            &example_samples(),
            &ClassTable::standard(),
            &ClassLabel::new("A"),
        );
        let d = table.get(&ClassLabel::new("D")).unwrap();
        assert!((d.temp_delta_observed.unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = aggregate(&[], &ClassTable::standard());
        assert!(table.is_empty());
        assert_eq!(table.spread(), None);
    }
}
