//! Scenario simulation over a catalog and its statistics.

use std::collections::BTreeMap;

use lcz_map_analytics::StatisticsTable;
use lcz_map_zone::ZoneCatalog;
use lcz_map_zone_models::{
    ClassLabel, ImpactBand, PairSimulation, ScenarioKind, ScenarioResult, ZoneChangeResult,
    join_labels,
};
use serde::{Deserialize, Serialize};

use crate::{ScenarioError, ThermalDeltaModel};

/// An area conversion to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionScenario {
    /// Presentational flavor.
    pub kind: ScenarioKind,
    /// Classes being converted.
    pub source_classes: Vec<ClassLabel>,
    /// Class the area is converted to.
    pub target_class: ClassLabel,
    /// Fraction of the source area converted, in `[0, 1]`.
    pub conversion_rate: f64,
}

impl ConversionScenario {
    /// Vegetation to built area.
    #[must_use]
    pub fn intensification(sources: &[&str], target: &str, rate: f64) -> Self {
        Self::new(ScenarioKind::Intensification, sources, target, rate)
    }

    /// Built area to vegetation.
    #[must_use]
    pub fn greening(sources: &[&str], target: &str, rate: f64) -> Self {
        Self::new(ScenarioKind::Greening, sources, target, rate)
    }

    fn new(kind: ScenarioKind, sources: &[&str], target: &str, rate: f64) -> Self {
        Self {
            kind,
            source_classes: sources.iter().map(|s| ClassLabel::new(s)).collect(),
            target_class: ClassLabel::new(target),
            conversion_rate: rate,
        }
    }
}

/// A hypothetical class change of one zone, for bulk pair simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneClassChange {
    /// Catalog zone id.
    pub zone_id: usize,
    /// Current class.
    pub from: ClassLabel,
    /// New class.
    pub to: ClassLabel,
}

impl ZoneClassChange {
    /// Creates a change.
    #[must_use]
    pub fn new(zone_id: usize, from: &str, to: &str) -> Self {
        Self {
            zone_id,
            from: ClassLabel::new(from),
            to: ClassLabel::new(to),
        }
    }
}

/// Predicts temperature effects of class conversions.
///
/// Borrows the catalog, statistics and offset model of one analysis; it
/// holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioSimulator<'a> {
    catalog: &'a ZoneCatalog,
    statistics: &'a StatisticsTable,
    model: &'a ThermalDeltaModel,
}

impl<'a> ScenarioSimulator<'a> {
    /// Creates a simulator.
    #[must_use]
    pub const fn new(
        catalog: &'a ZoneCatalog,
        statistics: &'a StatisticsTable,
        model: &'a ThermalDeltaModel,
    ) -> Self {
        Self {
            catalog,
            statistics,
            model,
        }
    }

    /// Simulates converting a share of the source classes' area to the
    /// target class, using observed class temperatures.
    ///
    /// The source temperature is the unweighted mean of the source
    /// classes' means; classes without statistics are left out of it.
    ///
    /// # Errors
    ///
    /// * [`ScenarioError::InvalidRate`] if the rate is outside `[0, 1]`
    /// * [`ScenarioError::EmptySources`] if no source class is given
    /// * [`ScenarioError::NoSourceZones`] if no zone has a source class
    /// * [`ScenarioError::MissingTargetStatistics`] if the target has no data
    /// * [`ScenarioError::MissingSourceStatistics`] if no source has data
    pub fn simulate_conversion(
        &self,
        scenario: &ConversionScenario,
    ) -> Result<ScenarioResult, ScenarioError> {
        let rate = scenario.conversion_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ScenarioError::InvalidRate { rate });
        }
        if scenario.source_classes.is_empty() {
            return Err(ScenarioError::EmptySources);
        }

        let sources = &scenario.source_classes;
        let (zones_affected, source_area) = self
            .catalog
            .zones_in_classes(sources)
            .fold((0_usize, 0.0_f64), |(n, area), zone| (n + 1, area + zone.area_km2));
        if zones_affected == 0 {
            return Err(ScenarioError::NoSourceZones {
                classes: join_labels(sources),
            });
        }

        let target_temp = self.statistics.mean_of(&scenario.target_class).ok_or_else(|| {
            ScenarioError::MissingTargetStatistics {
                class: scenario.target_class.to_string(),
            }
        })?;

        let source_temps: Vec<f64> = sources
            .iter()
            .filter_map(|class| self.statistics.mean_of(class))
            .collect();
        if source_temps.is_empty() {
            return Err(ScenarioError::MissingSourceStatistics {
                classes: join_labels(sources),
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let avg_source_temp = source_temps.iter().sum::<f64>() / source_temps.len() as f64;

        let expected_change = (target_temp - avg_source_temp) * rate;
        let result = ScenarioResult {
            kind: scenario.kind,
            source_classes: sources.clone(),
            target_class: scenario.target_class.clone(),
            conversion_rate: rate,
            affected_area_km2: source_area * rate,
            zones_affected,
            avg_source_temp,
            target_temp,
            expected_change,
            band: ImpactBand::from_delta(expected_change),
        };

        log::info!(
            "{} {} -> {} at {:.0}%: {:.2} km², {:+.2}°C ({})",
            result.kind,
            join_labels(sources),
            result.target_class,
            rate * 100.0,
            result.affected_area_km2,
            result.expected_change,
            result.band
        );

        Ok(result)
    }

    /// Literature-only point conversion; see [`ThermalDeltaModel::simulate_pair`].
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownClass`] if either class is not defined.
    pub fn simulate_pair(
        &self,
        from: &ClassLabel,
        to: &ClassLabel,
        base_temperature: f64,
    ) -> Result<PairSimulation, ScenarioError> {
        Ok(self.model.simulate_pair(from, to, base_temperature)?)
    }

    /// Literature-only conversion of many zones at once; see
    /// [`ThermalDeltaModel::apply_changes`].
    #[must_use]
    pub fn simulate_pairs_bulk(
        &self,
        changes: &[ZoneClassChange],
        temperatures: &BTreeMap<usize, f64>,
    ) -> BTreeMap<usize, f64> {
        self.model.apply_changes(changes, temperatures)
    }

    /// Simulates changing one zone's class, using observed class
    /// temperatures.
    ///
    /// # Errors
    ///
    /// * [`ScenarioError::UnknownZone`] if the zone id is not in the catalog
    /// * [`ScenarioError::MissingSourceStatistics`] if the zone's current
    ///   class has no data
    /// * [`ScenarioError::MissingTargetStatistics`] if the new class has no
    ///   data
    pub fn simulate_zone_change(
        &self,
        zone_id: usize,
        new_class: &ClassLabel,
    ) -> Result<ZoneChangeResult, ScenarioError> {
        let zone = self
            .catalog
            .zone(zone_id)
            .ok_or(ScenarioError::UnknownZone { zone_id })?;

        let old_temp = self.statistics.mean_of(&zone.class).ok_or_else(|| {
            ScenarioError::MissingSourceStatistics {
                classes: zone.class.to_string(),
            }
        })?;
        let new_temp = self.statistics.mean_of(new_class).ok_or_else(|| {
            ScenarioError::MissingTargetStatistics {
                class: new_class.to_string(),
            }
        })?;

        Ok(ZoneChangeResult {
            zone_id,
            old_class: zone.class.clone(),
            new_class: new_class.clone(),
            old_temp,
            new_temp,
            temp_change: new_temp - old_temp,
            area_km2: zone.area_km2,
            centroid: zone.centroid,
        })
    }

    /// Runs several scenarios, skipping those that lack data.
    ///
    /// Invalid scenarios are skipped as well; every skip is logged.
    #[must_use]
    pub fn run_all(&self, scenarios: &[ConversionScenario]) -> Vec<ScenarioResult> {
        scenarios
            .iter()
            .enumerate()
            .filter_map(|(i, scenario)| match self.simulate_conversion(scenario) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Scenario {} could not be simulated: {e}", i + 1);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn area_of(catalog: &ZoneCatalog, classes: &[&str]) -> f64 {
        let labels: Vec<ClassLabel> = classes.iter().map(|c| ClassLabel::new(c)).collect();
        catalog.zones_in_classes(&labels).map(|z| z.area_km2).sum()
    }

    #[test]
    fn conversion_uses_unweighted_source_means() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let result = sim
            .simulate_conversion(&ConversionScenario::intensification(&["B", "D"], "6", 0.3))
            .unwrap();

        assert_eq!(result.zones_affected, 6);
        assert!((result.avg_source_temp - 26.0).abs() < 1e-12);
        assert!((result.target_temp - 30.0).abs() < 1e-12);
        assert!((result.expected_change - 1.2).abs() < 1e-12);
        assert_eq!(result.band, ImpactBand::ModerateWarming);
        let expected_area = area_of(&catalog, &["B", "D"]) * 0.3;
        assert!((result.affected_area_km2 - expected_area).abs() < 1e-9);
    }

    #[test]
    fn greening_differs_only_in_kind() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let green = sim
            .simulate_conversion(&ConversionScenario::greening(&["6"], "B", 0.5))
            .unwrap();
        let urban = sim
            .simulate_conversion(&ConversionScenario::intensification(&["6"], "B", 0.5))
            .unwrap();
        assert_eq!(green.kind, ScenarioKind::Greening);
        assert!((green.expected_change - urban.expected_change).abs() < f64::EPSILON);
        assert!((green.expected_change - -2.5).abs() < 1e-12);
        assert_eq!(green.band, ImpactBand::SignificantCooling);
    }

    #[test]
    fn sources_without_statistics_are_left_out_of_the_mean() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let result = sim
            .simulate_conversion(&ConversionScenario::intensification(&["B", "A"], "6", 1.0))
            .unwrap();
        assert!((result.avg_source_temp - 25.0).abs() < 1e-12);
        assert_eq!(result.zones_affected, 3);
    }

    #[test]
    fn rejects_invalid_input() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let err = sim
            .simulate_conversion(&ConversionScenario::intensification(&["B"], "6", 1.5))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidRate { .. }));
        assert!(!err.is_insufficient_data());

        let err = sim
            .simulate_conversion(&ConversionScenario::intensification(&[], "6", 0.5))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::EmptySources));
    }

    #[test]
    fn reports_insufficient_data() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let err = sim
            .simulate_conversion(&ConversionScenario::greening(&["2", "3"], "A", 0.4))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::NoSourceZones { .. }));

        let err = sim
            .simulate_conversion(&ConversionScenario::greening(&["6"], "A", 0.4))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::MissingTargetStatistics { .. }));
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn missing_source_statistics() {
        let catalog = testing::catalog();
        let samples = vec![lcz_map_zone_models::Sample::with_class(
            0.0,
            0.0,
            30.0,
            ClassLabel::new("6"),
        )];
        let stats = lcz_map_analytics::aggregate(&samples, &lcz_map_zone::ClassTable::standard());
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let err = sim
            .simulate_conversion(&ConversionScenario::intensification(&["B", "D"], "6", 0.3))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::MissingSourceStatistics { .. }));
    }

    #[test]
    fn zone_change_uses_observed_means() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let zone = catalog
            .zones()
            .iter()
            .find(|z| z.class.as_str() == "6")
            .unwrap();
        let result = sim.simulate_zone_change(zone.id, &ClassLabel::new("B")).unwrap();
        assert!((result.old_temp - 30.0).abs() < 1e-12);
        assert!((result.new_temp - 25.0).abs() < 1e-12);
        assert!((result.temp_change - -5.0).abs() < 1e-12);
        assert!((result.area_km2 - zone.area_km2).abs() < f64::EPSILON);

        assert!(matches!(
            sim.simulate_zone_change(999, &ClassLabel::new("B")),
            Err(ScenarioError::UnknownZone { zone_id: 999 })
        ));
        assert!(matches!(
            sim.simulate_zone_change(zone.id, &ClassLabel::new("G")),
            Err(ScenarioError::MissingTargetStatistics { .. })
        ));
    }

    #[test]
    fn pair_delegates_to_the_model() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let result = sim
            .simulate_pair(&ClassLabel::new("A"), &ClassLabel::new("2"), 23.0)
            .unwrap();
        assert!((result.new_temperature - 28.0).abs() < 1e-12);
        assert!(matches!(
            sim.simulate_pair(&ClassLabel::new("A"), &ClassLabel::new("99"), 23.0),
            Err(ScenarioError::UnknownClass(_))
        ));
    }

    #[test]
    fn run_all_skips_failures() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        let results = sim.run_all(&[
            ConversionScenario::intensification(&["B", "D"], "6", 0.3),
            ConversionScenario::greening(&["2"], "A", 0.4),
            ConversionScenario::greening(&["6"], "D", 0.2),
        ]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].target_class.as_str(), "D");
    }
}
