//! The standard what-if scenarios.

use crate::ConversionScenario;

/// The four standard what-if scenarios, in reporting order:
///
/// 1. moderate intensification: B, D → 6 at 30%
/// 2. intense intensification: A, B, D → 2 at 50%
/// 3. light greening: 6, 9 → B at 20%
/// 4. intense greening: 2, 3, 6 → A at 40%
#[must_use]
pub fn what_if_scenarios() -> Vec<ConversionScenario> {
    vec![
        ConversionScenario::intensification(&["B", "D"], "6", 0.3),
        ConversionScenario::intensification(&["A", "B", "D"], "2", 0.5),
        ConversionScenario::greening(&["6", "9"], "B", 0.2),
        ConversionScenario::greening(&["2", "3", "6"], "A", 0.4),
    ]
}

#[cfg(test)]
mod tests {
    use lcz_map_zone::ClassTable;
    use lcz_map_zone_models::ScenarioKind;

    use super::*;
    use crate::{ScenarioSimulator, ThermalDeltaModel, testing};

    #[test]
    fn presets_use_known_classes() {
        let classes = ClassTable::standard();
        for scenario in what_if_scenarios() {
            assert!(classes.contains(&scenario.target_class));
            assert!(scenario.source_classes.iter().all(|c| classes.contains(c)));
            assert!((0.0..=1.0).contains(&scenario.conversion_rate));
        }
    }

    #[test]
    fn presets_alternate_two_of_each_kind() {
        let kinds: Vec<ScenarioKind> = what_if_scenarios().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                ScenarioKind::Intensification,
                ScenarioKind::Intensification,
                ScenarioKind::Greening,
                ScenarioKind::Greening,
            ]
        );
    }

    #[test]
    fn presets_without_data_are_skipped() {
        let catalog = testing::catalog();
        let stats = testing::statistics();
        let model = ThermalDeltaModel::standard();
        let sim = ScenarioSimulator::new(&catalog, &stats, &model);

        // Only B, D and 6 have zones and data, so targets 2 and A are missing.
        let results = sim.run_all(&what_if_scenarios());
        let targets: Vec<&str> = results.iter().map(|r| r.target_class.as_str()).collect();
        assert_eq!(targets, ["6", "B"]);
    }
}
