//! Literature-derived thermal offsets and pairwise deltas.

use std::collections::BTreeMap;

use lcz_map_zone::ClassTable;
use lcz_map_zone_models::{ClassLabel, ImpactBand, PairSimulation, UnknownClassError};

/// Static mapping from class to thermal offset relative to the baseline.
///
/// Unknown labels are always an error, never an offset of 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalDeltaModel {
    classes: ClassTable,
}

impl ThermalDeltaModel {
    /// Creates a model over a class table.
    #[must_use]
    pub fn new(classes: &ClassTable) -> Self {
        Self {
            classes: classes.clone(),
        }
    }

    /// Model over the standard 17-class table.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            classes: ClassTable::standard(),
        }
    }

    /// The underlying class table.
    #[must_use]
    pub const fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// Offset of a class in °C.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownClassError`] if the class is not defined.
    pub fn offset(&self, class: &ClassLabel) -> Result<f64, UnknownClassError> {
        self.classes.require(class).map(|d| d.thermal_offset)
    }

    /// `offset(to) - offset(from)`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownClassError`] if either class is not defined.
    pub fn get_delta(&self, from: &ClassLabel, to: &ClassLabel) -> Result<f64, UnknownClassError> {
        Ok(self.offset(to)? - self.offset(from)?)
    }

    /// Predicts the temperature after converting a point from one class to
    /// another, starting at `base_temperature`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownClassError`] if either class is not defined.
    pub fn simulate_pair(
        &self,
        from: &ClassLabel,
        to: &ClassLabel,
        base_temperature: f64,
    ) -> Result<PairSimulation, UnknownClassError> {
        let from_def = self.classes.require(from)?;
        let to_def = self.classes.require(to)?;
        let delta = to_def.thermal_offset - from_def.thermal_offset;
        let band = ImpactBand::from_delta(delta);

        let (direction, effect) = if delta > 0.0 {
            ("increase", "warming")
        } else if delta < 0.0 {
            ("decrease", "cooling")
        } else {
            ("leave unchanged", "neutral")
        };
        let explanation = format!(
            "Converting LCZ {from} ({}) to LCZ {to} ({}) would {direction} the temperature by \
             {:.2}°C, a {effect} effect ({band}) derived from the difference between the two \
             classes' thermal offsets.",
            from_def.name,
            to_def.name,
            delta.abs(),
        );

        Ok(PairSimulation {
            from_class: from_def.label.clone(),
            from_name: from_def.name.clone(),
            to_class: to_def.label.clone(),
            to_name: to_def.name.clone(),
            base_temperature,
            delta,
            new_temperature: base_temperature + delta,
            band,
            explanation,
        })
    }

    /// Applies [`Self::simulate_pair`] to each change whose zone has a
    /// known temperature.
    ///
    /// Changes naming an unknown class are skipped with a warning and leave
    /// the zone's temperature unchanged. Zones without a temperature are
    /// ignored.
    #[must_use]
    pub fn apply_changes(
        &self,
        changes: &[crate::ZoneClassChange],
        temperatures: &BTreeMap<usize, f64>,
    ) -> BTreeMap<usize, f64> {
        let mut modified = temperatures.clone();

        for change in changes {
            let Some(&base) = temperatures.get(&change.zone_id) else {
                log::debug!("Zone {} has no temperature; skipping", change.zone_id);
                continue;
            };
            match self.simulate_pair(&change.from, &change.to, base) {
                Ok(result) => {
                    modified.insert(change.zone_id, result.new_temperature);
                }
                Err(e) => {
                    log::warn!("Skipping change for zone {}: {e}", change.zone_id);
                }
            }
        }

        modified
    }
}

impl Default for ThermalDeltaModel {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ZoneClassChange;

    #[test]
    fn deltas_are_antisymmetric() {
        let model = ThermalDeltaModel::standard();
        let labels: Vec<ClassLabel> = model
            .classes()
            .definitions()
            .iter()
            .map(|d| d.label.clone())
            .collect();
        for a in &labels {
            for b in &labels {
                let ab = model.get_delta(a, b).unwrap();
                let ba = model.get_delta(b, a).unwrap();
                assert!(
                    (ab + ba).abs() < 1e-12,
                    "delta({a},{b}) = {ab} but delta({b},{a}) = {ba}"
                );
            }
        }
    }

    #[test]
    fn compact_midrise_to_dense_trees() {
        let model = ThermalDeltaModel::standard();
        let result = model
            .simulate_pair(&ClassLabel::new("2"), &ClassLabel::new("A"), 28.0)
            .unwrap();
        assert!((result.delta - -5.0).abs() < 1e-12);
        assert!((result.new_temperature - 23.0).abs() < 1e-12);
        assert_eq!(result.band, ImpactBand::SignificantCooling);
        assert_eq!(result.from_name, "Compact midrise");
        assert_eq!(result.to_name, "Dense trees");
        assert!(result.explanation.contains("decrease"));
        assert!(result.explanation.contains("5.00°C"));
    }

    #[test]
    fn same_class_is_a_zero_delta_not_an_error() {
        let model = ThermalDeltaModel::standard();
        let d = ClassLabel::new("D");
        assert!(model.get_delta(&d, &d).unwrap().abs() < f64::EPSILON);
        let result = model.simulate_pair(&d, &d, 25.0).unwrap();
        assert_eq!(result.band, ImpactBand::MinimalImpact);
    }

    #[test]
    fn unknown_class_is_an_error() {
        let model = ThermalDeltaModel::standard();
        let err = model
            .get_delta(&ClassLabel::new("D"), &ClassLabel::new("Q"))
            .unwrap_err();
        assert_eq!(err.label, "Q");
        assert!(model.offset(&ClassLabel::new("Q")).is_err());
    }

    #[test]
    fn applies_changes_and_skips_unknown_classes() {
        let model = ThermalDeltaModel::standard();
        let temperatures = BTreeMap::from([(0, 28.0), (1, 26.0), (2, 25.0)]);
        let changes = vec![
            ZoneClassChange::new(0, "2", "A"),
            ZoneClassChange::new(1, "D", "Q"),
            ZoneClassChange::new(7, "D", "2"),
        ];

        let modified = model.apply_changes(&changes, &temperatures);

        assert!((modified[&0] - 23.0).abs() < 1e-12);
        assert!((modified[&1] - 26.0).abs() < f64::EPSILON);
        assert!((modified[&2] - 25.0).abs() < f64::EPSILON);
        assert!(!modified.contains_key(&7));
    }
}
