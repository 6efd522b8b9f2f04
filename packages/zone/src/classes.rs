//! The LCZ class table.
//!
//! The standard 17-class table is embedded at compile time from
//! `classes.toml`. Custom tables use the same TOML schema and may extend
//! the label space.

use std::collections::BTreeMap;

use lcz_map_zone_models::{ClassDefinition, ClassLabel, Rgb, UnknownClassError};
use serde::Deserialize;

use crate::ZoneError;

/// Embedded standard class table.
const STANDARD_CLASSES_TOML: &str = include_str!("../classes.toml");

/// On-disk schema of a class table.
#[derive(Debug, Deserialize)]
struct ClassTableFile {
    baseline: ClassLabel,
    classes: Vec<ClassDefinition>,
}

/// Static, read-only set of class definitions with a designated baseline.
///
/// Definitions keep their table order, which is also the tie-break order
/// for nearest-color raster classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTable {
    baseline: ClassLabel,
    definitions: Vec<ClassDefinition>,
    index: BTreeMap<ClassLabel, usize>,
}

impl ClassTable {
    /// Builds a table, validating labels and the baseline.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Config`] if the table is empty, a label is
    /// duplicated, or the baseline is missing or has a non-zero offset.
    pub fn new(baseline: ClassLabel, definitions: Vec<ClassDefinition>) -> Result<Self, ZoneError> {
        if definitions.is_empty() {
            return Err(ZoneError::config("class table has no classes"));
        }

        let mut index = BTreeMap::new();
        for (i, def) in definitions.iter().enumerate() {
            if def.label.as_str().is_empty() {
                return Err(ZoneError::config(format!("class #{i} has an empty label")));
            }
            if !def.thermal_offset.is_finite() {
                return Err(ZoneError::config(format!(
                    "class {} has a non-finite thermal offset",
                    def.label
                )));
            }
            if index.insert(def.label.clone(), i).is_some() {
                return Err(ZoneError::config(format!(
                    "duplicate class label {}",
                    def.label
                )));
            }
        }

        let Some(&baseline_idx) = index.get(&baseline) else {
            return Err(ZoneError::config(format!(
                "baseline class {baseline} is not defined"
            )));
        };
        let baseline_offset = definitions[baseline_idx].thermal_offset;
        if baseline_offset.abs() > 0.0 {
            return Err(ZoneError::config(format!(
                "baseline class {baseline} must have a thermal offset of 0, found {baseline_offset}"
            )));
        }

        Ok(Self {
            baseline,
            definitions,
            index,
        })
    }

    /// Parses a class table from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ZoneError> {
        let file: ClassTableFile = toml::de::from_str(toml_str)?;
        Self::new(file.baseline, file.classes)
    }

    /// Returns the standard 17-class LCZ table with baseline `D`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `classes.toml` fails to parse. It is a
    /// compile-time constant, so a failure is a development error and is
    /// caught by the tests.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_toml_str(STANDARD_CLASSES_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded class table: {e}"))
    }

    /// The baseline class, whose offset is 0.
    #[must_use]
    pub const fn baseline(&self) -> &ClassLabel {
        &self.baseline
    }

    /// All definitions in table order.
    #[must_use]
    pub fn definitions(&self) -> &[ClassDefinition] {
        &self.definitions
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Always `false` for a validated table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Looks up a class definition.
    #[must_use]
    pub fn get(&self, label: &ClassLabel) -> Option<&ClassDefinition> {
        self.index.get(label).map(|&i| &self.definitions[i])
    }

    /// Looks up a class definition, failing on unknown labels.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownClassError`] if the label is not in the table.
    pub fn require(&self, label: &ClassLabel) -> Result<&ClassDefinition, UnknownClassError> {
        self.get(label).ok_or_else(|| UnknownClassError::new(label))
    }

    /// Whether the label is defined.
    #[must_use]
    pub fn contains(&self, label: &ClassLabel) -> bool {
        self.index.contains_key(label)
    }

    /// Normalizes raw text into a label, if that label is defined.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<ClassLabel> {
        let label = ClassLabel::new(raw);
        self.contains(&label).then_some(label)
    }

    /// Finds the class whose color is nearest to `color`.
    ///
    /// Ties go to the class listed first in the table.
    #[must_use]
    pub fn nearest_color(&self, color: Rgb) -> Option<(&ClassDefinition, f64)> {
        let mut best: Option<(&ClassDefinition, f64)> = None;
        for def in &self.definitions {
            let distance = def.color.distance(color);
            match best {
                Some((_, current)) if distance >= current => {}
                _ => best = Some((def, distance)),
            }
        }
        best
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::standard()
    }
}
