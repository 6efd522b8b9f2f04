#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LCZ analysis engine.
//!
//! Ties the zone catalog, spatial attribution, statistics and scenario
//! crates into one pipeline:
//!
//! 1. [`EngineContext::build`] ingests a zone source and indexes it.
//! 2. [`EngineState`] holds the context for the rest of the process.
//! 3. [`Analysis::run`] attributes samples, aggregates them per class,
//!    runs the standard what-if scenarios and builds the comparison table.
//!
//! [`sampling`] generates deterministic sampling points and synthetic
//! samples for offline runs, and [`Report`] renders an outcome as text.

pub mod config;
pub mod report;
pub mod sampling;
pub mod state;

use std::sync::Arc;

use lcz_map_analytics::{StatisticsTable, aggregate_with_baseline};
use lcz_map_scenario::{
    ComparisonRow, ConversionScenario, ScenarioSimulator, compare_scenarios, what_if_scenarios,
};
use lcz_map_spatial::AttributionReport;
use lcz_map_zone_models::{Sample, ScenarioResult};

pub use config::{EngineConfig, SamplingConfig, SyntheticConfig};
pub use report::Report;
pub use sampling::{sampling_points, synthetic_samples};
pub use state::{EngineContext, EngineState, StateError};

/// Everything produced by one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Input samples with their attributed classes, in input order.
    pub samples: Vec<Sample>,
    /// Attribution counts.
    pub attribution: AttributionReport,
    /// Per-class statistics.
    pub statistics: StatisticsTable,
    /// Results of the scenarios that had enough data.
    pub scenarios: Vec<ScenarioResult>,
    /// One comparison row per entry of `scenarios`.
    pub comparison: Vec<ComparisonRow>,
}

impl AnalysisOutcome {
    /// Text report over this outcome.
    #[must_use]
    pub fn report<'a>(&'a self, context: &'a EngineContext) -> Report<'a> {
        Report::new(&context.catalog, &self.statistics, &self.scenarios)
    }
}

/// The analysis pipeline over one loaded [`EngineContext`].
#[derive(Debug, Clone)]
pub struct Analysis {
    context: Arc<EngineContext>,
    scenarios: Vec<ConversionScenario>,
}

impl Analysis {
    /// Creates a pipeline that runs the standard what-if scenarios.
    #[must_use]
    pub fn new(context: Arc<EngineContext>) -> Self {
        Self {
            context,
            scenarios: what_if_scenarios(),
        }
    }

    /// Creates a pipeline over the context installed in `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotInitialized`] if `state` is empty.
    pub fn from_state(state: &EngineState) -> Result<Self, StateError> {
        Ok(Self::new(state.get()?))
    }

    /// Replaces the scenarios to run.
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<ConversionScenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// The context this pipeline runs over.
    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// Attributes `samples`, aggregates them and runs the scenarios.
    ///
    /// Samples outside every zone stay unclassified and are left out of the
    /// statistics. Scenarios without enough data are skipped.
    #[must_use]
    pub fn run(&self, mut samples: Vec<Sample>) -> AnalysisOutcome {
        let context = &self.context;
        let attribution = context.index.assign(&mut samples);

        let statistics = aggregate_with_baseline(
            &samples,
            &context.classes,
            context.config.baseline(&context.classes),
        );

        let simulator = ScenarioSimulator::new(&context.catalog, &statistics, &context.model);
        let scenarios = simulator.run_all(&self.scenarios);
        let comparison = compare_scenarios(&scenarios);
        log::info!(
            "Simulated {}/{} scenarios",
            scenarios.len(),
            self.scenarios.len()
        );

        AnalysisOutcome {
            samples,
            attribution,
            statistics,
            scenarios,
            comparison,
        }
    }

    /// Runs the pipeline on synthetic samples generated from the context's
    /// configuration.
    #[must_use]
    pub fn run_synthetic(&self) -> AnalysisOutcome {
        let context = &self.context;
        let samples = synthetic_samples(
            &context.catalog,
            &context.classes,
            &context.config.sampling,
            &context.config.synthetic,
        );
        self.run(samples)
    }
}
