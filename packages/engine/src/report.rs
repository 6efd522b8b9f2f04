//! Plain-text analysis report.

use std::fmt::{self, Display, Formatter};

use lcz_map_analytics::StatisticsTable;
use lcz_map_zone::ZoneCatalog;
use lcz_map_zone_models::{ClassLabel, ScenarioResult, join_labels};

const RULE_WIDTH: usize = 80;

/// Borrowed view over one analysis, rendered through [`Display`].
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// Free-form area name printed in the header.
    pub title: Option<&'a str>,
    /// Zones the analysis ran over.
    pub catalog: &'a ZoneCatalog,
    /// Per-class statistics.
    pub statistics: &'a StatisticsTable,
    /// Scenario results, in reporting order.
    pub scenarios: &'a [ScenarioResult],
}

impl<'a> Report<'a> {
    /// Creates a report without a title.
    #[must_use]
    pub const fn new(
        catalog: &'a ZoneCatalog,
        statistics: &'a StatisticsTable,
        scenarios: &'a [ScenarioResult],
    ) -> Self {
        Self {
            title: None,
            catalog,
            statistics,
            scenarios,
        }
    }

    /// Sets the header title.
    #[must_use]
    pub const fn with_title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    fn section(f: &mut Formatter<'_>, heading: &str) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{heading}")?;
        writeln!(f, "{}", "-".repeat(RULE_WIDTH))
    }

    fn write_summary(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Self::section(f, "1. ZONE SUMMARY")?;
        let classes = self.catalog.classes();
        writeln!(f, "Mapped zones: {}", self.catalog.len())?;
        writeln!(f, "Classes present: {}", join_labels(&classes))?;
        writeln!(f, "Total area: {:.2} km²", self.catalog.total_area_km2())?;

        let report = self.catalog.report();
        if report.dropped() > 0 {
            writeln!(
                f,
                "Dropped during ingestion: {} unresolved, {} invalid",
                report.dropped_unresolved, report.dropped_invalid
            )?;
        }
        Ok(())
    }

    fn write_statistics(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Self::section(f, "2. TEMPERATURE BY CLASS")?;
        if self.statistics.is_empty() {
            return writeln!(f, "No attributed samples.");
        }

        for row in self.statistics.rows() {
            writeln!(f)?;
            match &row.description {
                Some(description) => writeln!(f, "LCZ {}: {description}", row.class)?,
                None => writeln!(f, "LCZ {}", row.class)?,
            }
            writeln!(f, "  Mean temperature: {:.1}°C", row.mean_temp)?;
            match row.std_temp {
                Some(std) => writeln!(f, "  Standard deviation: {std:.1}°C")?,
                None => writeln!(f, "  Standard deviation: n/a")?,
            }
            writeln!(f, "  Samples: {}", row.count)?;
            if let Some(delta) = row.temp_delta_observed {
                writeln!(
                    f,
                    "  Difference vs LCZ {}: {delta:+.1}°C",
                    self.statistics.baseline()
                )?;
            }
        }
        Ok(())
    }

    fn write_findings(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (Some(hottest), Some(coldest), Some(spread)) = (
            self.statistics.hottest(),
            self.statistics.coldest(),
            self.statistics.spread(),
        ) else {
            return Ok(());
        };

        Self::section(f, "3. KEY FINDINGS")?;
        let describe = |class: &ClassLabel, description: Option<&str>| {
            description.map_or_else(|| format!("LCZ {class}"), |d| format!("LCZ {class} ({d})"))
        };
        writeln!(
            f,
            "* Hottest class: {} at {:.1}°C",
            describe(&hottest.class, hottest.description.as_deref()),
            hottest.mean_temp
        )?;
        writeln!(
            f,
            "* Coldest class: {} at {:.1}°C",
            describe(&coldest.class, coldest.description.as_deref()),
            coldest.mean_temp
        )?;
        writeln!(f, "* Maximum difference: {spread:.1}°C")
    }

    fn write_scenarios(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.scenarios.is_empty() {
            return Ok(());
        }

        Self::section(f, "4. SIMULATED SCENARIOS")?;
        for (i, scenario) in self.scenarios.iter().enumerate() {
            writeln!(f)?;
            writeln!(
                f,
                "Scenario {}: {}",
                i + 1,
                scenario.kind.as_ref().to_uppercase()
            )?;
            writeln!(
                f,
                "  From: {} -> {}",
                join_labels(&scenario.source_classes),
                scenario.target_class
            )?;
            writeln!(
                f,
                "  Conversion rate: {:.0}%",
                scenario.conversion_rate * 100.0
            )?;
            writeln!(f, "  Affected area: {:.2} km²", scenario.affected_area_km2)?;
            writeln!(
                f,
                "  Thermal impact: {:+.1}°C ({})",
                scenario.expected_change, scenario.band
            )?;
        }
        Ok(())
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "LOCAL CLIMATE ZONE (LCZ) ANALYSIS REPORT")?;
        if let Some(title) = self.title {
            writeln!(f, "Area: {title}")?;
        }
        writeln!(f, "Source: {} backend", self.catalog.backend())?;
        writeln!(f, "{rule}")?;

        self.write_summary(f)?;
        self.write_statistics(f)?;
        self.write_findings(f)?;
        self.write_scenarios(f)?;

        writeln!(f)?;
        writeln!(f, "{rule}")
    }
}
