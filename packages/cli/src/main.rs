#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the LCZ mapping and urban heat analysis tool.
//!
//! Loads LCZ zones from KML, KMZ, `GeoJSON` or a classified KMZ raster
//! overlay, attributes temperature samples to them, and simulates land-use
//! conversion scenarios.

mod error;
mod output;
mod source;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lcz_map_engine::{Analysis, EngineConfig, EngineContext, EngineState, sampling_points};
use lcz_map_scenario::{ScenarioError, ScenarioSimulator, ThermalDeltaModel};
use lcz_map_zone::{ClassTable, export};
use lcz_map_zone_models::ClassLabel;

use crate::{
    error::CliError,
    output::{read_samples_file, write_table_file, write_text_file},
    source::{SourcePath, read_text},
};

#[derive(Parser)]
#[command(
    name = "lcz_map",
    about = "Local Climate Zone mapping and urban heat scenario analysis"
)]
struct Cli {
    /// Engine configuration TOML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Class table TOML file (overrides `classes_path` from the config).
    #[arg(long, global = true)]
    classes: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Exactly one zone source.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// KML document with LCZ placemarks
    #[arg(long)]
    kml: Option<PathBuf>,
    /// KMZ archive with LCZ placemarks
    #[arg(long)]
    kmz: Option<PathBuf>,
    /// `GeoJSON` feature collection with an `lcz_class` property
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// KMZ archive with a classified `GroundOverlay` image
    #[arg(long)]
    raster: Option<PathBuf>,
}

impl InputArgs {
    fn source_path(&self) -> Option<SourcePath> {
        self.kml
            .clone()
            .map(SourcePath::Kml)
            .or_else(|| self.kmz.clone().map(SourcePath::Kmz))
            .or_else(|| self.geojson.clone().map(SourcePath::GeoJson))
            .or_else(|| self.raster.clone().map(SourcePath::Raster))
    }
}

#[derive(Args)]
struct ZoneArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Raster grid cells per side (overrides the config)
    #[arg(long)]
    grid: Option<usize>,
    /// Maximum RGB distance for raster color matching (overrides the config)
    #[arg(long)]
    tolerance: Option<f64>,
}

/// Exactly one sample source.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct SampleArgs {
    /// CSV file with `lat,lon,temperature` columns
    #[arg(long)]
    samples: Option<PathBuf>,
    /// Generate synthetic samples from the class offsets
    #[arg(long)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the LCZ class table
    Classes,
    /// Load zones and print a summary
    Zones {
        #[command(flatten)]
        zones: ZoneArgs,
        /// Write the catalog as `GeoJSON` to this path
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write per-zone sampling points as CSV to this path
        #[arg(long)]
        sampling_points: Option<PathBuf>,
        /// Seed for sampling point generation (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Attribute samples, compute class statistics and simulate scenarios
    Analyze {
        #[command(flatten)]
        zones: ZoneArgs,
        #[command(flatten)]
        samples: SampleArgs,
        /// Directory for the CSV tables and the report
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Area name printed in the report header
        #[arg(long)]
        title: Option<String>,
        /// Seed for synthetic samples (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
        /// Simulate converting one zone, e.g. `--change 12=A` (repeatable)
        #[arg(long = "change", value_name = "ZONE_ID=CLASS", value_parser = parse_change)]
        changes: Vec<(usize, ClassLabel)>,
    },
    /// Simulate converting a point from one class to another
    Pair {
        /// Current class
        #[arg(long)]
        from: String,
        /// New class
        #[arg(long)]
        to: String,
        /// Current temperature in °C
        #[arg(long, default_value_t = 28.0)]
        temperature: f64,
    },
}

fn parse_change(value: &str) -> Result<(usize, ClassLabel), String> {
    let (zone_id, class) = value
        .split_once('=')
        .ok_or_else(|| format!("expected ZONE_ID=CLASS, found {value:?}"))?;
    let zone_id = zone_id
        .trim()
        .parse()
        .map_err(|_| format!("zone id is not a number: {zone_id:?}"))?;
    let class = ClassLabel::new(class);
    if class.as_str().is_empty() {
        return Err(format!("missing class in {value:?}"));
    }
    Ok((zone_id, class))
}

/// Loads the engine configuration and the class table it points at.
fn load_config(
    config_path: Option<&Path>,
    classes_path: Option<&Path>,
) -> Result<(EngineConfig, ClassTable), CliError> {
    let mut config = match config_path {
        Some(path) => EngineConfig::from_toml_str(&read_text(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = classes_path {
        config.classes_path = Some(path.to_path_buf());
    }

    let classes = match &config.classes_path {
        Some(path) => ClassTable::from_toml_str(&read_text(path)?)?,
        None => ClassTable::standard(),
    };
    Ok((config, classes))
}

impl ZoneArgs {
    /// Applies the raster overrides given on the command line.
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(grid) = self.grid {
            config.raster.grid_size = grid;
        }
        if let Some(tolerance) = self.tolerance {
            config.raster.color_tolerance = tolerance;
        }
    }
}

fn build_context(
    mut config: EngineConfig,
    classes: ClassTable,
    args: &ZoneArgs,
) -> Result<EngineContext, CliError> {
    args.apply(&mut config);

    let path = args
        .input
        .source_path()
        .ok_or_else(|| CliError::usage("no zone source given"))?;
    let zone_source = source::load(&path, config.raster)?;
    Ok(EngineContext::build(config, classes, &zone_source)?)
}

fn print_classes(classes: &ClassTable) {
    println!("{:<6} {:<8} {:>7}  NAME", "LCZ", "COLOR", "OFFSET");
    println!("{}", "-".repeat(60));
    for definition in classes.definitions() {
        println!(
            "{:<6} {:<8} {:>+7.1}  {}",
            definition.label.as_str(),
            definition.color.to_hex(),
            definition.thermal_offset,
            definition.name
        );
    }
    println!();
    println!("Baseline: LCZ {}", classes.baseline());
}

fn print_zone_summary(context: &EngineContext) {
    let catalog = &context.catalog;
    let report = catalog.report();

    println!("Backend:  {}", catalog.backend());
    println!(
        "Zones:    {} ({} candidates, {} unresolved, {} invalid)",
        catalog.len(),
        report.candidates,
        report.dropped_unresolved,
        report.dropped_invalid
    );
    if let Some(bounds) = catalog.bounds() {
        println!(
            "Bounds:   N {:.5} S {:.5} E {:.5} W {:.5}",
            bounds.north, bounds.south, bounds.east, bounds.west
        );
    }
    if let Some(center) = catalog.center() {
        println!("Center:   {:.5}, {:.5}", center.lat, center.lon);
    }
    println!("Area:     {:.2} km²", catalog.total_area_km2());
    println!();

    println!("{:<6} {:>12}  NAME", "LCZ", "AREA (km²)");
    println!("{}", "-".repeat(50));
    for (class, area) in catalog.area_by_class() {
        let name = context
            .classes
            .get(&class)
            .map_or("", |definition| definition.name.as_str());
        println!("{:<6} {area:>12.3}  {name}", class.as_str());
    }

    if let Some(zone) = catalog.largest_zone() {
        println!();
        println!(
            "Largest zone: #{} LCZ {} {} ({:.3} km²)",
            zone.id,
            zone.class,
            zone.name.as_deref().unwrap_or(""),
            zone.area_km2
        );
    }
}

fn run_zones(
    context: &EngineContext,
    export_path: Option<&Path>,
    points_path: Option<&Path>,
) -> Result<(), CliError> {
    print_zone_summary(context);

    if let Some(path) = export_path {
        let geojson = export::to_geojson_string(&context.catalog, &context.classes)?;
        write_text_file(path, &geojson)?;
    }
    if let Some(path) = points_path {
        let points = sampling_points(&context.catalog, &context.config.sampling);
        write_table_file(path, &points)?;
    }
    Ok(())
}

struct AnalyzeOptions<'a> {
    samples: Option<&'a Path>,
    output_dir: &'a Path,
    title: Option<&'a str>,
    changes: &'a [(usize, ClassLabel)],
}

fn run_analyze(context: EngineContext, options: &AnalyzeOptions<'_>) -> Result<(), CliError> {
    let state = EngineState::new();
    state.init(context)?;
    let analysis = Analysis::from_state(&state)?;
    let context = analysis.context();

    let outcome = match options.samples {
        Some(path) => analysis.run(read_samples_file(path)?),
        None => analysis.run_synthetic(),
    };

    let output_dir = options.output_dir;
    std::fs::create_dir_all(output_dir).map_err(|e| CliError::io(output_dir, e))?;
    write_table_file(&output_dir.join("statistics.csv"), outcome.statistics.rows())?;
    write_table_file(&output_dir.join("scenarios.csv"), &outcome.comparison)?;
    write_table_file(&output_dir.join("samples.csv"), &outcome.samples)?;

    let mut report = outcome.report(context);
    if let Some(title) = options.title {
        report = report.with_title(title);
    }
    let report = report.to_string();
    write_text_file(&output_dir.join("report.txt"), &report)?;
    print!("{report}");

    for (i, result) in outcome.scenarios.iter().enumerate() {
        log::debug!("Scenario {} record:", i + 1);
        for (key, value) in result.to_record() {
            log::debug!("  {key} = {value}");
        }
    }

    if !options.changes.is_empty() {
        let simulator =
            ScenarioSimulator::new(&context.catalog, &outcome.statistics, &context.model);
        println!();
        println!("ZONE CHANGES");
        println!("{}", "-".repeat(60));
        for (zone_id, class) in options.changes {
            match simulator.simulate_zone_change(*zone_id, class) {
                Ok(change) => println!(
                    "Zone #{}: LCZ {} -> {}: {:.1}°C -> {:.1}°C ({:+.2}°C over {:.3} km²)",
                    change.zone_id,
                    change.old_class,
                    change.new_class,
                    change.old_temp,
                    change.new_temp,
                    change.temp_change,
                    change.area_km2
                ),
                Err(e) => log::warn!("Zone #{zone_id} -> {class} could not be simulated: {e}"),
            }
        }
    }

    Ok(())
}

fn run_pair(classes: &ClassTable, from: &str, to: &str, temperature: f64) -> Result<(), CliError> {
    let model = ThermalDeltaModel::new(classes);
    let simulation = model
        .simulate_pair(&ClassLabel::new(from), &ClassLabel::new(to), temperature)
        .map_err(ScenarioError::from)?;

    println!(
        "LCZ {} ({}) -> LCZ {} ({})",
        simulation.from_class, simulation.from_name, simulation.to_class, simulation.to_name
    );
    println!(
        "{:.1}°C -> {:.1}°C ({:+.2}°C, {})",
        simulation.base_temperature, simulation.new_temperature, simulation.delta, simulation.band
    );
    println!();
    println!("{}", simulation.explanation);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let (config, classes) = load_config(cli.config.as_deref(), cli.classes.as_deref())?;

    match cli.command {
        Commands::Classes => print_classes(&classes),
        Commands::Zones {
            zones,
            export,
            sampling_points,
            seed,
        } => {
            let mut config = config;
            if let Some(seed) = seed {
                config.sampling.seed = seed;
            }
            let context = build_context(config, classes, &zones)?;
            run_zones(&context, export.as_deref(), sampling_points.as_deref())?;
        }
        Commands::Analyze {
            zones,
            samples,
            output_dir,
            title,
            seed,
            changes,
        } => {
            let mut config = config;
            if let Some(seed) = seed {
                config.sampling.seed = seed;
            }
            let context = build_context(config, classes, &zones)?;
            run_analyze(
                context,
                &AnalyzeOptions {
                    samples: if samples.synthetic {
                        None
                    } else {
                        samples.samples.as_deref()
                    },
                    output_dir: &output_dir,
                    title: title.as_deref(),
                    changes: &changes,
                },
            )?;
        }
        Commands::Pair {
            from,
            to,
            temperature,
        } => run_pair(&classes, &from, &to, temperature)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_zone_changes() {
        assert_eq!(parse_change("12=a").unwrap(), (12, ClassLabel::new("A")));
        assert_eq!(parse_change(" 3 = 6 ").unwrap(), (3, ClassLabel::new("6")));
        assert!(parse_change("12").is_err());
        assert!(parse_change("x=A").is_err());
        assert!(parse_change("4=").is_err());
    }

    #[test]
    fn requires_exactly_one_zone_source() {
        assert!(Cli::try_parse_from(["lcz_map", "zones"]).is_err());
        assert!(
            Cli::try_parse_from(["lcz_map", "zones", "--kml", "a.kml", "--geojson", "b.json"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["lcz_map", "zones", "--raster", "map.kmz", "--grid", "20"])
            .unwrap();
        let Commands::Zones { zones, .. } = cli.command else {
            panic!("expected zones command");
        };
        assert_eq!(
            zones.input.source_path(),
            Some(SourcePath::Raster(PathBuf::from("map.kmz")))
        );
        assert_eq!(zones.grid, Some(20));
    }

    #[test]
    fn analyze_requires_a_sample_source() {
        assert!(Cli::try_parse_from(["lcz_map", "analyze", "--kml", "a.kml"]).is_err());

        let cli = Cli::try_parse_from([
            "lcz_map",
            "analyze",
            "--kml",
            "a.kml",
            "--synthetic",
            "--change",
            "0=A",
        ])
        .unwrap();
        let Commands::Analyze {
            samples, changes, ..
        } = cli.command
        else {
            panic!("expected analyze command");
        };
        assert!(samples.synthetic);
        assert_eq!(changes, [(0, ClassLabel::new("A"))]);
    }

    #[test]
    fn default_config_follows_class_table_baseline() {
        let (config, classes) = load_config(None, None).unwrap();
        assert_eq!(config.baseline(&classes), classes.baseline());
        assert!(config.validate(&classes).is_ok());
    }

    #[test]
    fn config_without_baseline_uses_custom_table_baseline() {
        let dir = std::env::temp_dir().join(format!("lcz_map_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("engine.toml");
        let classes_path = dir.join("classes.toml");
        std::fs::write(&config_path, "[raster]\ngrid_size = 10\n").unwrap();
        std::fs::write(
            &classes_path,
            r##"
            baseline = "A"

            [[classes]]
            label = "A"
            name = "Dense trees"
            color = "#006A00"
            thermal_offset = 0.0
            "##,
        )
        .unwrap();

        let (config, classes) = load_config(Some(&config_path), Some(&classes_path)).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(config.baseline(&classes).as_str(), "A");
        assert!(config.validate(&classes).is_ok());
    }

    #[test]
    fn raster_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "lcz_map",
            "zones",
            "--raster",
            "map.kmz",
            "--tolerance",
            "40",
        ])
        .unwrap();
        let Commands::Zones { zones, .. } = cli.command else {
            panic!("expected zones command");
        };

        let mut config = EngineConfig::default();
        config.raster.grid_size = 12;
        zones.apply(&mut config);
        assert!((config.raster.color_tolerance - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.raster.grid_size, 12, "unset flags keep the config value");
    }
}
