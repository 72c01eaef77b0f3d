//! geopull-bench: CLI tool for sampling/sequencing parameter experimentation.
//!
//! Plans query points for a polygon set with configurable parameters,
//! printing per-stage diagnostics. Useful for:
//!
//! - Checking how much of the bounding box the polygons cover
//!   (rejection sampling acceptance ratio)
//! - Tuning pool limit and partition size against runtime and spread
//! - Comparing the skip-first-candidate rule with plain farthest-point
//!   selection
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin geopull-bench -- [OPTIONS] <POLYGONS_JSON>
//! ```
//!
//! The input is a JSON array of either polygon rings
//! (`[[{"x": .., "y": ..}, ..], ..]`) or shape records
//! (`[{"fields": {"TYPE": "LND"}, "parts": [[..], ..]}, ..]`), the latter
//! filtered by `--field`/`--value`.

#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use geopull_core::diagnostics::{Clock, PlanDiagnostics, plan_queries_with_diagnostics};
use geopull_core::{
    IdentifiedPoint, PlanConfig, Polygon, PolygonSource, SamplerConfig, SequencerConfig,
    ShapeFilter, ShapeRecord,
};
use serde::Deserialize;

/// Sampling and sequencing diagnostics for geopull.
///
/// Samples random query points inside the given polygons, orders them for
/// maximum spread, and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "geopull-bench", version)]
struct Cli {
    /// Path to the polygon or shape-record JSON file.
    polygons_path: PathBuf,

    /// Number of query points to generate.
    #[arg(long, default_value_t = 2000)]
    count: usize,

    /// Shape attribute field to filter on (shape-record input only).
    #[arg(long, default_value = ShapeFilter::DEFAULT_FIELD)]
    field: String,

    /// Required value of `--field` (shape-record input only).
    #[arg(long, default_value = ShapeFilter::DEFAULT_VALUE)]
    value: String,

    /// Decimal digits kept in sampled coordinates.
    #[arg(long, default_value_t = SamplerConfig::DEFAULT_PRECISION)]
    precision: u32,

    /// Draws allowed per point before sampling gives up.
    #[arg(long, default_value_t = SamplerConfig::DEFAULT_MAX_ATTEMPTS, value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..))]
    max_attempts: u64,

    /// Random pool size per sequencing step.
    #[arg(long, default_value_t = SequencerConfig::DEFAULT_POOL_LIMIT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..))]
    pool_limit: usize,

    /// Points per independently ordered partition.
    #[arg(long, default_value_t = SequencerConfig::DEFAULT_PARTITION_SIZE, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    partition_size: usize,

    /// Let the first candidate of each pool be selected (plain
    /// farthest-point selection).
    #[arg(long)]
    consider_first_candidate: bool,

    /// RNG seed. Each run `i` uses `seed + i`; omitted means OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the first run's ordered points as JSON to this file.
    #[arg(long)]
    points: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full plan config as a JSON string.
    ///
    /// When provided, all other sampling/sequencing flags are ignored.
    /// The JSON must be a valid `PlanConfig` serialization; missing fields
    /// take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Accepted input documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum PolygonInput {
    /// Attribute-tagged shapes, filtered by `--field`/`--value`.
    Shapes(Vec<ShapeRecord>),
    /// Plain rings, all used.
    Polygons(Vec<Polygon>),
}

/// Build a [`PlanConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PlanConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PlanConfig {
        sampler: SamplerConfig {
            precision: cli.precision,
            max_attempts: cli.max_attempts,
        },
        sequencer: SequencerConfig {
            pool_limit: cli.pool_limit,
            partition_size: cli.partition_size,
            skip_first_candidate: !cli.consider_first_candidate,
        },
        seed: cli.seed,
    })
}

/// Parse the input document into a polygon source.
fn source_from_json(cli: &Cli, json: &str) -> Result<Box<dyn PolygonSource>, String> {
    let input: PolygonInput = serde_json::from_str(json).map_err(|e| {
        format!(
            "Error parsing {}: expected polygon rings or shape records: {e}",
            cli.polygons_path.display(),
        )
    })?;

    Ok(match input {
        PolygonInput::Shapes(records) => {
            Box::new(ShapeFilter::new(records, &cli.field, &cli.value))
        }
        PolygonInput::Polygons(polygons) => Box::new(polygons),
    })
}

/// Serialize the planned order to `path` as pretty JSON.
///
/// Returns the number of bytes written.
fn write_points(path: &Path, order: &[IdentifiedPoint]) -> Result<usize, String> {
    let written = serde_json::to_string_pretty(order)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            std::fs::write(path, &text)
                .map(|()| text.len())
                .map_err(|e| e.to_string())
        });
    match &written {
        Ok(bytes) => log::info!("Points written to {} ({bytes} bytes)", path.display()),
        Err(e) => log::error!("Error writing points to {}: {e}", path.display()),
    }
    written
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            log::error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let json = match std::fs::read_to_string(&cli.polygons_path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Error reading {}: {e}", cli.polygons_path.display());
            return ExitCode::FAILURE;
        }
    };

    let source = match source_from_json(&cli, &json) {
        Ok(s) => s,
        Err(msg) => {
            log::error!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("Polygons: {}", cli.polygons_path.display());
    log::info!("Points: {}", cli.count);
    log::info!("Config: {config:?}");
    log::info!("Runs: {}", cli.runs);

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            log::info!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let run_config = PlanConfig {
            seed: config.seed.map(|s| s.wrapping_add(run as u64)),
            ..config.clone()
        };

        match plan_queries_with_diagnostics(cli.count, source.as_ref(), &run_config, &StdClock) {
            Ok((order, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            log::error!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write points on the first run only.
                if run == 0
                    && let Some(ref points_path) = cli.points
                {
                    // A failed write is reported but does not abort the runs.
                    let _ = write_points(points_path, &order);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                log::error!("Planning error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PlanDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PlanDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    let steps: Vec<f64> = all_diagnostics
        .iter()
        .filter_map(|d| d.summary.early_min_step)
        .collect();
    if !steps.is_empty() {
        let mean_step = steps.iter().sum::<f64>() / steps.len() as f64;
        println!("Smallest early step: mean={mean_step:.6}");
    }

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Load", |d| d.load.duration),
        ("Sampling", |d| d.sampling.duration),
        ("Sequencing", |d| d.sequencing.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("geopull-bench").chain(args.iter().copied()))
    }

    #[test]
    fn flags_build_config() {
        let cli = cli(&[
            "in.json",
            "--pool-limit",
            "50",
            "--partition-size",
            "300",
            "--consider-first-candidate",
            "--seed",
            "4",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.sequencer.pool_limit, 50);
        assert_eq!(config.sequencer.partition_size, 300);
        assert!(!config.sequencer.skip_first_candidate);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.sampler, SamplerConfig::default());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = cli(&[
            "in.json",
            "--pool-limit",
            "50",
            "--config-json",
            r#"{"sequencer": {"pool_limit": 9}}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.sequencer.pool_limit, 9);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = cli(&["in.json", "--config-json", "{"]);
        assert!(config_from_cli(&cli).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn parses_plain_polygons() {
        let cli = cli(&["in.json"]);
        let source = source_from_json(
            &cli,
            r#"[[{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}]]"#,
        )
        .unwrap();
        assert_eq!(source.polygons().unwrap().len(), 1);
    }

    #[test]
    fn parses_and_filters_shape_records() {
        let cli = cli(&["in.json", "--value", "WTR"]);
        let source = source_from_json(
            &cli,
            r#"[
                {"fields": {"TYPE": "LND"}, "parts": [[{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}]]},
                {"fields": {"TYPE": "WTR"}, "parts": [[{"x": 5, "y": 5}, {"x": 6, "y": 5}, {"x": 6, "y": 6}]]}
            ]"#,
        )
        .unwrap();
        let polygons = source.polygons().unwrap();
        assert_eq!(polygons.len(), 1);
        assert!((polygons[0].vertices()[0].x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unrecognized_input() {
        let cli = cli(&["in.json"]);
        assert!(source_from_json(&cli, r#"{"type": "FeatureCollection"}"#).is_err());
    }

    #[test]
    fn writes_points_and_reports_bytes() {
        let path = std::env::temp_dir().join(format!("geopull-bench-{}.json", std::process::id()));
        let order = vec![
            IdentifiedPoint::new(0, geopull_core::Point::new(1.0, 2.0)),
            IdentifiedPoint::new(1, geopull_core::Point::new(3.0, 4.0)),
        ];
        let bytes = write_points(&path, &order).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bytes, text.len());
        let back: Vec<IdentifiedPoint> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn unwritable_points_path_is_an_error() {
        let path = std::env::temp_dir()
            .join("geopull-bench-missing-dir")
            .join("nested")
            .join("points.json");
        assert!(write_points(&path, &[]).is_err());
    }
}
