//! Run diagnostics: timing and counts for each stage of a planning run.
//!
//! These diagnostics are permanent instrumentation intended for parameter
//! experimentation (pool limit, partition size, attempt budget). Time is
//! read through the [`Clock`] trait so this crate stays free of platform
//! time sources; the bench binary supplies a `std::time::Instant` clock.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sampler::sample_points;
use crate::sequence::sequence_points;
use crate::shapes::PolygonSource;
use crate::types::{IdentifiedPoint, PlanConfig, Polygon, Result};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Monotonic time source.
pub trait Clock {
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDiagnostics {
    /// Stage 1: loading polygons from the source.
    pub load: StageDiagnostics,
    /// Stage 2: rejection sampling.
    pub sampling: StageDiagnostics,
    /// Stage 3: dispersion sequencing.
    pub sequencing: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PlanSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Polygon loading metrics.
    Load {
        /// Rings supplied by the source.
        polygon_count: usize,
        /// Total vertices across all rings.
        vertex_count: usize,
    },
    /// Rejection sampling metrics.
    Sampling {
        /// Points requested.
        requested: usize,
        /// Candidate draws, accepted and rejected.
        attempts: u64,
        /// Accepted draws divided by total draws.
        acceptance_ratio: f64,
        /// Decimal digits kept per coordinate.
        precision: u32,
    },
    /// Dispersion sequencing metrics.
    Sequencing {
        /// Points ordered.
        point_count: usize,
        /// Independently ordered partitions.
        partition_count: usize,
        /// Random pool size per step.
        pool_limit: usize,
        /// Distances computed across all partition graphs.
        distance_computations: usize,
    },
}

/// High-level summary counts for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub polygon_count: usize,
    pub point_count: usize,
    /// Smallest distance between consecutive points of the first
    /// partition's first `SPREAD_WINDOW` visits. Larger is better spread.
    pub early_min_step: Option<f64>,
}

/// Leading visits inspected by [`PlanSummary::early_min_step`].
pub const SPREAD_WINDOW: usize = 20;

impl PlanDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Planning Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Polygons: {}  |  Points: {}",
            self.summary.polygon_count, self.summary.point_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Load", &self.load),
            ("Sampling", &self.sampling),
            ("Sequencing", &self.sequencing),
        ];
        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        match self.summary.early_min_step {
            Some(step) => lines.push(format!(
                "Smallest step in first {SPREAD_WINDOW} visits: {step:.6}"
            )),
            None => lines.push("Smallest step in first visits: n/a".to_string()),
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Load {
            polygon_count,
            vertex_count,
        } => format!("{polygon_count} polygons, {vertex_count} vertices"),
        StageMetrics::Sampling {
            requested,
            attempts,
            acceptance_ratio,
            precision,
        } => format!(
            "{requested} pts in {attempts} draws ({:.1}% accepted, precision={precision})",
            acceptance_ratio * 100.0,
        ),
        StageMetrics::Sequencing {
            point_count,
            partition_count,
            pool_limit,
            distance_computations,
        } => format!(
            "{point_count} pts, {partition_count} partitions, pool={pool_limit}, {distance_computations} distances",
        ),
    }
}

/// Smallest consecutive step among the first `window` visits.
fn early_min_step(order: &[IdentifiedPoint], window: usize) -> Option<f64> {
    order[..window.min(order.len())]
        .windows(2)
        .map(|pair| pair[0].point.distance(pair[1].point))
        .reduce(f64::min)
}

/// Run [`plan_queries`](crate::plan_queries), collecting per-stage
/// diagnostics.
///
/// Consumes the RNG exactly as `plan_queries` does, so a seeded run gives
/// the same order either way.
///
/// # Errors
///
/// See [`plan_queries`](crate::plan_queries).
pub fn plan_queries_with_diagnostics<S, C>(
    count: usize,
    source: &S,
    config: &PlanConfig,
    clock: &C,
) -> Result<(Vec<IdentifiedPoint>, PlanDiagnostics)>
where
    S: PolygonSource + ?Sized,
    C: Clock,
{
    config.validate()?;
    let mut rng = config.rng();
    let run_start = clock.now();

    let start = clock.now();
    let polygons = source.polygons()?;
    let load = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Load {
            polygon_count: polygons.len(),
            vertex_count: polygons.iter().map(Polygon::len).sum(),
        },
    };

    let start = clock.now();
    let sampled = sample_points(count, polygons.as_slice(), &config.sampler, &mut rng)?;
    let sampling = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Sampling {
            requested: count,
            attempts: sampled.attempts,
            acceptance_ratio: sampled.acceptance_ratio(),
            precision: config.sampler.precision,
        },
    };

    let start = clock.now();
    let identified = IdentifiedPoint::enumerate(&sampled.points);
    let sequenced = sequence_points(&identified, &config.sequencer, &mut rng)?;
    let sequencing = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Sequencing {
            point_count: sequenced.order.len(),
            partition_count: sequenced.partition_count,
            pool_limit: config.sequencer.pool_limit,
            distance_computations: sequenced.distance_computations,
        },
    };

    let window = SPREAD_WINDOW.min(config.sequencer.partition_size);
    let diagnostics = PlanDiagnostics {
        load,
        sampling,
        sequencing,
        total_duration: clock.elapsed(&run_start),
        summary: PlanSummary {
            polygon_count: sampled.polygon_count,
            point_count: sequenced.order.len(),
            early_min_step: early_min_step(&sequenced.order, window),
        },
    };

    Ok((sequenced.order, diagnostics))
}
