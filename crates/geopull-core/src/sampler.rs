//! Uniform random points inside a polygon set, by rejection sampling.
//!
//! Candidates are drawn uniformly from the collection's bounding box and
//! kept only if they fall inside at least one polygon. The expected number
//! of draws per accepted point is `box area / covered area`, so a sliver
//! polygon inside a large box is slow, and a zero-area polygon is never
//! hit. Every draw loop is capped by [`SamplerConfig::max_attempts`].

use rand::Rng;

use crate::polygon::{bounding_box, point_in_any};
use crate::shapes::PolygonSource;
use crate::types::{BoundingBox, GeopullError, Point, Polygon, Result, SamplerConfig};

/// Acceptance ratio below which a sampling run is worth a warning.
const LOW_ACCEPTANCE_RATIO: f64 = 0.01;

/// Round `value` to `precision` decimal digits.
///
/// Precisions above [`SamplerConfig::MAX_PRECISION`] are clamped to it.
fn round_to(value: f64, precision: u32) -> f64 {
    #[allow(clippy::cast_possible_wrap)]
    let scale = 10f64.powi(precision.min(SamplerConfig::MAX_PRECISION) as i32);
    let scaled = (value * scale).round() / scale;
    if scaled.is_finite() { scaled } else { value }
}

/// Draw a uniform point from `bbox`, rounded to `precision` decimal digits.
///
/// Each coordinate is `min + (max - min) * u` with `u` uniform in `[0, 1)`,
/// so a zero-width box yields its constant coordinate instead of failing.
pub fn random_point_in_box<R: Rng + ?Sized>(rng: &mut R, bbox: &BoundingBox, precision: u32) -> Point {
    let u: f64 = rng.random();
    let v: f64 = rng.random();
    let x = (bbox.max_x - bbox.min_x).mul_add(u, bbox.min_x);
    let y = (bbox.max_y - bbox.min_y).mul_add(v, bbox.min_y);
    Point::new(round_to(x, precision), round_to(y, precision))
}

/// Draw points from `bbox` until one lands inside any of `polygons`.
///
/// # Errors
///
/// Returns [`GeopullError::ResourceExhausted`] after `max_attempts`
/// rejected draws.
pub fn sample_inside_polygons<R: Rng + ?Sized>(
    rng: &mut R,
    polygons: &[Polygon],
    bbox: &BoundingBox,
    precision: u32,
    max_attempts: u64,
) -> Result<Point> {
    sample_counted(rng, polygons, bbox, precision, max_attempts).map(|(point, _)| point)
}

/// [`sample_inside_polygons`], also returning the number of draws used.
fn sample_counted<R: Rng + ?Sized>(
    rng: &mut R,
    polygons: &[Polygon],
    bbox: &BoundingBox,
    precision: u32,
    max_attempts: u64,
) -> Result<(Point, u64)> {
    for attempt in 1..=max_attempts {
        let candidate = random_point_in_box(rng, bbox, precision);
        if point_in_any(candidate, polygons) {
            return Ok((candidate, attempt));
        }
    }
    Err(GeopullError::ResourceExhausted {
        attempts: max_attempts,
    })
}

/// Outcome of [`sample_points`]: the points plus draw statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRun {
    pub points: Vec<Point>,
    /// Number of rings the source supplied.
    pub polygon_count: usize,
    /// Total vertices across those rings.
    pub vertex_count: usize,
    /// Total candidate draws, accepted and rejected.
    pub attempts: u64,
}

impl SampleRun {
    /// Fraction of draws that landed inside a polygon.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.points.len() as f64 / self.attempts as f64
        }
    }
}

/// Draw `count` independent points inside the source's polygons.
///
/// The bounding box is computed once. Each call is a fresh draw; the
/// returned points have no particular order.
///
/// # Errors
///
/// Returns [`GeopullError::InvalidInput`] for an invalid config, a failing
/// source, or an empty polygon collection, and
/// [`GeopullError::ResourceExhausted`] if any single point exceeds the
/// attempt budget.
pub fn generate_points<S, R>(
    count: usize,
    source: &S,
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<Vec<Point>>
where
    S: PolygonSource + ?Sized,
    R: Rng + ?Sized,
{
    sample_points(count, source, config, rng).map(|run| run.points)
}

/// [`generate_points`] with draw statistics.
///
/// # Errors
///
/// See [`generate_points`].
pub fn sample_points<S, R>(
    count: usize,
    source: &S,
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<SampleRun>
where
    S: PolygonSource + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let polygons = source.polygons()?;
    let polygon_count = polygons.len();
    let vertex_count = polygons.iter().map(Polygon::len).sum();

    if count == 0 {
        return Ok(SampleRun {
            points: Vec::new(),
            polygon_count,
            vertex_count,
            attempts: 0,
        });
    }

    let bbox = bounding_box(&polygons)?;
    log::debug!(
        "sampler: {polygon_count} polygons, {vertex_count} vertices, bbox {bbox:?}",
    );

    let mut points = Vec::with_capacity(count);
    let mut attempts = 0;
    for _ in 0..count {
        let (point, used) =
            sample_counted(rng, &polygons, &bbox, config.precision, config.max_attempts)?;
        points.push(point);
        attempts += used;
    }

    let run = SampleRun {
        points,
        polygon_count,
        vertex_count,
        attempts,
    };
    let ratio = run.acceptance_ratio();
    if ratio < LOW_ACCEPTANCE_RATIO {
        log::warn!(
            "sampler: low acceptance ratio {ratio:.4}; polygons cover little of their bounding box",
        );
    }
    log::info!(
        "sampler: generated {count} points in {attempts} draws (acceptance {:.1}%)",
        ratio * 100.0,
    );
    Ok(run)
}
