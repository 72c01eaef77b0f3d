//! Shared types for the geopull sampling and sequencing engine.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// A 2D point in a planar reference system (e.g. longitude/latitude degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate (longitude for geographic data).
    pub x: f64,
    /// Vertical coordinate (latitude for geographic data).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// A closed polygon ring.
///
/// The last vertex implicitly connects back to the first; callers should
/// not repeat the first vertex at the end (a repeated closing vertex is
/// harmless for containment tests but adds a zero-length edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Create a polygon from its ring vertices.
    #[must_use]
    pub const fn new(vertices: Vec<Point>) -> Self {
        Self(vertices)
    }

    /// Returns `true` if the ring has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ring vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all ring vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polygon and returns the underlying vertices.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Point> {
        self.0
    }
}

impl From<&geo::LineString<f64>> for Polygon {
    /// Converts a ring, dropping the explicit closing vertex `geo` keeps.
    fn from(ring: &geo::LineString<f64>) -> Self {
        let mut vertices: Vec<Point> = ring.coords().copied().map(Point::from).collect();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self(vertices)
    }
}

/// Axis-aligned sampling envelope of a polygon collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub max_x: f64,
    pub max_y: f64,
    pub min_x: f64,
    pub min_y: f64,
}

impl BoundingBox {
    /// Returns `true` if `p` lies within the box, boundary included.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    /// Box area. Zero for degenerate (line or point) boxes.
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }
}

/// Integer key used for distance-graph entries and output ordering.
pub type PointId = u64;

/// A point tagged with a unique ID, as used by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedPoint {
    pub id: PointId,
    pub point: Point,
}

impl IdentifiedPoint {
    /// Create a new identified point.
    #[must_use]
    pub const fn new(id: PointId, point: Point) -> Self {
        Self { id, point }
    }

    /// Tag points with IDs assigned by position (`0..n`).
    #[must_use]
    pub fn enumerate(points: &[Point]) -> Vec<Self> {
        (0..)
            .zip(points)
            .map(|(id, &point)| Self::new(id, point))
            .collect()
    }
}

/// Rejection sampler parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Decimal digits kept in sampled coordinates.
    pub precision: u32,

    /// Draws allowed per accepted point before sampling is abandoned with
    /// [`GeopullError::ResourceExhausted`].
    pub max_attempts: u64,
}

impl SamplerConfig {
    pub const DEFAULT_PRECISION: u32 = 13;
    pub const DEFAULT_MAX_ATTEMPTS: u64 = 1_000_000;

    /// Highest precision that still changes an `f64` coordinate.
    pub const MAX_PRECISION: u32 = 15;

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeopullError::InvalidInput`] if `max_attempts` is zero or
    /// `precision` exceeds [`Self::MAX_PRECISION`].
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GeopullError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.precision > Self::MAX_PRECISION {
            return Err(GeopullError::InvalidInput(format!(
                "precision {} exceeds maximum of {}",
                self.precision,
                Self::MAX_PRECISION,
            )));
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            precision: Self::DEFAULT_PRECISION,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Dispersion sequencer parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Maximum size of the random traveled/choice subsets examined per step.
    pub pool_limit: usize,

    /// Number of points sequenced together. Points in different partitions
    /// are never compared for isolation.
    pub partition_size: usize,

    /// Never select the first candidate of each choice subset while
    /// another candidate remains.
    ///
    /// Inherited from the first planner, which sliced the first candidate
    /// off every pool. Why it did so is not recorded. The rule is kept so
    /// seeded orders match that planner; set this to `false` for plain
    /// farthest-point selection.
    pub skip_first_candidate: bool,
}

impl SequencerConfig {
    pub const DEFAULT_POOL_LIMIT: usize = 200;
    pub const DEFAULT_PARTITION_SIZE: usize = 800;

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeopullError::InvalidInput`] if `pool_limit < 2` (a
    /// single-point choice subset leaves nothing to select once the first
    /// candidate is skipped) or `partition_size == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.pool_limit < 2 {
            return Err(GeopullError::InvalidInput(format!(
                "pool_limit must be at least 2, got {}",
                self.pool_limit,
            )));
        }
        if self.partition_size == 0 {
            return Err(GeopullError::InvalidInput(
                "partition_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            pool_limit: Self::DEFAULT_POOL_LIMIT,
            partition_size: Self::DEFAULT_PARTITION_SIZE,
            skip_first_candidate: true,
        }
    }
}

/// Configuration for a full sample-then-sequence run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub sampler: SamplerConfig,
    pub sequencer: SequencerConfig,

    /// RNG seed. `None` draws a seed from the operating system, so every
    /// run differs.
    pub seed: Option<u64>,
}

impl PlanConfig {
    /// Validate both stage configurations.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeopullError::InvalidInput`] found.
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.sequencer.validate()
    }

    /// Build the run's random number generator.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }
}

/// Errors produced by sampling and sequencing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum GeopullError {
    /// Input data or configuration is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Rejection sampling spent its attempt budget without a hit.
    #[error("no point inside the polygons after {attempts} attempts")]
    ResourceExhausted { attempts: u64 },

    /// An internal precondition was broken by the caller (e.g. selecting
    /// before the distance graph was extended).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T, E = GeopullError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance_squared() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((distance(b, a) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(7.0, 11.0);
        assert!((p.distance(p)).abs() < f64::EPSILON);
    }

    #[test]
    fn point_geo_coord_conversion() {
        let p = Point::new(-122.3, 47.6);
        let c: geo::Coord<f64> = p.into();
        assert_eq!(Point::from(c), p);
    }

    // --- Polygon tests ---

    #[test]
    fn polygon_from_geo_ring_drops_closing_vertex() {
        let ring = geo::LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let polygon = Polygon::from(&ring);
        assert_eq!(polygon.len(), 3);
        assert_eq!(polygon.vertices()[2], Point::new(1.0, 1.0));
    }

    #[test]
    fn polygon_empty() {
        let polygon = Polygon::new(vec![]);
        assert!(polygon.is_empty());
        assert_eq!(polygon.len(), 0);
    }

    // --- BoundingBox tests ---

    #[test]
    fn bounding_box_contains_boundary() {
        let bbox = BoundingBox {
            max_x: 2.0,
            max_y: 1.0,
            min_x: 0.0,
            min_y: -1.0,
        };
        assert!(bbox.contains(Point::new(2.0, -1.0)));
        assert!(!bbox.contains(Point::new(2.1, 0.0)));
        assert!((bbox.area() - 4.0).abs() < f64::EPSILON);
    }

    // --- IdentifiedPoint tests ---

    #[test]
    fn enumerate_assigns_ids_by_position() {
        let ids: Vec<PointId> =
            IdentifiedPoint::enumerate(&[Point::new(5.0, 5.0), Point::new(1.0, 1.0)])
                .iter()
                .map(|p| p.id)
                .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    // --- Config tests ---

    #[test]
    fn config_defaults() {
        let config = PlanConfig::default();
        assert_eq!(config.sampler.precision, 13);
        assert_eq!(config.sampler.max_attempts, 1_000_000);
        assert_eq!(config.sequencer.pool_limit, 200);
        assert_eq!(config.sequencer.partition_size, 800);
        assert!(config.sequencer.skip_first_candidate);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_small_pool_limit() {
        let config = SequencerConfig {
            pool_limit: 1,
            ..SequencerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GeopullError::InvalidInput(_))
        ));
    }

    #[test]
    fn config_rejects_zero_partition_size() {
        let config = SequencerConfig {
            partition_size: 0,
            ..SequencerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_attempts_and_excess_precision() {
        let no_attempts = SamplerConfig {
            max_attempts: 0,
            ..SamplerConfig::default()
        };
        assert!(no_attempts.validate().is_err());

        let too_precise = SamplerConfig {
            precision: 16,
            ..SamplerConfig::default()
        };
        assert!(too_precise.validate().is_err());
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: PlanConfig =
            serde_json::from_str(r#"{"sequencer": {"pool_limit": 50}, "seed": 7}"#).unwrap();
        assert_eq!(config.sequencer.pool_limit, 50);
        assert_eq!(config.sequencer.partition_size, 800);
        assert_eq!(config.sampler, SamplerConfig::default());
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;

        let config = PlanConfig {
            seed: Some(42),
            ..PlanConfig::default()
        };
        let a: f64 = config.rng().random();
        let b: f64 = config.rng().random();
        assert!((a - b).abs() < f64::EPSILON);
    }

    // --- GeopullError tests ---

    #[test]
    fn error_display() {
        assert_eq!(
            GeopullError::ResourceExhausted { attempts: 10 }.to_string(),
            "no point inside the polygons after 10 attempts",
        );
        assert_eq!(
            GeopullError::InvalidInput("empty polygon collection".to_string()).to_string(),
            "invalid input: empty polygon collection",
        );
        assert_eq!(
            GeopullError::InvariantViolation("missing edge".to_string()).to_string(),
            "invariant violated: missing edge",
        );
    }

    #[test]
    fn error_serde_round_trip() {
        let err = GeopullError::ResourceExhausted { attempts: 3 };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: GeopullError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }
}
