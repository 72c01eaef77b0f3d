//! geopull-core: query-point sampling and ordering (sans-IO).
//!
//! Plans where to query a geo-search API:
//! load polygons -> sample random points inside them -> order the points
//! so that early queries are spread as far apart as possible.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! polygons and points. Reading shape files, calling the API and storing
//! results are the caller's business.

pub mod diagnostics;
pub mod graph;
pub mod polygon;
pub mod sampler;
pub mod sequence;
pub mod shapes;
pub mod types;

pub use graph::DistanceGraph;
pub use polygon::{bounding_box, point_in_any, point_in_polygon};
pub use sampler::{generate_points, random_point_in_box, sample_inside_polygons};
pub use sequence::{best_sequence, greedy_sequence, pick_most_isolated_choice};
pub use shapes::{PolygonSource, ShapeFilter, ShapeRecord};
pub use types::{
    BoundingBox, GeopullError, IdentifiedPoint, PlanConfig, Point, PointId, Polygon, Result,
    SamplerConfig, SequencerConfig, distance,
};

/// Plan a full run of query points.
///
/// # Steps
///
/// 1. Load polygon rings from `source`
/// 2. Draw `count` uniform random points inside them
/// 3. Assign IDs by draw position
/// 4. Order the points for maximum early spread
///
/// The RNG comes from [`PlanConfig::rng`]: seeded runs are reproducible.
///
/// # Errors
///
/// Returns [`GeopullError::InvalidInput`] for an invalid config or an empty
/// polygon collection, and [`GeopullError::ResourceExhausted`] if the
/// polygons cover too little of their bounding box to hit within the
/// attempt budget.
pub fn plan_queries<S: PolygonSource + ?Sized>(
    count: usize,
    source: &S,
    config: &PlanConfig,
) -> Result<Vec<IdentifiedPoint>> {
    config.validate()?;
    let mut rng = config.rng();

    let points = generate_points(count, source, &config.sampler, &mut rng)?;
    let identified = IdentifiedPoint::enumerate(&points);
    best_sequence(&identified, &config.sequencer, &mut rng)
}
