//! Integration test: sample inside a concave coastline-like polygon set and
//! check that the planned order spreads early queries out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use geopull_core::{
    IdentifiedPoint, PlanConfig, Point, Polygon, SequencerConfig, best_sequence, plan_queries,
    point_in_any,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Smallest pairwise distance among the first `k` points.
fn min_pairwise(points: &[IdentifiedPoint], k: usize) -> f64 {
    let head = &points[..k];
    let mut best = f64::INFINITY;
    for (i, a) in head.iter().enumerate() {
        for b in &head[i + 1..] {
            best = best.min(a.point.distance(b.point));
        }
    }
    best
}

/// A C-shaped bay plus an offshore island.
fn bay_and_island() -> Vec<Polygon> {
    let bay = [
        (0.0, 0.0),
        (10.0, 0.0),
        (10.0, 2.0),
        (2.0, 2.0),
        (2.0, 8.0),
        (10.0, 8.0),
        (10.0, 10.0),
        (0.0, 10.0),
    ];
    let island = [(6.0, 4.0), (8.0, 4.0), (8.0, 6.0), (6.0, 6.0)];
    [&bay[..], &island[..]]
        .iter()
        .map(|ring| Polygon::new(ring.iter().map(|&(x, y)| Point::new(x, y)).collect()))
        .collect()
}

#[test]
fn planned_points_avoid_the_bay() {
    let polygons = bay_and_island();
    let config = PlanConfig {
        seed: Some(495),
        ..PlanConfig::default()
    };
    let plan = plan_queries(1_000, &polygons, &config).expect("planning should succeed");

    assert_eq!(plan.len(), 1_000);
    for p in &plan {
        assert!(point_in_any(p.point, &polygons), "{p:?} is in the water");
        // Open water of the bay, outside the island.
        let in_bay = p.point.x > 2.0 && p.point.y > 2.0 && p.point.y < 8.0;
        let on_island = (6.0..=8.0).contains(&p.point.x) && (4.0..=6.0).contains(&p.point.y);
        assert!(!in_bay || on_island, "{p:?} is in the bay");
    }
}

#[test]
fn ordering_spreads_early_queries() {
    let polygons = bay_and_island();
    let config = PlanConfig {
        seed: Some(14),
        ..PlanConfig::default()
    };
    let plan = plan_queries(600, &polygons, &config).unwrap();

    // Same points in draw (ID) order, i.e. unsequenced.
    let mut drawn = plan.clone();
    drawn.sort_unstable_by_key(|p| p.id);

    let sequenced_spread = min_pairwise(&plan, 10);
    let drawn_spread = min_pairwise(&drawn, 10);
    assert!(
        sequenced_spread > drawn_spread,
        "sequenced spread {sequenced_spread} should beat draw-order spread {drawn_spread}",
    );
}

#[test]
fn many_partitions_cover_every_point_once() {
    let mut rng = StdRng::seed_from_u64(2000);
    let points = geopull_core::generate_points(
        2_000,
        &bay_and_island(),
        &geopull_core::SamplerConfig::default(),
        &mut rng,
    )
    .unwrap();
    let identified = IdentifiedPoint::enumerate(&points);

    // A small pool keeps the run fast; coverage does not depend on it.
    let config = SequencerConfig {
        pool_limit: 20,
        ..SequencerConfig::default()
    };
    let order = best_sequence(&identified, &config, &mut rng).unwrap();

    assert_eq!(order.len(), 2_000);
    let mut seen = vec![false; 2_000];
    for p in &order {
        let slot = usize::try_from(p.id).unwrap();
        assert!(!seen[slot], "id {} emitted twice", p.id);
        seen[slot] = true;
    }
    // Partitions of 800 start with their own first point.
    assert_eq!(order[0].id, 0);
    assert_eq!(order[800].id, 800);
    assert_eq!(order[1600].id, 1600);
}
