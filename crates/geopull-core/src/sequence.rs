//! Dispersion ordering: visit points so each next one is as far as possible
//! from everything visited so far.
//!
//! Exact farthest-point ordering costs `O(n²)` distance lookups per step.
//! Two approximations keep it tractable for thousands of points:
//!
//! 1. **Bounded pools.** Each step compares a random subset of at most
//!    `pool_limit` traveled points against a random subset of at most
//!    `pool_limit` remaining points, so a step costs `O(pool_limit²)`
//!    regardless of input size.
//! 2. **Partitions.** The input is cut into consecutive chunks of
//!    `partition_size` points, each ordered independently with its own
//!    distance graph. Points in different partitions are never compared,
//!    so the result is a concatenation of locally dispersed runs.
//!
//! Partitions are processed one after another with the caller's RNG, which
//! keeps seeded runs reproducible.

use std::collections::HashSet;

use rand::Rng;

use crate::graph::DistanceGraph;
use crate::types::{GeopullError, IdentifiedPoint, Result, SequencerConfig};

/// Outcome of [`sequence_points`]: the ordering plus work statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRun {
    pub order: Vec<IdentifiedPoint>,
    pub partition_count: usize,
    /// Distances computed across all partition graphs.
    pub distance_computations: usize,
}

/// Select the candidate whose nearest traveled point is farthest away.
///
/// Each candidate in `choice` is scored by its distance to the nearest
/// point of `traveled`; the highest score wins, and ties go to the earlier
/// candidate. With `skip_first_candidate` the first element of `choice` is
/// never considered.
///
/// # Errors
///
/// Returns [`GeopullError::InvariantViolation`] if no candidate is left to
/// consider, `traveled` is empty, or `graph` lacks a required
/// candidate-to-traveled distance (extend the graph first).
pub fn pick_most_isolated_choice(
    traveled: &[IdentifiedPoint],
    choice: &[IdentifiedPoint],
    graph: &DistanceGraph,
    skip_first_candidate: bool,
) -> Result<IdentifiedPoint> {
    most_isolated_index(traveled, choice, graph, skip_first_candidate).map(|i| choice[i])
}

/// Index into `choice` of the most isolated candidate.
fn most_isolated_index(
    traveled: &[IdentifiedPoint],
    choice: &[IdentifiedPoint],
    graph: &DistanceGraph,
    skip_first_candidate: bool,
) -> Result<usize> {
    let first_candidate = usize::from(skip_first_candidate);
    if choice.len() <= first_candidate {
        return Err(GeopullError::InvariantViolation(format!(
            "need at least {} choice point(s) to select from, got {}",
            first_candidate + 1,
            choice.len(),
        )));
    }
    if traveled.is_empty() {
        return Err(GeopullError::InvariantViolation(
            "cannot score candidates against an empty traveled set".to_string(),
        ));
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in choice.iter().enumerate().skip(first_candidate) {
        let mut nearest = f64::INFINITY;
        for t in traveled {
            let d = graph.get(candidate.id, t.id).ok_or_else(|| {
                GeopullError::InvariantViolation(format!(
                    "distance graph has no entry {} -> {}",
                    candidate.id, t.id,
                ))
            })?;
            nearest = nearest.min(d);
        }
        if best.is_none_or(|(_, best_distance)| nearest > best_distance) {
            best = Some((i, nearest));
        }
    }

    best.map(|(i, _)| i).ok_or_else(|| {
        GeopullError::InvariantViolation("no candidate was scored".to_string())
    })
}

/// Up to `limit` points: all of them in order when they fit, otherwise a
/// uniform random sample in random order.
fn random_subset<R: Rng + ?Sized>(
    rng: &mut R,
    points: &[IdentifiedPoint],
    limit: usize,
) -> Vec<IdentifiedPoint> {
    if limit >= points.len() {
        return points.to_vec();
    }
    rand::seq::index::sample(rng, points.len(), limit)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Reject inputs where one ID labels two points.
fn check_unique_ids<'a>(points: impl IntoIterator<Item = &'a IdentifiedPoint>) -> Result<()> {
    let mut seen = HashSet::new();
    for p in points {
        if !seen.insert(p.id) {
            return Err(GeopullError::InvalidInput(format!(
                "point id {} appears more than once",
                p.id,
            )));
        }
    }
    Ok(())
}

/// Order `traveled ++ choice` by repeated farthest-point selection.
///
/// Each step draws bounded random pools from both sets, extends `graph`
/// for exactly that pairing, and moves the most isolated pooled choice
/// point to the end of `traveled`. The last remaining choice point is
/// appended as-is. The returned order starts with `traveled` unchanged;
/// an empty `traveled` is seeded with the first choice point.
///
/// # Errors
///
/// Returns [`GeopullError::InvalidInput`] for an invalid config or
/// duplicate IDs, and propagates selection errors.
pub fn greedy_sequence<R: Rng + ?Sized>(
    mut traveled: Vec<IdentifiedPoint>,
    mut choice: Vec<IdentifiedPoint>,
    graph: &mut DistanceGraph,
    config: &SequencerConfig,
    rng: &mut R,
) -> Result<Vec<IdentifiedPoint>> {
    config.validate()?;
    check_unique_ids(traveled.iter().chain(&choice))?;

    if traveled.is_empty() && !choice.is_empty() {
        traveled.push(choice.remove(0));
    }

    while choice.len() > 1 {
        let traveled_pool = random_subset(rng, &traveled, config.pool_limit);
        let choice_pool = random_subset(rng, &choice, config.pool_limit);
        graph.extend(&traveled_pool, &choice_pool);

        let picked = choice_pool[most_isolated_index(
            &traveled_pool,
            &choice_pool,
            graph,
            config.skip_first_candidate,
        )?];
        let Some(position) = choice.iter().position(|p| p.id == picked.id) else {
            return Err(GeopullError::InvariantViolation(format!(
                "selected point {} is not in the choice set",
                picked.id,
            )));
        };
        traveled.push(choice.remove(position));
    }

    traveled.append(&mut choice);
    Ok(traveled)
}

/// Order `points` for maximum spread, partition by partition.
///
/// Each partition of `config.partition_size` consecutive points starts from
/// its own first point and a fresh [`DistanceGraph`]. Partition orders are
/// concatenated in input order.
///
/// # Errors
///
/// Returns [`GeopullError::InvalidInput`] for an invalid config or
/// duplicate IDs.
pub fn best_sequence<R: Rng + ?Sized>(
    points: &[IdentifiedPoint],
    config: &SequencerConfig,
    rng: &mut R,
) -> Result<Vec<IdentifiedPoint>> {
    sequence_points(points, config, rng).map(|run| run.order)
}

/// [`best_sequence`] with work statistics.
///
/// # Errors
///
/// See [`best_sequence`].
pub fn sequence_points<R: Rng + ?Sized>(
    points: &[IdentifiedPoint],
    config: &SequencerConfig,
    rng: &mut R,
) -> Result<SequenceRun> {
    config.validate()?;
    check_unique_ids(points)?;

    let mut order = Vec::with_capacity(points.len());
    let mut partition_count = 0;
    let mut distance_computations = 0;

    for (index, partition) in points.chunks(config.partition_size).enumerate() {
        let (first, rest) = partition.split_at(1);
        let mut graph = DistanceGraph::new();
        let ordered = greedy_sequence(first.to_vec(), rest.to_vec(), &mut graph, config, rng)?;

        log::debug!(
            "sequencer: partition {index} ordered {} points with {} distance computations",
            ordered.len(),
            graph.computed(),
        );
        partition_count += 1;
        distance_computations += graph.computed();
        order.extend(ordered);
    }

    log::info!(
        "sequencer: ordered {} points in {partition_count} partition(s)",
        order.len(),
    );
    Ok(SequenceRun {
        order,
        partition_count,
        distance_computations,
    })
}
