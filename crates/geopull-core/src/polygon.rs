//! Polygon containment and extents.
//!
//! Containment uses the ray-casting parity rule: a ray cast from the query
//! point in the +x direction crosses the ring boundary an odd number of
//! times exactly when the point is inside. Works for concave rings and
//! needs no orientation or closing vertex.

use crate::types::{BoundingBox, GeopullError, Point, Polygon, Result};

/// Test whether `point` lies inside `polygon`.
///
/// Walks the `n + 1` consecutive vertex pairs of an `n`-vertex ring (the
/// final pair wraps back to the first vertex). An edge is a crossing
/// candidate only when `min(y1, y2) < y <= max(y1, y2)`, which counts a
/// ray through a shared vertex once, and when the point is not right of
/// both endpoints. Horizontal edges can never satisfy the half-open y test,
/// so no slope is ever computed for them.
///
/// Points exactly on the boundary may land on either side.
#[must_use]
pub fn point_in_polygon(point: Point, polygon: &Polygon) -> bool {
    let vertices = polygon.vertices();
    let Some(&first) = vertices.first() else {
        return false;
    };
    let n = vertices.len();

    let mut inside = false;
    let mut p1 = first;
    for i in 0..=n {
        let p2 = vertices[i % n];
        if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x) {
            #[allow(clippy::float_cmp)]
            let crosses = if p1.x == p2.x {
                true
            } else {
                // p1.y != p2.y is guaranteed by the strict lower bound above.
                let x_intersection = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
                point.x <= x_intersection
            };
            if crosses {
                inside = !inside;
            }
        }
        p1 = p2;
    }

    inside
}

/// Test whether `point` lies inside at least one polygon.
#[must_use]
pub fn point_in_any(point: Point, polygons: &[Polygon]) -> bool {
    polygons.iter().any(|polygon| point_in_polygon(point, polygon))
}

/// Component-wise extrema over every vertex of every polygon.
///
/// # Errors
///
/// Returns [`GeopullError::InvalidInput`] if the collection is empty or
/// contains no vertices at all.
pub fn bounding_box(polygons: &[Polygon]) -> Result<BoundingBox> {
    let mut vertices = polygons.iter().flat_map(Polygon::vertices);
    let Some(first) = vertices.next() else {
        return Err(GeopullError::InvalidInput(
            "cannot bound an empty polygon collection".to_string(),
        ));
    };

    Ok(vertices.fold(
        BoundingBox {
            max_x: first.x,
            max_y: first.y,
            min_x: first.x,
            min_y: first.y,
        },
        |bbox, p| BoundingBox {
            max_x: bbox.max_x.max(p.x),
            max_y: bbox.max_y.max(p.y),
            min_x: bbox.min_x.min(p.x),
            min_y: bbox.min_y.min(p.y),
        },
    ))
}
