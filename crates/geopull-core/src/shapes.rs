//! Polygon sources: where the sampler gets its rings from.
//!
//! The sampler only needs a list of [`Polygon`] rings. This module defines
//! the [`PolygonSource`] trait for supplying them and adapters for `geo`
//! geometries and attribute-tagged shape records.
//!
//! Every adapter keeps only the **first ring** of a multi-ring shape.
//! Holes and additional parts are dropped (with a debug log entry), so a
//! point sampled inside a lake of an island polygon is accepted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{GeopullError, Point, Polygon, Result};

/// Supplies the polygon rings that constrain sampling.
pub trait PolygonSource {
    /// Load the rings.
    ///
    /// # Errors
    ///
    /// Returns [`GeopullError::InvalidInput`] if the source cannot produce
    /// rings (e.g. an unknown filter field).
    fn polygons(&self) -> Result<Vec<Polygon>>;
}

impl PolygonSource for [Polygon] {
    fn polygons(&self) -> Result<Vec<Polygon>> {
        Ok(self.to_vec())
    }
}

impl PolygonSource for Vec<Polygon> {
    fn polygons(&self) -> Result<Vec<Polygon>> {
        Ok(self.clone())
    }
}

impl PolygonSource for geo::Polygon<f64> {
    fn polygons(&self) -> Result<Vec<Polygon>> {
        Ok(vec![exterior_ring(self)])
    }
}

impl PolygonSource for geo::MultiPolygon<f64> {
    fn polygons(&self) -> Result<Vec<Polygon>> {
        Ok(self.iter().map(exterior_ring).collect())
    }
}

/// Exterior ring of a `geo` polygon; interior rings are dropped.
fn exterior_ring(polygon: &geo::Polygon<f64>) -> Polygon {
    if !polygon.interiors().is_empty() {
        log::debug!(
            "shapes: dropping {} interior ring(s), keeping exterior only",
            polygon.interiors().len(),
        );
    }
    Polygon::from(polygon.exterior())
}

/// One shape from a shape store: attribute fields plus one or more rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// Attribute table row, field name to value.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Rings (parts) of the shape in storage order.
    pub parts: Vec<Vec<Point>>,
}

impl ShapeRecord {
    /// The first ring, or an empty polygon for a shape with no parts.
    #[must_use]
    pub fn first_ring(&self) -> Polygon {
        if self.parts.len() > 1 {
            log::debug!(
                "shapes: dropping {} trailing part(s) of multi-part shape",
                self.parts.len() - 1,
            );
        }
        Polygon::new(self.parts.first().cloned().unwrap_or_default())
    }
}

/// Shape records filtered by an attribute predicate (`field == value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFilter {
    pub records: Vec<ShapeRecord>,
    pub field: String,
    pub value: String,
}

impl ShapeFilter {
    pub const DEFAULT_FIELD: &'static str = "TYPE";
    /// Land polygons in the shoreline data set the tool was built for.
    pub const DEFAULT_VALUE: &'static str = "LND";

    /// Filter `records` with the default `TYPE = LND` predicate.
    #[must_use]
    pub fn land(records: Vec<ShapeRecord>) -> Self {
        Self::new(records, Self::DEFAULT_FIELD, Self::DEFAULT_VALUE)
    }

    /// Filter `records` by `field == value`.
    #[must_use]
    pub fn new(records: Vec<ShapeRecord>, field: &str, value: &str) -> Self {
        Self {
            records,
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl PolygonSource for ShapeFilter {
    /// First rings of all records whose `field` equals `value`.
    ///
    /// The attribute table has one schema, so a field absent from every
    /// record is an error rather than an empty match.
    fn polygons(&self) -> Result<Vec<Polygon>> {
        if !self.records.is_empty()
            && !self
                .records
                .iter()
                .any(|r| r.fields.contains_key(&self.field))
        {
            return Err(GeopullError::InvalidInput(format!(
                "no shape has a field named {:?}",
                self.field,
            )));
        }

        let rings: Vec<Polygon> = self
            .records
            .iter()
            .filter(|r| r.fields.get(&self.field) == Some(&self.value))
            .map(ShapeRecord::first_ring)
            .collect();

        log::debug!(
            "shapes: {} of {} records match {}={}",
            rings.len(),
            self.records.len(),
            self.field,
            self.value,
        );
        Ok(rings)
    }
}
