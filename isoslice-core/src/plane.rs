//! Cutting planes

use crate::{point::*, Error, Result};
use serde::{Deserialize, Serialize};

/// A plane `n·r = d` with unit normal `n`
///
/// Points with `n·r >= d` lie above the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3f,
    pub offset: f32,
}

impl Plane {
    /// Build a plane from `(a, b, c, d)`, normalizing by the length of `(a, b, c)`
    ///
    /// A zero normal is kept as is rather than rejected, so the plane
    /// classifies every point as above when `d <= 0`.
    pub fn from_coefficients(eq: [f32; 4]) -> Result<Self> {
        if eq.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidData(format!(
                "Plane coefficients must be finite, got {:?}",
                eq
            )));
        }
        let mut length = (eq[0] * eq[0] + eq[1] * eq[1] + eq[2] * eq[2]).sqrt();
        if length == 0.0 {
            length = 1.0;
        }
        Ok(Self {
            normal: Vector3f::new(eq[0], eq[1], eq[2]) / length,
            offset: eq[3] / length,
        })
    }

    /// Plane with the given normal placed at `center·n + t·radius` of a bounding box
    ///
    /// `t` in `[-1, 1]` sweeps the plane across the whole box.
    pub fn from_relative_offset(normal: Vector3f, t: f32, bbox: &BoundingBox) -> Result<Self> {
        let unit = Self::from_coefficients([normal.x, normal.y, normal.z, 0.0])?;
        Ok(Self {
            normal: unit.normal,
            offset: t * bbox.radius() + unit.normal.dot(&bbox.center().coords),
        })
    }

    /// Coefficients `(a, b, c, d)` of the normalized plane
    pub fn coefficients(&self) -> [f32; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.offset]
    }

    /// Projection of a point on the normal; compared against `offset`
    pub fn level(&self, p: &Point3f) -> f32 {
        self.normal.dot(&p.coords)
    }

    pub fn signed_distance(&self, p: &Point3f) -> f32 {
        self.level(p) - self.offset
    }

    pub fn is_above(&self, p: &Point3f) -> bool {
        self.level(p) >= self.offset
    }
}
