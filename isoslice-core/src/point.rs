//! Point types and related functionality

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A vertex of an extracted surface, laid out for upload to a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct SliceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex: f32,
}

unsafe impl Pod for SliceVertex {}
unsafe impl Zeroable for SliceVertex {}

impl Default for SliceVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            tex: 0.0,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    /// Smallest box containing all points, `None` when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3f>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.min.z = bbox.min.z.min(p.z);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
            bbox.max.z = bbox.max.z.max(p.z);
        }
        Some(bbox)
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half the length of the diagonal
    pub fn radius(&self) -> f32 {
        (self.max - self.min).magnitude() * 0.5
    }

    /// Extent of the box projected on a direction, as (min, max) of `n·p` over the corners
    pub fn range_along(&self, direction: &Vector3f) -> (f32, f32) {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for i in 0..8 {
            let corner = Point3f::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let d = direction.dot(&corner.coords);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_from_points() {
        let points = vec![
            Point3f::new(1.0, -1.0, 0.0),
            Point3f::new(-2.0, 3.0, 0.5),
            Point3f::new(0.0, 0.0, 2.0),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, Point3f::new(-2.0, -1.0, 0.0));
        assert_eq!(bbox.max, Point3f::new(1.0, 3.0, 2.0));
        assert!(BoundingBox::from_points(&Vec::<Point3f>::new()).is_none());
    }

    #[test]
    fn test_range_along_direction() {
        let bbox = BoundingBox {
            min: Point3f::new(0.0, 0.0, 0.0),
            max: Point3f::new(2.0, 1.0, 1.0),
        };
        let (lo, hi) = bbox.range_along(&Vector3f::x());
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 2.0);

        let (lo, hi) = bbox.range_along(&-Vector3f::y());
        assert_relative_eq!(lo, -1.0);
        assert_relative_eq!(hi, 0.0);
        assert_relative_eq!(bbox.radius(), 6.0_f32.sqrt() * 0.5);
    }
}
