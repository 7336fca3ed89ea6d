//! Linear interpolation of crossing points along cell edges

use crate::{canonical::Cell, tables::HEX_EDGES};
use isoslice_core::{Point3f, Vector3f};

/// A crossing point on one cell edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePoint {
    pub position: Point3f,
    /// Carried field value at the crossing
    pub value: f32,
    /// Unit interpolated gradient, when the cell carries gradients
    pub gradient: Option<Vector3f>,
}

/// Fraction `w` along `v0 -> v1` where the reference value is crossed
///
/// Falls back to `0.5` on a flat edge and is clamped to `[0, 1]`.
pub fn crossing_fraction(v0: f32, v1: f32, reference: f32) -> f32 {
    let dv = v1 - v0;
    if dv == 0.0 || !dv.is_finite() {
        return 0.5;
    }
    let w = (reference - v0) / dv;
    if w.is_nan() {
        0.5
    } else {
        w.clamp(0.0, 1.0)
    }
}

/// Interpolate position, value and gradient where `edge` crosses `reference`
pub fn interpolate_edge(cell: &Cell, edge: usize, reference: f32) -> EdgePoint {
    let [a, b] = HEX_EDGES[edge];
    let w = crossing_fraction(cell.levels[a], cell.levels[b], reference);

    let p0 = cell.positions[a];
    let p1 = cell.positions[b];
    let position = p0 + (p1 - p0) * w;
    let value = cell.values[a] * (1.0 - w) + cell.values[b] * w;
    let gradient = cell.gradients.map(|g| {
        (g[a] * (1.0 - w) + g[b] * w)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3f::zeros)
    });

    EdgePoint {
        position,
        value,
        gradient,
    }
}

/// Unit normal `(r1 - r0) x (r2 - r0)`, zero for degenerate triangles
pub fn flat_normal(positions: &[Point3f; 3]) -> Vector3f {
    let [r0, r1, r2] = positions;
    (r1 - r0)
        .cross(&(r2 - r0))
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3f::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cell(values: [f32; 8]) -> Cell {
        let positions = [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(1.0, 0.0, 1.0),
            Point3f::new(1.0, 1.0, 1.0),
            Point3f::new(0.0, 1.0, 1.0),
        ];
        Cell {
            element: 0,
            nodes: [0, 1, 2, 3, 4, 5, 6, 7],
            positions,
            levels: values,
            values,
            gradients: None,
        }
    }

    #[test]
    fn test_fraction() {
        assert_relative_eq!(crossing_fraction(0.0, 4.0, 1.0), 0.25);
        assert_relative_eq!(crossing_fraction(2.0, 2.0, 2.0), 0.5);
        assert_relative_eq!(crossing_fraction(0.0, 1.0, 5.0), 1.0);
        assert_relative_eq!(crossing_fraction(1.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(crossing_fraction(0.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_corner_on_reference_snaps_to_corner() {
        let cell = unit_cell([0.5, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        // edge 8 joins corners 0 and 4
        let p = interpolate_edge(&cell, 8, 0.5);
        assert_relative_eq!(p.position, cell.positions[0], epsilon = 1e-6);
        assert_relative_eq!(p.value, 0.5);
        assert!(p.gradient.is_none());
    }

    #[test]
    fn test_midpoint_with_gradients() {
        let mut cell = unit_cell([0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        cell.gradients = Some([Vector3f::new(0.0, 0.0, 3.0); 8]);
        let p = interpolate_edge(&cell, 9, 0.5);
        assert_relative_eq!(p.position, Point3f::new(1.0, 0.0, 0.5));
        assert_relative_eq!(p.gradient.unwrap(), Vector3f::z());
    }

    #[test]
    fn test_flat_normal_right_handed() {
        let n = flat_normal(&[
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ]);
        assert_relative_eq!(n, Vector3f::z());
        assert_eq!(flat_normal(&[Point3f::origin(); 3]), Vector3f::zeros());
    }
}
