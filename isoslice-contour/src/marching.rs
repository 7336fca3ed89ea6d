//! Marching cubes over canonical cells
//!
//! The kernel shared by iso-surfaces and plane sections: classify one cell
//! against a reference value, interpolate the crossed edges once each and
//! emit the triangles of the case table row.

use crate::{
    canonical::Cell,
    classify::{case_index, case_triangles},
    interpolate::{interpolate_edge, EdgePoint},
    subdivide::MAX_SUBDIVISIONS,
};
use isoslice_core::{BoundaryEdge, Element, MeshProvider, Point3f, Vector3f, VisibilityOracle};
use itertools::Itertools;

/// A triangle cut from one cell, before normals and texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellTriangle {
    pub positions: [Point3f; 3],
    pub values: [f32; 3],
    pub gradients: Option<[Vector3f; 3]>,
    /// Cell edges the vertices lie on
    pub edges: [usize; 3],
}

/// Classify a cell and append its triangles to `out`; returns the case index
pub fn march_cell(cell: &Cell, reference: f32, out: &mut Vec<CellTriangle>) -> u8 {
    let case = case_index(&cell.levels, reference);
    if case == 0 || case == 255 {
        return case;
    }

    let mut points: [Option<EdgePoint>; 12] = [None; 12];
    for edges in case_triangles(case) {
        let p = edges
            .map(|e| *points[e].get_or_insert_with(|| interpolate_edge(cell, e, reference)));
        out.push(CellTriangle {
            positions: p.map(|q| q.position),
            values: p.map(|q| q.value),
            gradients: cell
                .gradients
                .map(|_| p.map(|q| q.gradient.unwrap_or_else(Vector3f::zeros))),
            edges,
        });
    }
    case
}

/// Outline of a cell's cut polygon: triangle sides not shared with another
/// triangle of the same cell
pub fn cell_outline(cell: &Cell, triangles: &[CellTriangle]) -> Vec<BoundaryEdge> {
    let side = |t: &CellTriangle, k: usize| {
        let (a, b) = (t.edges[k], t.edges[(k + 1) % 3]);
        (a.min(b), a.max(b))
    };
    let counts = triangles
        .iter()
        .flat_map(|t| (0..3).map(move |k| side(t, k)))
        .counts();

    triangles
        .iter()
        .flat_map(|t| (0..3).map(move |k| (t, k)))
        .filter(|&(t, k)| counts.get(&side(t, k)) == Some(&1))
        .map(|(t, k)| BoundaryEdge {
            points: [t.positions[k], t.positions[(k + 1) % 3]],
            element: cell.element,
        })
        .collect()
}

/// Subdivision factor actually used for a requested one
pub fn effective_subdivisions(requested: usize) -> usize {
    if requested > MAX_SUBDIVISIONS {
        tracing::warn!(
            requested,
            max = MAX_SUBDIVISIONS,
            "clamping cell subdivision"
        );
        MAX_SUBDIVISIONS
    } else {
        requested.max(1)
    }
}

/// Whether an element takes part in an iso-surface sweep
pub fn iso_eligible<M>(mesh: &M, element: &Element, cut_hidden: bool) -> bool
where
    M: VisibilityOracle + ?Sized,
{
    element.is_solid()
        && (element.visible || cut_hidden)
        && mesh
            .material(element.material)
            .is_some_and(|flags| flags.enabled)
}

/// Whether an element takes part in a plane-cut sweep
pub fn section_eligible<M>(mesh: &M, element: &Element, cut_hidden: bool) -> bool
where
    M: VisibilityOracle + ?Sized,
{
    element.is_solid()
        && (element.visible || cut_hidden)
        && mesh
            .material(element.material)
            .is_some_and(|flags| flags.clip && (flags.visible || cut_hidden))
}

/// Whether the cell's levels straddle the reference value
pub fn straddles(cell: &Cell, reference: f32) -> bool {
    let (lo, hi) = cell.level_range();
    reference > lo && reference <= hi
}

/// Number of solid elements, for logging
pub fn solid_count<M>(mesh: &M) -> usize
where
    M: MeshProvider + ?Sized,
{
    (0..mesh.element_count())
        .filter(|&i| mesh.element(i).is_solid())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolate::flat_normal;
    use approx::assert_relative_eq;

    fn unit_cell(values: [f32; 8]) -> Cell {
        Cell {
            element: 0,
            nodes: [0, 1, 2, 3, 4, 5, 6, 7],
            positions: [
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
                Point3f::new(1.0, 0.0, 1.0),
                Point3f::new(1.0, 1.0, 1.0),
                Point3f::new(0.0, 1.0, 1.0),
            ],
            levels: values,
            values,
            gradients: None,
        }
    }

    #[test]
    fn test_mid_height_square() {
        let cell = unit_cell([0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let mut out = Vec::new();
        assert_eq!(march_cell(&cell, 0.5, &mut out), 0b1111_0000);
        assert_eq!(out.len(), 2);
        let area: f32 = out
            .iter()
            .map(|t| {
                let [a, b, c] = t.positions;
                (b - a).cross(&(c - a)).magnitude() * 0.5
            })
            .sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-6);
        for t in &out {
            for p in &t.positions {
                assert_relative_eq!(p.z, 0.5, epsilon = 1e-6);
            }
            // normals point toward the higher values
            assert_relative_eq!(flat_normal(&t.positions), Vector3f::z(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_uniform_cell_is_empty() {
        let cell = unit_cell([2.0; 8]);
        let mut out = Vec::new();
        assert_eq!(march_cell(&cell, 1.0, &mut out), 255);
        assert_eq!(march_cell(&cell, 3.0, &mut out), 0);
        assert!(out.is_empty());
        assert!(!straddles(&cell, 2.0));
    }

    #[test]
    fn test_outline_of_square_cut() {
        let cell = unit_cell([0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let mut out = Vec::new();
        march_cell(&cell, 0.5, &mut out);
        let outline = cell_outline(&cell, &out);
        // the shared diagonal is dropped
        assert_eq!(outline.len(), 4);
        let perimeter: f32 = outline.iter().map(BoundaryEdge::length).sum();
        assert_relative_eq!(perimeter, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_clamped_subdivisions() {
        assert_eq!(effective_subdivisions(1), 1);
        assert_eq!(effective_subdivisions(3), 3);
        assert_eq!(effective_subdivisions(50), MAX_SUBDIVISIONS);
    }
}
