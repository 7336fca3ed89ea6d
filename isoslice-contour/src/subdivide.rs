//! Regular refinement of canonical cells with trilinear shape functions

use crate::canonical::Cell;
use isoslice_core::{Point3f, Vector3f};
use itertools::iproduct;

/// Largest accepted subdivision factor; larger requests are clamped
pub const MAX_SUBDIVISIONS: usize = 5;

/// Parametric corner coordinates of the canonical cell in `[-1, 1]³`
const CORNERS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Trilinear shape functions `H_i(r, s, t)` of the 8-node hexahedron
pub fn hex_shape(r: f32, s: f32, t: f32) -> [f32; 8] {
    CORNERS.map(|[ri, si, ti]| 0.125 * (1.0 + ri * r) * (1.0 + si * s) * (1.0 + ti * t))
}

/// Derivatives `[dH/dr, dH/ds, dH/dt]` of the shape functions
pub fn hex_shape_derivatives(r: f32, s: f32, t: f32) -> [[f32; 3]; 8] {
    CORNERS.map(|[ri, si, ti]| {
        [
            0.125 * ri * (1.0 + si * s) * (1.0 + ti * t),
            0.125 * si * (1.0 + ri * r) * (1.0 + ti * t),
            0.125 * ti * (1.0 + ri * r) * (1.0 + si * s),
        ]
    })
}

/// A lattice point: position, level, value, gradient and merged weights
type LatticePoint = (Point3f, f32, f32, Option<Vector3f>, [f32; 8]);

/// Shape weights summed over the slots sharing a node
///
/// Two lattice points land on the same place of a collapsed cell exactly
/// when these agree.
fn merged_weights(cell: &Cell, weights: &[f32; 8]) -> [f32; 8] {
    std::array::from_fn(|slot| {
        (0..8)
            .filter(|&m| cell.nodes[m] == cell.nodes[slot])
            .map(|m| weights[m])
            .sum()
    })
}

/// Local corner identities of a child; coinciding corners share the lowest slot
fn child_nodes(corners: &[&LatticePoint; 8]) -> [usize; 8] {
    std::array::from_fn(|c| {
        (0..c)
            .find(|&prev| {
                corners[prev]
                    .4
                    .iter()
                    .zip(&corners[c].4)
                    .all(|(a, b)| (a - b).abs() <= 1e-6)
            })
            .unwrap_or(c)
    })
}

/// Point of the cell at parametric coordinates
fn evaluate(cell: &Cell, weights: &[f32; 8]) -> LatticePoint {
    let mut position = Vector3f::zeros();
    let mut level = 0.0;
    let mut value = 0.0;
    for (k, &h) in weights.iter().enumerate() {
        position += cell.positions[k].coords * h;
        level += cell.levels[k] * h;
        value += cell.values[k] * h;
    }
    let gradient = cell.gradients.map(|g| {
        weights
            .iter()
            .zip(g.iter())
            .fold(Vector3f::zeros(), |acc, (&h, n)| acc + n * h)
    });
    let merged = merged_weights(cell, weights);
    (Point3f::from(position), level, value, gradient, merged)
}

/// Split a cell into `d³` children on a regular parametric lattice
///
/// Children keep the element index of their parent and are classified
/// independently. Their corners are numbered locally so that collapsed
/// child edges stay detectable. `d <= 1` returns the cell itself.
pub fn subdivide(cell: &Cell, d: usize) -> Vec<Cell> {
    if d <= 1 {
        return vec![*cell];
    }

    let n = d + 1;
    let step = 2.0 / d as f32;
    let lattice: Vec<_> = iproduct!(0..n, 0..n, 0..n)
        .map(|(k, j, i)| {
            let weights = hex_shape(
                -1.0 + i as f32 * step,
                -1.0 + j as f32 * step,
                -1.0 + k as f32 * step,
            );
            evaluate(cell, &weights)
        })
        .collect();
    let at = |i: usize, j: usize, k: usize| &lattice[i + n * (j + n * k)];

    iproduct!(0..d, 0..d, 0..d)
        .map(|(k, j, i)| {
            let corners = [
                at(i, j, k),
                at(i + 1, j, k),
                at(i + 1, j + 1, k),
                at(i, j + 1, k),
                at(i, j, k + 1),
                at(i + 1, j, k + 1),
                at(i + 1, j + 1, k + 1),
                at(i, j + 1, k + 1),
            ];
            let gradients = match cell.gradients {
                Some(_) => Some(corners.map(|c| c.3.unwrap_or_else(Vector3f::zeros))),
                None => None,
            };
            Cell {
                element: cell.element,
                nodes: child_nodes(&corners),
                positions: corners.map(|c| c.0),
                levels: corners.map(|c| c.1),
                values: corners.map(|c| c.2),
                gradients,
            }
        })
        .collect()
}
