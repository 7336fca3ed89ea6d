//! Triangle soup produced by contouring sweeps

use crate::{mesh::TriangleMesh, point::*, range::ValueRange};
use serde::{Deserialize, Serialize};

/// One output triangle with per-vertex attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceTriangle {
    pub positions: [Point3f; 3],
    pub normals: [Vector3f; 3],
    /// Raw interpolated field values
    pub values: [f32; 3],
    /// Texture coordinates for color map lookup
    pub tex: [f32; 3],
    /// Index of the element the triangle was cut from
    pub element: usize,
    pub material: usize,
    pub active: bool,
    /// Flat color, set for discrete multi-level iso-surfaces
    pub color: Option<[u8; 3]>,
}

impl SliceTriangle {
    /// Right-handed normal `(r1 - r0) x (r2 - r0)`, unnormalized
    pub fn face_normal(&self) -> Vector3f {
        let [r0, r1, r2] = self.positions;
        (r1 - r0).cross(&(r2 - r0))
    }

    pub fn area(&self) -> f32 {
        self.face_normal().magnitude() * 0.5
    }

    pub fn mean_value(&self) -> f32 {
        (self.values[0] + self.values[1] + self.values[2]) / 3.0
    }
}

/// A segment where a cutting plane crosses the mesh boundary or a cell face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryEdge {
    pub points: [Point3f; 2],
    pub element: usize,
}

impl BoundaryEdge {
    pub fn length(&self) -> f32 {
        (self.points[1] - self.points[0]).magnitude()
    }
}

/// Append-only triangle list, rebuilt on every sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleBuffer {
    pub triangles: Vec<SliceTriangle>,
    /// Sweep generation that produced this buffer
    pub generation: u64,
}

impl TriangleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generation(generation: u64) -> Self {
        Self {
            triangles: Vec::new(),
            generation,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn push(&mut self, triangle: SliceTriangle) {
        self.triangles.push(triangle);
    }

    pub fn extend(&mut self, triangles: impl IntoIterator<Item = SliceTriangle>) {
        self.triangles.extend(triangles);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SliceTriangle> {
        self.triangles.iter()
    }

    /// Total area of all triangles
    pub fn area(&self) -> f32 {
        self.triangles.iter().map(SliceTriangle::area).sum()
    }

    /// Integral of the raw field over the triangles (area times mean vertex value)
    pub fn integrate(&self) -> f32 {
        self.triangles
            .iter()
            .map(|t| t.area() * t.mean_value())
            .sum()
    }

    /// Extrema of the raw vertex values
    pub fn value_range(&self) -> Option<ValueRange> {
        ValueRange::of_values(self.triangles.iter().flat_map(|t| t.values.iter()))
    }

    /// Flattened vertex stream, three vertices per triangle
    pub fn vertices(&self) -> Vec<SliceVertex> {
        self.triangles
            .iter()
            .flat_map(|t| {
                (0..3).map(move |k| SliceVertex {
                    position: t.positions[k].coords.into(),
                    normal: t.normals[k].into(),
                    tex: t.tex[k],
                })
            })
            .collect()
    }

    /// Convert to an indexed mesh, one vertex per triangle corner
    pub fn to_mesh(&self) -> TriangleMesh {
        let n = self.triangles.len();
        let mut vertices = Vec::with_capacity(3 * n);
        let mut normals = Vec::with_capacity(3 * n);
        let mut tex_coords = Vec::with_capacity(3 * n);
        let mut colors = Vec::with_capacity(3 * n);
        let mut faces = Vec::with_capacity(n);
        let has_colors = self.triangles.iter().any(|t| t.color.is_some());

        for t in &self.triangles {
            let base = vertices.len();
            vertices.extend_from_slice(&t.positions);
            normals.extend_from_slice(&t.normals);
            tex_coords.extend_from_slice(&t.tex);
            let c = t.color.unwrap_or([255, 255, 255]);
            colors.extend_from_slice(&[c, c, c]);
            faces.push([base, base + 1, base + 2]);
        }

        TriangleMesh {
            vertices,
            faces,
            normals,
            tex_coords,
            colors: has_colors.then_some(colors),
        }
    }
}

impl<'a> IntoIterator for &'a TriangleBuffer {
    type Item = &'a SliceTriangle;
    type IntoIter = std::slice::Iter<'a, SliceTriangle>;

    fn into_iter(self) -> Self::IntoIter {
        self.triangles.iter()
    }
}
