//! Indexed triangle meshes handed to renderers and exporters

use crate::point::*;
use serde::{Deserialize, Serialize};

/// Triangles over a shared vertex list, with per-vertex render attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Vec<Vector3f>,
    /// Scalar texture coordinate per vertex for 1-D color map lookup
    pub tex_coords: Vec<f32>,
    /// Flat colors per vertex, only for discrete multi-level surfaces
    pub colors: Option<Vec<[u8; 3]>>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Whether every attribute has one entry per vertex and every face
    /// references existing vertices
    pub fn is_consistent(&self) -> bool {
        let n = self.vertices.len();
        self.normals.len() == n
            && self.tex_coords.len() == n
            && self.colors.as_ref().map_or(true, |c| c.len() == n)
            && self.faces.iter().flatten().all(|&i| i < n)
    }

    pub fn area(&self) -> f32 {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let r0 = self.vertices[a];
                (self.vertices[b] - r0).cross(&(self.vertices[c] - r0)).magnitude() * 0.5
            })
            .sum()
    }
}
