//! Core traits for isoslice
//!
//! The contouring kernel never owns mesh data. It reads the active state of a
//! model through [`MeshProvider`] and asks a [`VisibilityOracle`] which
//! materials take part in a sweep.

use crate::{
    element::Element, field::FieldSelector, material::MaterialFlags, point::*, Result,
};

/// A 2-D boundary facet of the volumetric mesh
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Face {
    /// Three or four corner node indices, counter-clockwise seen from outside
    pub nodes: Vec<usize>,
    /// Element the facet belongs to
    pub element: usize,
}

/// Read-only view of one mesh state (node positions, connectivity and fields)
pub trait MeshProvider: Sync {
    fn node_count(&self) -> usize;

    /// Current (possibly deformed) node position
    fn node_position(&self, node: usize) -> Point3f;

    fn element_count(&self) -> usize;

    fn element(&self, index: usize) -> &Element;

    /// Number of boundary facets; zero when the provider has none
    fn face_count(&self) -> usize {
        0
    }

    fn face(&self, index: usize) -> Option<&Face> {
        let _ = index;
        None
    }

    /// Values of the selected field, one per node or per element
    ///
    /// Fails when the field does not exist or has the wrong number of values.
    fn field(&self, selector: &FieldSelector) -> Result<&[f32]>;

    /// Bounding box of all node positions
    fn bounding_box(&self) -> Option<BoundingBox> {
        let positions: Vec<Point3f> = (0..self.node_count())
            .map(|i| self.node_position(i))
            .collect();
        BoundingBox::from_points(&positions)
    }
}

/// Answers which materials are enabled, visible and cuttable
pub trait VisibilityOracle: Sync {
    /// Flags for a material id, `None` for unknown ids
    fn material(&self, id: usize) -> Option<MaterialFlags>;
}
