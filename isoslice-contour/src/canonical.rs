//! Mapping of solid elements onto the 8-corner canonical cell
//!
//! Every solid element is viewed as a pseudo-hexahedron. Shapes with fewer
//! than eight corners repeat some of their corners so that the cube case
//! table can classify them unchanged.

use isoslice_core::{Element, ElementShape, ElementType, MeshProvider, Plane, Point3f, Vector3f};

/// Slot-to-corner map for hexahedra (identity)
pub const HEX_MAP: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
/// Wedges close their triangular faces by repeating corners 2 and 5
pub const PENTA_MAP: [usize; 8] = [0, 1, 2, 2, 3, 4, 5, 5];
/// Tetrahedra collapse the whole top face onto the apex
pub const TET_MAP: [usize; 8] = [0, 1, 2, 2, 3, 3, 3, 3];
/// Pyramids collapse the top face onto the apex
pub const PYRA_MAP: [usize; 8] = [0, 1, 2, 3, 4, 4, 4, 4];

/// Canonical slot map for an element type, `None` for shells and beams
pub fn canonical_map(element_type: ElementType) -> Option<&'static [usize; 8]> {
    match element_type.shape() {
        ElementShape::Hexahedron => Some(&HEX_MAP),
        ElementShape::Wedge => Some(&PENTA_MAP),
        ElementShape::Tetrahedron => Some(&TET_MAP),
        ElementShape::Pyramid => Some(&PYRA_MAP),
        ElementShape::Quadrilateral | ElementShape::Triangle | ElementShape::Line => None,
    }
}

/// One element laid out in canonical slot order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Index of the source element
    pub element: usize,
    /// Corner identity per slot; repeated for collapsed corners
    ///
    /// Mesh node indices for gathered cells. Subdivided children number
    /// their corners locally, so only equality between slots is meaningful.
    pub nodes: [usize; 8],
    pub positions: [Point3f; 8],
    /// Values compared against the reference value
    pub levels: [f32; 8],
    /// Field values carried onto the output vertices
    pub values: [f32; 8],
    pub gradients: Option<[Vector3f; 8]>,
}

impl Cell {
    /// Gather the canonical arrays of element `index`
    ///
    /// `values` holds one entry per node; it is used both as the level that is
    /// classified and as the carried field value. Returns `None` for
    /// non-solid or malformed elements, or when a node index is out of range.
    pub fn gather<M>(
        mesh: &M,
        index: usize,
        element: &Element,
        values: &[f32],
        gradients: Option<&[Vector3f]>,
    ) -> Option<Self>
    where
        M: MeshProvider + ?Sized,
    {
        let map = canonical_map(element.element_type)?;
        if !element.is_well_formed() {
            return None;
        }

        let node_count = mesh.node_count();
        let mut nodes = [0usize; 8];
        for (slot, &corner) in map.iter().enumerate() {
            let node = element.nodes[corner];
            if node >= node_count || node >= values.len() {
                return None;
            }
            nodes[slot] = node;
        }

        let positions = nodes.map(|n| mesh.node_position(n));
        let cell_values = nodes.map(|n| values[n]);
        let gradients = match gradients {
            Some(g) if nodes.iter().all(|&n| n < g.len()) => Some(nodes.map(|n| g[n])),
            _ => None,
        };

        Some(Self {
            element: index,
            nodes,
            positions,
            levels: cell_values,
            values: cell_values,
            gradients,
        })
    }

    /// Classify against a plane: levels become `n·p` of each corner
    pub fn with_plane_levels(mut self, plane: &Plane) -> Self {
        self.levels = self.positions.map(|p| plane.level(&p));
        self
    }

    /// Carry the same value on every corner (element-attached fields)
    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.values = [value; 8];
        self
    }

    /// Minimum and maximum of the classified levels
    pub fn level_range(&self) -> (f32, f32) {
        self.levels
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Whether both ends of a canonical edge are the same corner
    pub fn is_collapsed_edge(&self, [a, b]: [usize; 2]) -> bool {
        self.nodes[a] == self.nodes[b]
    }
}
