//! Finite element types and connectivity

use serde::{Deserialize, Serialize};

/// Element types known to the mesh layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Hex8,
    Hex20,
    Hex27,
    Penta6,
    Penta15,
    Tet4,
    Tet5,
    Tet10,
    Tet15,
    Tet20,
    Pyra5,
    Pyra13,
    Quad4,
    Quad8,
    Quad9,
    Tri3,
    Tri6,
    Beam2,
    Beam3,
}

/// Geometric family of an element, independent of its interpolation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementShape {
    Hexahedron,
    Wedge,
    Tetrahedron,
    Pyramid,
    Quadrilateral,
    Triangle,
    Line,
}

impl ElementType {
    /// Number of nodes in the connectivity list
    pub fn node_count(self) -> usize {
        match self {
            ElementType::Hex8 => 8,
            ElementType::Hex20 => 20,
            ElementType::Hex27 => 27,
            ElementType::Penta6 => 6,
            ElementType::Penta15 => 15,
            ElementType::Tet4 => 4,
            ElementType::Tet5 => 5,
            ElementType::Tet10 => 10,
            ElementType::Tet15 => 15,
            ElementType::Tet20 => 20,
            ElementType::Pyra5 => 5,
            ElementType::Pyra13 => 13,
            ElementType::Quad4 => 4,
            ElementType::Quad8 => 8,
            ElementType::Quad9 => 9,
            ElementType::Tri3 => 3,
            ElementType::Tri6 => 6,
            ElementType::Beam2 => 2,
            ElementType::Beam3 => 3,
        }
    }

    pub fn shape(self) -> ElementShape {
        match self {
            ElementType::Hex8 | ElementType::Hex20 | ElementType::Hex27 => ElementShape::Hexahedron,
            ElementType::Penta6 | ElementType::Penta15 => ElementShape::Wedge,
            ElementType::Tet4
            | ElementType::Tet5
            | ElementType::Tet10
            | ElementType::Tet15
            | ElementType::Tet20 => ElementShape::Tetrahedron,
            ElementType::Pyra5 | ElementType::Pyra13 => ElementShape::Pyramid,
            ElementType::Quad4 | ElementType::Quad8 | ElementType::Quad9 => {
                ElementShape::Quadrilateral
            }
            ElementType::Tri3 | ElementType::Tri6 => ElementShape::Triangle,
            ElementType::Beam2 | ElementType::Beam3 => ElementShape::Line,
        }
    }

    /// Volumetric elements; shells and beams are not
    pub fn is_solid(self) -> bool {
        matches!(
            self.shape(),
            ElementShape::Hexahedron
                | ElementShape::Wedge
                | ElementShape::Tetrahedron
                | ElementShape::Pyramid
        )
    }
}

impl ElementShape {
    /// Number of corner (vertex) nodes; these always come first in the connectivity
    pub fn corner_count(self) -> usize {
        match self {
            ElementShape::Hexahedron => 8,
            ElementShape::Wedge => 6,
            ElementShape::Tetrahedron => 4,
            ElementShape::Pyramid => 5,
            ElementShape::Quadrilateral => 4,
            ElementShape::Triangle => 3,
            ElementShape::Line => 2,
        }
    }

    /// Outward-oriented boundary facets as corner-node positions in the element
    pub fn facets(self) -> &'static [&'static [usize]] {
        const HEX: &[&[usize]] = &[
            &[0, 1, 5, 4],
            &[1, 2, 6, 5],
            &[2, 3, 7, 6],
            &[3, 0, 4, 7],
            &[3, 2, 1, 0],
            &[4, 5, 6, 7],
        ];
        const WEDGE: &[&[usize]] = &[
            &[0, 1, 4, 3],
            &[1, 2, 5, 4],
            &[2, 0, 3, 5],
            &[2, 1, 0],
            &[3, 4, 5],
        ];
        const TET: &[&[usize]] = &[&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[2, 1, 0]];
        const PYRAMID: &[&[usize]] = &[
            &[0, 1, 4],
            &[1, 2, 4],
            &[2, 3, 4],
            &[3, 0, 4],
            &[3, 2, 1, 0],
        ];
        match self {
            ElementShape::Hexahedron => HEX,
            ElementShape::Wedge => WEDGE,
            ElementShape::Tetrahedron => TET,
            ElementShape::Pyramid => PYRAMID,
            _ => &[],
        }
    }
}

/// A single mesh element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub element_type: ElementType,
    /// Node indices, corner nodes first
    pub nodes: Vec<usize>,
    /// Material id, resolved through a `VisibilityOracle`
    pub material: usize,
    pub visible: bool,
    pub active: bool,
}

impl Element {
    /// Create a visible, active element
    pub fn new(element_type: ElementType, nodes: Vec<usize>, material: usize) -> Self {
        Self {
            element_type,
            nodes,
            material,
            visible: true,
            active: true,
        }
    }

    pub fn is_solid(&self) -> bool {
        self.element_type.is_solid()
    }

    /// Whether the connectivity list is long enough for the element type
    pub fn is_well_formed(&self) -> bool {
        self.nodes.len() >= self.element_type.node_count()
    }

    /// Corner node indices (the first `corner_count` nodes)
    pub fn corners(&self) -> &[usize] {
        let n = self.element_type.shape().corner_count().min(self.nodes.len());
        &self.nodes[..n]
    }

    /// Set element visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the active flag carried onto output triangles
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
