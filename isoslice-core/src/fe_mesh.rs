//! In-memory finite element mesh with named scalar fields

use crate::{
    element::{Element, ElementType},
    field::{FieldLocation, FieldSelector},
    material::{Material, MaterialFlags},
    point::*,
    traits::{Face, MeshProvider, VisibilityOracle},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A mixed-element mesh holding one state (positions and field values)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeMesh {
    pub nodes: Vec<Point3f>,
    pub elements: Vec<Element>,
    pub materials: Vec<Material>,
    /// Boundary facets, filled by [`FeMesh::build_surface`] or by the caller
    pub faces: Vec<Face>,
    exterior: Vec<bool>,
    node_fields: HashMap<String, Vec<f32>>,
    element_fields: HashMap<String, Vec<f32>>,
}

impl FeMesh {
    /// Empty mesh with no nodes, elements or materials
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from nodes and elements with a single default material
    pub fn from_parts(nodes: Vec<Point3f>, elements: Vec<Element>) -> Self {
        let material_count = elements.iter().map(|e| e.material + 1).max().unwrap_or(1);
        Self {
            nodes,
            elements,
            materials: (0..material_count)
                .map(|i| Material::new(format!("material {}", i + 1)))
                .collect(),
            ..Self::default()
        }
    }

    /// Structured grid of `cells[0] x cells[1] x cells[2]` hex8 elements
    pub fn hex_grid(cells: [usize; 3], spacing: [f32; 3], origin: Point3f) -> Self {
        let [nx, ny, nz] = cells.map(|c| c + 1);
        let mut nodes = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    nodes.push(Point3f::new(
                        origin.x + i as f32 * spacing[0],
                        origin.y + j as f32 * spacing[1],
                        origin.z + k as f32 * spacing[2],
                    ));
                }
            }
        }

        let id = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let mut elements = Vec::with_capacity(cells[0] * cells[1] * cells[2]);
        for k in 0..cells[2] {
            for j in 0..cells[1] {
                for i in 0..cells[0] {
                    elements.push(Element::new(
                        ElementType::Hex8,
                        vec![
                            id(i, j, k),
                            id(i + 1, j, k),
                            id(i + 1, j + 1, k),
                            id(i, j + 1, k),
                            id(i, j, k + 1),
                            id(i + 1, j, k + 1),
                            id(i + 1, j + 1, k + 1),
                            id(i, j + 1, k + 1),
                        ],
                        0,
                    ));
                }
            }
        }

        Self::from_parts(nodes, elements)
    }

    /// Append a node and return its index
    pub fn add_node(&mut self, position: Point3f) -> usize {
        self.nodes.push(position);
        self.nodes.len() - 1
    }

    /// Append an element and return its index
    pub fn add_element(&mut self, element: Element) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Replace node positions with those of another state
    pub fn set_node_positions(&mut self, positions: Vec<Point3f>) -> Result<()> {
        if positions.len() != self.nodes.len() {
            return Err(Error::InvalidData(format!(
                "Expected {} node positions, got {}",
                self.nodes.len(),
                positions.len()
            )));
        }
        self.nodes = positions;
        Ok(())
    }

    /// Attach or replace a node field
    pub fn set_node_field(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let name = name.into();
        check_len(&name, self.nodes.len(), values.len())?;
        self.node_fields.insert(name, values);
        Ok(())
    }

    /// Attach or replace an element field
    pub fn set_element_field(&mut self, name: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let name = name.into();
        check_len(&name, self.elements.len(), values.len())?;
        self.element_fields.insert(name, values);
        Ok(())
    }

    /// Node field computed from positions
    pub fn set_node_field_with<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Point3f) -> f32,
    {
        let values = self.nodes.iter().map(f).collect();
        self.node_fields.insert(name.into(), values);
    }

    /// Compute the boundary facets of all solid elements
    ///
    /// A facet is on the boundary when no other solid element shares its
    /// corner nodes. Also refreshes the per-node exterior flags.
    pub fn build_surface(&mut self) {
        let mut order: Vec<Vec<usize>> = Vec::new();
        let mut seen: HashMap<Vec<usize>, (usize, Face)> = HashMap::new();

        for (index, element) in self.elements.iter().enumerate() {
            if !element.is_solid() || !element.is_well_formed() {
                continue;
            }
            for facet in element.element_type.shape().facets() {
                let nodes: Vec<usize> = facet.iter().map(|&k| element.nodes[k]).collect();
                let mut key = nodes.clone();
                key.sort_unstable();
                seen.entry(key.clone())
                    .and_modify(|(count, _)| *count += 1)
                    .or_insert_with(|| {
                        order.push(key);
                        (1, Face { nodes, element: index })
                    });
            }
        }

        self.faces = order
            .into_iter()
            .filter_map(|key| match seen.remove(&key) {
                Some((1, face)) => Some(face),
                _ => None,
            })
            .collect();

        self.exterior = vec![false; self.nodes.len()];
        for face in &self.faces {
            for &n in &face.nodes {
                if let Some(flag) = self.exterior.get_mut(n) {
                    *flag = true;
                }
            }
        }
    }

    /// Whether a node lies on a boundary facet (after `build_surface`)
    pub fn is_exterior_node(&self, node: usize) -> bool {
        self.exterior.get(node).copied().unwrap_or(false)
    }
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::FieldSize {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

impl MeshProvider for FeMesh {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_position(&self, node: usize) -> Point3f {
        self.nodes[node]
    }

    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, index: usize) -> &Element {
        &self.elements[index]
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face(&self, index: usize) -> Option<&Face> {
        self.faces.get(index)
    }

    fn field(&self, selector: &FieldSelector) -> Result<&[f32]> {
        let (fields, expected) = match selector.location {
            FieldLocation::Node => (&self.node_fields, self.nodes.len()),
            FieldLocation::Element => (&self.element_fields, self.elements.len()),
        };
        let values = fields
            .get(&selector.name)
            .ok_or_else(|| Error::FieldNotFound {
                name: selector.name.clone(),
                location: selector.location,
            })?;
        check_len(&selector.name, expected, values.len())?;
        Ok(values)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.nodes)
    }
}

impl VisibilityOracle for FeMesh {
    fn material(&self, id: usize) -> Option<MaterialFlags> {
        self.materials.get(id).map(|m| m.flags)
    }
}
