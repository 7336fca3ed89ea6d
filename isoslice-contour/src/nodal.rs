//! Derived nodal quantities: element-to-node projection and field gradients

use crate::{canonical::Cell, parallel, subdivide::hex_shape_derivatives};
use isoslice_core::{Matrix3, MeshProvider, Vector3f};

/// Distinct node indices of a cell, in slot order
fn distinct_nodes(cell: &Cell) -> impl Iterator<Item = usize> + '_ {
    cell.nodes
        .iter()
        .enumerate()
        .filter(move |&(slot, node)| !cell.nodes[..slot].contains(node))
        .map(|(_, &node)| node)
}

/// Project an element field onto the nodes by averaging over adjacent solid elements
///
/// Nodes that touch no solid element get `0.0`.
pub fn average_to_nodes<M>(mesh: &M, element_values: &[f32]) -> Vec<f32>
where
    M: MeshProvider + ?Sized,
{
    let mut sum = vec![0.0f32; mesh.node_count()];
    let mut count = vec![0u32; mesh.node_count()];
    // Only the node indices are needed, so gather against a dummy value per node
    let zeros = vec![0.0f32; mesh.node_count()];

    for (index, &value) in element_values.iter().enumerate().take(mesh.element_count()) {
        let element = mesh.element(index);
        let Some(cell) = Cell::gather(mesh, index, element, &zeros, None) else {
            continue;
        };
        for node in distinct_nodes(&cell) {
            sum[node] += value;
            count[node] += 1;
        }
    }

    sum.iter()
        .zip(&count)
        .map(|(&s, &c)| if c > 0 { s / c as f32 } else { 0.0 })
        .collect()
}

/// Gradient of a nodal field inside one cell, evaluated at the cell centre
///
/// `None` when the isoparametric map is singular there.
pub fn cell_gradient(cell: &Cell) -> Option<Vector3f> {
    let dh = hex_shape_derivatives(0.0, 0.0, 0.0);

    // jacobian[(i, j)] = d x_i / d xi_j
    let mut jacobian = Matrix3::<f32>::zeros();
    let mut local = Vector3f::zeros();
    for (k, d) in dh.iter().enumerate() {
        let d = Vector3f::new(d[0], d[1], d[2]);
        jacobian += cell.positions[k].coords * d.transpose();
        local += d * cell.values[k];
    }

    let inverse = jacobian.try_inverse()?;
    let gradient = inverse.transpose() * local;
    gradient.iter().all(|c| c.is_finite()).then_some(gradient)
}

/// Nodal gradient of a nodal field, averaged over the adjacent solid elements
///
/// Elements with a singular mapping are left out of the average.
pub fn nodal_gradient<M>(mesh: &M, values: &[f32]) -> Vec<Vector3f>
where
    M: MeshProvider + ?Sized,
{
    let indices: Vec<usize> = (0..mesh.element_count()).collect();
    let per_element = parallel::parallel_map(&indices, |&index| {
        let cell = Cell::gather(mesh, index, mesh.element(index), values, None)?;
        cell_gradient(&cell).map(|g| (cell, g))
    });

    let mut sum = vec![Vector3f::zeros(); mesh.node_count()];
    let mut count = vec![0u32; mesh.node_count()];
    for (cell, gradient) in per_element.iter().flatten() {
        for node in distinct_nodes(cell) {
            sum[node] += gradient;
            count[node] += 1;
        }
    }

    sum.into_iter()
        .zip(count)
        .map(|(s, c)| if c > 0 { s / c as f32 } else { s })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use isoslice_core::{Element, ElementType, FeMesh, Point3f};

    #[test]
    fn test_linear_field_gradient_on_hex_grid() {
        let mesh = FeMesh::hex_grid([2, 2, 2], [0.5, 1.0, 2.0], Point3f::new(1.0, 0.0, 0.0));
        let values: Vec<f32> = mesh
            .nodes
            .iter()
            .map(|p| 2.0 * p.x - p.y + 0.5 * p.z)
            .collect();
        for g in nodal_gradient(&mesh, &values) {
            assert_relative_eq!(g, Vector3f::new(2.0, -1.0, 0.5), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_linear_field_gradient_on_tet() {
        let mesh = FeMesh::from_parts(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![Element::new(ElementType::Tet4, vec![0, 1, 2, 3], 0)],
        );
        let values: Vec<f32> = mesh.nodes.iter().map(|p| p.x + 2.0 * p.y + 3.0 * p.z).collect();
        let gradients = nodal_gradient(&mesh, &values);
        assert_relative_eq!(gradients[0], Vector3f::new(1.0, 2.0, 3.0), epsilon = 1e-4);
    }

    #[test]
    fn test_flat_element_is_skipped() {
        let mesh = FeMesh::from_parts(
            vec![Point3f::origin(); 4],
            vec![Element::new(ElementType::Tet4, vec![0, 1, 2, 3], 0)],
        );
        let gradients = nodal_gradient(&mesh, &[0.0, 1.0, 2.0, 3.0]);
        assert!(gradients.iter().all(|g| *g == Vector3f::zeros()));
    }

    #[test]
    fn test_average_to_nodes() {
        let mesh = FeMesh::hex_grid([2, 1, 1], [1.0; 3], Point3f::origin());
        let nodal = average_to_nodes(&mesh, &[1.0, 3.0]);
        // node 1 is shared by both hexes, node 0 only by the first
        assert_relative_eq!(nodal[0], 1.0);
        assert_relative_eq!(nodal[1], 2.0);
        assert_relative_eq!(nodal[2], 3.0);
    }
}
