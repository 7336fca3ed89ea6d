//! Integration tests for isoslice-contour
//!
//! These tests drive whole sweeps through the public entry points on small
//! meshes whose cuts can be computed by hand.

use anyhow::Result;
use approx::assert_relative_eq;
use isoslice_contour::canonical::Cell;
use isoslice_contour::marching::march_cell;
use isoslice_contour::tables::HEX_EDGES;
use isoslice_contour::*;
use isoslice_core::{
    BoundaryEdge, Element, ElementType, FeMesh, Face, FieldSelector, MaterialFlags, MeshProvider,
    Plane, Point3f, RangePolicy, TriangleBuffer, ValueRange, Vector3f, VisibilityOracle,
};

/// Unit cube split into `n³` hexahedra with the coordinate fields attached
fn unit_cube(n: usize) -> FeMesh {
    let h = 1.0 / n as f32;
    let mut mesh = FeMesh::hex_grid([n, n, n], [h; 3], Point3f::origin());
    mesh.set_node_field_with("x", |p| p.x);
    mesh.set_node_field_with("z", |p| p.z);
    mesh.build_surface();
    mesh
}

fn single_tet() -> FeMesh {
    FeMesh::from_parts(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ],
        vec![Element::new(ElementType::Tet4, vec![0, 1, 2, 3], 0)],
    )
}

fn all_vertices_at(buffer: &TriangleBuffer, f: impl Fn(&Point3f) -> f32, level: f32) {
    for t in buffer {
        for p in &t.positions {
            assert_relative_eq!(f(p), level, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_single_hex_mid_range() -> Result<()> {
    let mesh = unit_cube(1);
    let field = FieldSelector::node("z");

    let cell = Cell::gather(&mesh, 0, &mesh.elements[0], mesh.field(&field)?, None)
        .expect("hexahedron maps onto a cell");
    let mut triangles = Vec::new();
    assert_eq!(march_cell(&cell, 0.5, &mut triangles), 0b1111_0000);

    let buffer = extract_iso_surface(&mesh, &field, &[0.5], &IsoSurfaceConfig::default())?;
    assert_eq!(buffer.len(), 2);
    assert_relative_eq!(buffer.area(), 1.0, epsilon = 1e-6);
    all_vertices_at(&buffer, |p| p.z, 0.5);
    for t in &buffer {
        assert!(t.face_normal().z > 0.0);
        assert_eq!(t.element, 0);
        assert!(t.active);
    }
    Ok(())
}

#[test]
fn test_degenerate_tetrahedron() -> Result<()> {
    let mut mesh = single_tet();
    mesh.set_node_field("v", vec![0.0, 1.0, 2.0, 3.0])?;
    let field = FieldSelector::node("v");

    let cell = Cell::gather(&mesh, 0, &mesh.elements[0], mesh.field(&field)?, None)
        .expect("tetrahedron maps onto a cell");
    let mut triangles = Vec::new();
    march_cell(&cell, 1.5, &mut triangles);
    assert_eq!(triangles.len(), 2);
    for t in &triangles {
        for &e in &t.edges {
            assert!(!cell.is_collapsed_edge(HEX_EDGES[e]), "edge {} is collapsed", e);
        }
    }

    let buffer = extract_iso_surface(&mesh, &field, &[1.5], &IsoSurfaceConfig::default())?;
    assert_eq!(buffer.len(), 2);
    // every vertex lies on a segment between two distinct tetrahedron corners
    let crossings = [
        Point3f::new(0.0, 0.75, 0.0),
        Point3f::new(0.0, 0.0, 0.5),
        Point3f::new(0.5, 0.5, 0.0),
        Point3f::new(0.75, 0.0, 0.25),
    ];
    for t in &buffer {
        for (p, v) in t.positions.iter().zip(&t.values) {
            assert_relative_eq!(*v, 1.5, epsilon = 1e-6);
            assert!(crossings.iter().any(|c| (c - p).magnitude() < 1e-5));
        }
    }
    Ok(())
}

#[test]
fn test_empty_slice() -> Result<()> {
    let mut mesh = unit_cube(3);
    mesh.set_node_field_with("shifted", |p| p.z + 10.0);
    let buffer = extract_iso_surface(
        &mesh,
        &FieldSelector::node("shifted"),
        &[1.0],
        &IsoSurfaceConfig::default(),
    )?;
    assert!(buffer.is_empty());

    let outside = Plane::from_coefficients([0.0, 0.0, 1.0, 5.0])?;
    let section = extract_plane_section(
        &mesh,
        &FieldSelector::node("z"),
        &outside,
        &PlaneSectionConfig::default(),
    )?;
    assert!(section.triangles.is_empty());
    assert!(section.boundary_edges.is_empty());
    Ok(())
}

#[test]
fn test_subdivision_refinement() -> Result<()> {
    let mesh = unit_cube(1);
    let plane = Plane::from_coefficients([1.0, 0.0, 0.0, 0.5])?;
    let field = FieldSelector::node("z");

    let mut previous_error = f32::INFINITY;
    for (d, expected) in [(1, 2), (2, 8), (4, 32)] {
        let config = PlaneSectionConfig::default().with_subdivisions(d);
        let section = extract_plane_section(&mesh, &field, &plane, &config)?;
        assert_eq!(section.triangles.len(), expected);
        let error = (section.area() - 1.0).abs();
        assert!(error < 1e-5);
        assert!(error <= previous_error + 1e-6);
        previous_error = error;
        // z is linear, so its integral over the unit square is 0.5 at any refinement
        assert_relative_eq!(section.integrate(), 0.5, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_subdivided_iso_surface_of_curved_field() -> Result<()> {
    let mut mesh = unit_cube(1);
    mesh.set_node_field_with("r", |p| p.x * p.x + p.y * p.y + p.z * p.z);
    let field = FieldSelector::node("r");
    let coarse = extract_iso_surface(&mesh, &field, &[1.0], &IsoSurfaceConfig::default())?;
    let fine = extract_iso_surface(
        &mesh,
        &field,
        &[1.0],
        &IsoSurfaceConfig::default().with_subdivisions(4),
    )?;
    assert!(!coarse.is_empty());
    assert!(fine.len() > coarse.len());
    for t in &fine {
        for v in &t.values {
            assert_relative_eq!(*v, 1.0, epsilon = 1e-4);
        }
    }
    Ok(())
}

#[test]
fn test_static_range_never_narrows() {
    let mut tracker = RangeTracker::new(RangeConfig::default().with_policy(RangePolicy::Static));
    let mut union: Option<ValueRange> = None;
    for frame in 0..20 {
        let phase = frame as f32 * 0.7;
        let values: Vec<f32> = (0..16)
            .map(|i| (phase + i as f32).sin() * (1.0 + frame as f32 * 0.1))
            .collect();
        let dynamic = scan_range(&values).expect("finite values");
        union = Some(union.map_or(dynamic, |u| u.union(&dynamic)));
        let range = tracker.update(&values);
        assert!(range.contains(&union.unwrap()));
    }
}

/// Starts a new frame on the engine whenever a sweep asks for its field
struct FrameRacer<'a> {
    mesh: &'a FeMesh,
    engine: &'a ContourEngine,
}

impl MeshProvider for FrameRacer<'_> {
    fn node_count(&self) -> usize {
        self.mesh.node_count()
    }

    fn node_position(&self, node: usize) -> Point3f {
        self.mesh.node_position(node)
    }

    fn element_count(&self) -> usize {
        self.mesh.element_count()
    }

    fn element(&self, index: usize) -> &Element {
        self.mesh.element(index)
    }

    fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    fn face(&self, index: usize) -> Option<&Face> {
        self.mesh.face(index)
    }

    fn field(&self, selector: &FieldSelector) -> isoslice_core::Result<&[f32]> {
        self.engine.advance_frame();
        self.mesh.field(selector)
    }
}

impl VisibilityOracle for FrameRacer<'_> {
    fn material(&self, id: usize) -> Option<MaterialFlags> {
        self.mesh.material(id)
    }
}

#[test]
fn test_stale_sweeps_are_discarded() -> Result<()> {
    let mesh = unit_cube(2);
    let engine = ContourEngine::default();
    let racer = FrameRacer {
        mesh: &mesh,
        engine: &engine,
    };
    let field = FieldSelector::node("z");

    let sweep = engine.iso_surface(&racer, &field, &[0.3], &IsoSurfaceConfig::default())?;
    assert!(sweep.is_stale());
    assert_eq!(sweep.into_option(), None);

    let plane = Plane::from_coefficients([0.0, 0.0, 1.0, 0.3])?;
    let sweep = engine.plane_section(&racer, &field, &plane, &PlaneSectionConfig::default())?;
    assert!(sweep.is_stale());

    let sweep = engine.slice_stack(&racer, &field, &Vector3f::z(), &SliceStackConfig::default())?;
    assert!(sweep.is_stale());
    assert_eq!(engine.generation(), 3);

    // the same request against a quiet mesh completes and carries the generation
    let buffer = engine
        .iso_surface(&mesh, &field, &[0.3], &IsoSurfaceConfig::default())?
        .into_option()
        .expect("no frame change during the sweep");
    assert_eq!(buffer.generation, 3);
    assert_relative_eq!(buffer.area(), 1.0, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_slice_stack_through_engine() -> Result<()> {
    let mesh = unit_cube(4);
    let engine = ContourEngine::default();
    let config = SliceStackConfig::default().with_slices(4);
    let stack = engine
        .slice_stack(&mesh, &FieldSelector::node("x"), &Vector3f::x(), &config)?
        .into_option()
        .expect("no frame change during the sweep");
    assert_eq!(stack.len(), 4);

    let mut previous = f32::NEG_INFINITY;
    for section in &stack {
        assert_relative_eq!(section.area(), 1.0, epsilon = 1e-4);
        let x = section.triangles.triangles[0].positions[0].x;
        assert!(x > previous);
        previous = x;
        all_vertices_at(&section.triangles, |p| p.x, x);
        // texture coordinates of a coordinate field equal the coordinate
        assert_relative_eq!(section.triangles.triangles[0].tex[0], x, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_tilted_boundary_edges() -> Result<()> {
    let mesh = unit_cube(3);
    let plane = Plane::from_coefficients([1.0, 1.0, 0.0, 1.0])?;
    let section = extract_plane_section(
        &mesh,
        &FieldSelector::node("z"),
        &plane,
        &PlaneSectionConfig::default().with_cell_outlines(true),
    )?;

    // the cut is a sqrt(2) x 1 rectangle through opposite cube edges
    assert_relative_eq!(section.area(), 2f32.sqrt(), epsilon = 1e-4);
    for edge in section.boundary_edges.iter().chain(&section.cell_outlines) {
        for p in &edge.points {
            assert_relative_eq!(plane.signed_distance(p), 0.0, epsilon = 1e-5);
        }
    }
    // the boundary outline is the rectangle's perimeter
    let perimeter: f32 = section.boundary_edges.iter().map(BoundaryEdge::length).sum();
    assert_relative_eq!(perimeter, 2.0 * 2f32.sqrt() + 2.0, epsilon = 1e-4);
    let outlines: f32 = section.cell_outlines.iter().map(BoundaryEdge::length).sum();
    assert!(outlines > perimeter);
    Ok(())
}

#[test]
fn test_element_fields() -> Result<()> {
    let mut mesh = FeMesh::hex_grid([2, 1, 1], [1.0; 3], Point3f::origin());
    mesh.set_element_field("stress", vec![0.0, 2.0])?;
    let field = FieldSelector::element("stress");

    // iso-surfaces see the element values averaged onto the nodes
    let buffer = extract_iso_surface(&mesh, &field, &[1.0], &IsoSurfaceConfig::default())?;
    assert_eq!(buffer.len(), 2);
    all_vertices_at(&buffer, |p| p.x, 1.0);

    // plane sections carry each element's value unchanged
    let plane = Plane::from_coefficients([0.0, 0.0, 1.0, 0.5])?;
    let config = PlaneSectionConfig::default().with_normalized_texcoords(false);
    let section = extract_plane_section(&mesh, &field, &plane, &config)?;
    assert_eq!(section.triangles.len(), 4);
    for t in &section.triangles {
        let expected = if t.element == 0 { 0.0 } else { 2.0 };
        assert_eq!(t.tex, [expected; 3]);
    }
    assert_relative_eq!(section.integrate(), 2.0, epsilon = 1e-5);

    let short = FeMesh::hex_grid([2, 1, 1], [1.0; 3], Point3f::origin())
        .set_element_field("stress", vec![1.0]);
    assert!(short.is_err());
    Ok(())
}

#[test]
fn test_mixed_element_mesh() -> Result<()> {
    // a hexahedron with a wedge and a pyramid stacked on top
    let nodes = vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(1.0, 0.0, 0.0),
        Point3f::new(1.0, 1.0, 0.0),
        Point3f::new(0.0, 1.0, 0.0),
        Point3f::new(0.0, 0.0, 1.0),
        Point3f::new(1.0, 0.0, 1.0),
        Point3f::new(1.0, 1.0, 1.0),
        Point3f::new(0.0, 1.0, 1.0),
        Point3f::new(0.5, 0.5, 2.0),
        Point3f::new(2.0, 0.0, 0.0),
        Point3f::new(2.0, 0.0, 1.0),
    ];
    let elements = vec![
        Element::new(ElementType::Hex8, (0..8).collect(), 0),
        Element::new(ElementType::Pyra5, vec![4, 5, 6, 7, 8], 0),
        Element::new(ElementType::Penta6, vec![1, 9, 2, 5, 10, 6], 0),
        Element::new(ElementType::Quad4, vec![0, 1, 2, 3], 0),
    ];
    let mut mesh = FeMesh::from_parts(nodes, elements);
    mesh.set_node_field_with("z", |p| p.z);
    let field = FieldSelector::node("z");

    let low = extract_iso_surface(&mesh, &field, &[0.5], &IsoSurfaceConfig::default())?;
    // hexahedron square plus the triangular wedge cut; the shell is skipped
    assert_relative_eq!(low.area(), 1.5, epsilon = 1e-5);
    assert!(low.iter().all(|t| t.element != 3));
    all_vertices_at(&low, |p| p.z, 0.5);

    let high = extract_iso_surface(&mesh, &field, &[1.5], &IsoSurfaceConfig::default())?;
    // the pyramid cut halfway up is a square of side 0.5
    assert_relative_eq!(high.area(), 0.25, epsilon = 1e-5);
    assert!(high.iter().all(|t| t.element == 1));
    Ok(())
}
