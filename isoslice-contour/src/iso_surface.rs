//! Iso-surface extraction over mixed-element meshes

use crate::{
    canonical::Cell,
    engine::SweepToken,
    interpolate::flat_normal,
    levels::LevelSpacing,
    marching::{
        effective_subdivisions, iso_eligible, march_cell, solid_count, straddles, CellTriangle,
    },
    nodal::{average_to_nodes, nodal_gradient},
    parallel,
    range::scan_range,
    subdivide::subdivide,
};
use isoslice_core::{
    ColorMap, Element, Error, FieldLocation, FieldSelector, MeshProvider, Result, SliceTriangle,
    TriangleBuffer, ValueRange, Vector3f, VisibilityOracle,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info_span, trace, warn};

/// How vertex normals are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalMode {
    /// Interpolated field gradient
    #[default]
    Smooth,
    /// Face normal of each triangle
    Flat,
}

/// Configuration for iso-surface extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoSurfaceConfig {
    pub normal_mode: NormalMode,
    /// Include hidden elements of enabled materials
    pub cut_hidden: bool,
    /// Cells are split into `subdivisions³` children before classification
    pub subdivisions: usize,
    /// Texture coordinates relative to the range instead of raw values
    pub normalize_texcoords: bool,
    /// Colors of the levels when several are extracted at once
    pub color_map: ColorMap,
}

impl Default for IsoSurfaceConfig {
    fn default() -> Self {
        Self {
            normal_mode: NormalMode::Smooth,
            cut_hidden: false,
            subdivisions: 1,
            normalize_texcoords: true,
            color_map: ColorMap::default(),
        }
    }
}

impl IsoSurfaceConfig {
    /// Set how vertex normals are generated
    pub fn with_normal_mode(mut self, normal_mode: NormalMode) -> Self {
        self.normal_mode = normal_mode;
        self
    }

    /// Include hidden elements
    pub fn with_cut_hidden(mut self, cut_hidden: bool) -> Self {
        self.cut_hidden = cut_hidden;
        self
    }

    /// Set the subdivision factor
    pub fn with_subdivisions(mut self, subdivisions: usize) -> Self {
        self.subdivisions = subdivisions;
        self
    }

    /// Normalize texture coordinates against the range
    pub fn with_normalized_texcoords(mut self, normalize: bool) -> Self {
        self.normalize_texcoords = normalize;
        self
    }

    /// Set the color map of multi-level surfaces
    pub fn with_color_map(mut self, color_map: ColorMap) -> Self {
        self.color_map = color_map;
        self
    }

    /// Reject a zero subdivision factor
    pub fn validate(&self) -> Result<()> {
        if self.subdivisions == 0 {
            return Err(Error::InvalidConfig(
                "Subdivision factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Nodal values of a field; element fields are averaged onto the nodes
pub fn nodal_values<'a, M>(mesh: &'a M, field: &FieldSelector) -> Result<Cow<'a, [f32]>>
where
    M: MeshProvider + ?Sized,
{
    let values = mesh.field(field)?;
    Ok(match field.location {
        FieldLocation::Node => Cow::Borrowed(values),
        FieldLocation::Element => Cow::Owned(average_to_nodes(mesh, values)),
    })
}

/// Extract the iso-surfaces of a field at the given reference values
///
/// Texture coordinates are normalized against the range of the current
/// values. With more than one reference value every level gets a flat color
/// sampled from the color map at the level's normalized position.
pub fn extract_iso_surface<M>(
    mesh: &M,
    field: &FieldSelector,
    reference_values: &[f32],
    config: &IsoSurfaceConfig,
) -> Result<TriangleBuffer>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    let values = nodal_values(mesh, field)?;
    let range = scan_range(&values).unwrap_or_default().resolved();
    let buffer = sweep_iso_surface(mesh, &values, reference_values, range, config, None)?;
    Ok(buffer.unwrap_or_default())
}

/// Extract evenly spaced iso-surfaces across the current range of a field
pub fn extract_iso_levels<M>(
    mesh: &M,
    field: &FieldSelector,
    spacing: &LevelSpacing,
    config: &IsoSurfaceConfig,
) -> Result<TriangleBuffer>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    spacing.validate()?;
    let values = nodal_values(mesh, field)?;
    let range = scan_range(&values).unwrap_or_default().resolved();
    let levels = spacing.levels(range);
    let buffer = sweep_iso_surface(mesh, &values, &levels, range, config, None)?;
    Ok(buffer.unwrap_or_default())
}

/// One full sweep per reference value; `None` when the token went stale
pub(crate) fn sweep_iso_surface<M>(
    mesh: &M,
    values: &[f32],
    reference_values: &[f32],
    range: ValueRange,
    config: &IsoSurfaceConfig,
    token: Option<&SweepToken<'_>>,
) -> Result<Option<TriangleBuffer>>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    let _span = info_span!(
        "iso_surface",
        levels = reference_values.len(),
        elements = mesh.element_count()
    )
    .entered();

    let subdivisions = effective_subdivisions(config.subdivisions);
    let gradients = match config.normal_mode {
        NormalMode::Smooth => Some(nodal_gradient(mesh, values)),
        NormalMode::Flat => None,
    };
    let colored = reference_values.len() > 1;
    debug!(
        solids = solid_count(mesh),
        subdivisions,
        min = range.min,
        max = range.max,
        "starting iso-surface sweep"
    );

    let mut buffer = TriangleBuffer::with_generation(token.map_or(0, |t| t.generation()));
    for &reference in reference_values {
        let color = colored.then(|| config.color_map.map(range.normalize(reference)));

        let triangles = parallel::parallel_chunks(mesh.element_count(), |chunk| {
            if token.is_some_and(|t| !t.is_current()) {
                return None;
            }
            let mut local = Vec::new();
            let mut scratch = Vec::new();
            for index in chunk {
                let element = mesh.element(index);
                if !iso_eligible(mesh, element, config.cut_hidden) {
                    continue;
                }
                let Some(cell) = Cell::gather(mesh, index, element, values, gradients.as_deref())
                else {
                    trace!(element = index, "skipping malformed element");
                    continue;
                };
                if !straddles(&cell, reference) {
                    continue;
                }
                for child in subdivide(&cell, subdivisions) {
                    scratch.clear();
                    march_cell(&child, reference, &mut scratch);
                    local.extend(scratch.iter().filter_map(|t| {
                        surface_triangle(t, element, index, range, color, config)
                    }));
                }
            }
            Some(local)
        });

        match triangles {
            Some(triangles) => {
                trace!(reference, triangles = triangles.len(), "level extracted");
                buffer.extend(triangles);
            }
            None => {
                warn!(reference, "discarding stale iso-surface sweep");
                return Ok(None);
            }
        }
    }

    debug!(triangles = buffer.len(), "iso-surface sweep complete");
    Ok(Some(buffer))
}

/// Output triangle for a kernel triangle; `None` when it has no area
///
/// Collapsed corners of wedges, pyramids and tetrahedra yield zero-area
/// triangles, which would carry a zero normal.
fn surface_triangle(
    t: &CellTriangle,
    element: &Element,
    index: usize,
    range: ValueRange,
    color: Option<[u8; 3]>,
    config: &IsoSurfaceConfig,
) -> Option<SliceTriangle> {
    let face = flat_normal(&t.positions);
    if face == Vector3f::zeros() {
        return None;
    }
    let normals = match (config.normal_mode, t.gradients) {
        (NormalMode::Smooth, Some(g)) => g.map(|n| if n == Vector3f::zeros() { face } else { n }),
        _ => [face; 3],
    };
    let tex = if config.normalize_texcoords {
        t.values.map(|v| range.normalize(v))
    } else {
        t.values
    };

    Some(SliceTriangle {
        positions: t.positions,
        normals,
        values: t.values,
        tex,
        element: index,
        material: element.material,
        active: element.active,
        color,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use isoslice_core::{ElementType, FeMesh, Material, Point3f};

    fn layered_cube() -> FeMesh {
        let mut mesh = FeMesh::hex_grid([1, 1, 1], [1.0; 3], Point3f::origin());
        mesh.set_node_field_with("z", |p| p.z);
        mesh
    }

    #[test]
    fn test_single_level_without_color() {
        let mesh = layered_cube();
        let buffer = extract_iso_surface(
            &mesh,
            &FieldSelector::node("z"),
            &[0.25],
            &IsoSurfaceConfig::default(),
        )
        .unwrap();
        assert_eq!(buffer.len(), 2);
        for t in &buffer {
            assert!(t.color.is_none());
            for k in 0..3 {
                assert_relative_eq!(t.positions[k].z, 0.25, epsilon = 1e-6);
                assert_relative_eq!(t.normals[k], Vector3f::z(), epsilon = 1e-5);
                assert_relative_eq!(t.tex[k], 0.25, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_level_colors_follow_level_position() {
        let mut mesh = FeMesh::hex_grid([1, 1, 10], [1.0, 1.0, 0.1], Point3f::origin());
        mesh.set_node_field_with("z", |p| p.z);
        let config = IsoSurfaceConfig::default().with_normal_mode(NormalMode::Flat);
        let references = [0.15, 0.25, 0.85];
        let buffer =
            extract_iso_surface(&mesh, &FieldSelector::node("z"), &references, &config).unwrap();
        assert_eq!(buffer.len(), 6);

        // uneven levels keep their own colors instead of snapping to bands
        for (level, pair) in references.iter().zip(buffer.triangles.chunks(2)) {
            for t in pair {
                assert_relative_eq!(t.values[0], *level, epsilon = 1e-5);
                assert_eq!(t.color, Some(config.color_map.map(*level)));
            }
        }
        assert_ne!(buffer.triangles[0].color, buffer.triangles[2].color);
        assert_ne!(buffer.triangles[2].color, Some(config.color_map.map(0.5)));
    }

    #[test]
    fn test_collapsed_corners_emit_no_flat_triangles() {
        let mut mesh = FeMesh::from_parts(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
                Point3f::new(1.0, 0.0, 1.0),
                Point3f::new(0.0, 1.0, 1.0),
            ],
            vec![Element::new(ElementType::Penta6, (0..6).collect(), 0)],
        );
        mesh.set_node_field_with("z", |p| p.z);
        let config = IsoSurfaceConfig::default().with_normal_mode(NormalMode::Flat);
        let buffer =
            extract_iso_surface(&mesh, &FieldSelector::node("z"), &[0.5], &config).unwrap();
        assert!(!buffer.is_empty());
        assert_relative_eq!(buffer.area(), 0.5, epsilon = 1e-5);
        for t in &buffer {
            assert!(t.area() > 0.0);
            assert_eq!(t.normals, [Vector3f::z(); 3]);
        }
    }

    #[test]
    fn test_disabled_material_is_skipped() {
        let mut mesh = layered_cube();
        mesh.materials[0] = Material::new("off").with_enabled(false);
        let buffer = extract_iso_surface(
            &mesh,
            &FieldSelector::node("z"),
            &[0.5],
            &IsoSurfaceConfig::default(),
        )
        .unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_hidden_elements_need_cut_hidden() {
        let mut mesh = layered_cube();
        mesh.elements[0].visible = false;
        let field = FieldSelector::node("z");
        let hidden = extract_iso_surface(&mesh, &field, &[0.5], &IsoSurfaceConfig::default());
        assert!(hidden.unwrap().is_empty());
        let config = IsoSurfaceConfig::default().with_cut_hidden(true);
        assert_eq!(extract_iso_surface(&mesh, &field, &[0.5], &config).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_requests() {
        let mesh = layered_cube();
        let missing = extract_iso_surface(
            &mesh,
            &FieldSelector::node("missing"),
            &[0.5],
            &IsoSurfaceConfig::default(),
        );
        assert!(matches!(missing, Err(Error::FieldNotFound { .. })));

        let config = IsoSurfaceConfig::default().with_subdivisions(0);
        assert!(matches!(
            extract_iso_surface(&mesh, &FieldSelector::node("z"), &[0.5], &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_iso_levels_span_range() {
        let mut mesh = FeMesh::hex_grid([1, 1, 4], [1.0; 3], Point3f::origin());
        mesh.set_node_field_with("z", |p| p.z);
        let buffer = extract_iso_levels(
            &mesh,
            &FieldSelector::node("z"),
            &LevelSpacing::new(3),
            &IsoSurfaceConfig::default(),
        )
        .unwrap();
        // levels at 0.04, 2.0 and 3.96, one square each
        assert_eq!(buffer.len(), 6);
        assert_relative_eq!(buffer.area(), 3.0, epsilon = 1e-5);
    }
}
