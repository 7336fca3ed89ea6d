//! Plane sections: cutting the mesh with a plane and with stacks of planes

use crate::{
    canonical::Cell,
    classify::{square_case_index, square_segments},
    engine::SweepToken,
    interpolate::crossing_fraction,
    levels::stack_offsets,
    marching::{cell_outline, effective_subdivisions, march_cell, section_eligible, straddles},
    parallel,
    range::scan_range,
    subdivide::subdivide,
    tables::SQUARE_EDGES,
};
use isoslice_core::{
    BoundaryEdge, Error, FieldLocation, FieldSelector, MeshProvider, Plane, Point3f, Result,
    SliceTriangle, TriangleBuffer, ValueRange, Vector3f, VisibilityOracle,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, trace, warn};

/// Configuration for plane sections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneSectionConfig {
    /// Also cut hidden elements and hidden materials
    pub cut_hidden: bool,
    /// Cells are split into `subdivisions³` children before classification
    pub subdivisions: usize,
    /// Texture coordinates relative to the range instead of raw values
    pub normalize_texcoords: bool,
    /// Collect the outline of the cut polygon of every cell
    pub collect_cell_outlines: bool,
    /// Collect the intersection of the plane with the boundary faces
    pub collect_boundary_edges: bool,
}

impl Default for PlaneSectionConfig {
    fn default() -> Self {
        Self {
            cut_hidden: false,
            subdivisions: 1,
            normalize_texcoords: true,
            collect_cell_outlines: false,
            collect_boundary_edges: true,
        }
    }
}

impl PlaneSectionConfig {
    /// Also cut hidden elements and materials
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

    /// Collect the outline of every cut cell
    pub fn with_cell_outlines(mut self, collect: bool) -> Self {
        self.collect_cell_outlines = collect;
        self
    }

    /// Collect where the plane meets the mesh surface
    pub fn with_boundary_edges(mut self, collect: bool) -> Self {
        self.collect_boundary_edges = collect;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.subdivisions == 0 {
            return Err(Error::InvalidConfig(
                "Subdivision factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of cutting the mesh with one plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaneSection {
    pub triangles: TriangleBuffer,
    /// Intersection of the plane with the mesh boundary faces
    pub boundary_edges: Vec<BoundaryEdge>,
    /// Outline of the cut polygon of each cell, when requested
    pub cell_outlines: Vec<BoundaryEdge>,
}

impl PlaneSection {
    /// Area of the cut
    pub fn area(&self) -> f32 {
        self.triangles.area()
    }

    /// Integral of the raw field over the cut
    pub fn integrate(&self) -> f32 {
        self.triangles.integrate()
    }

    /// Generation of the sweep that produced the section
    pub fn generation(&self) -> u64 {
        self.triangles.generation
    }
}

/// Configuration for a stack of parallel plane sections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceStackConfig {
    /// Number of planes
    pub slices: usize,
    /// Position of a single slice across the mesh, or the inset of the
    /// outer slices of a stack, in `[0, 1]`
    pub offset: f32,
    pub section: PlaneSectionConfig,
}

impl Default for SliceStackConfig {
    fn default() -> Self {
        Self {
            slices: 10,
            offset: 0.5,
            section: PlaneSectionConfig::default().with_boundary_edges(false),
        }
    }
}

impl SliceStackConfig {
    /// Set number of slices
    pub fn with_slices(mut self, slices: usize) -> Self {
        self.slices = slices;
        self
    }

    /// Set the relative offset of the stack
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Set the configuration of every slice
    pub fn with_section(mut self, section: PlaneSectionConfig) -> Self {
        self.section = section;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.slices == 0 {
            return Err(Error::InvalidConfig(
                "A slice stack needs at least one slice".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.offset) {
            return Err(Error::InvalidConfig(format!(
                "Slice offset must be in [0, 1], got {}",
                self.offset
            )));
        }
        self.section.validate()
    }
}

/// Cut the mesh with a plane
///
/// Triangles carry the plane normal and the field as texture coordinate,
/// interpolated for node fields and constant per cell for element fields.
pub fn extract_plane_section<M>(
    mesh: &M,
    field: &FieldSelector,
    plane: &Plane,
    config: &PlaneSectionConfig,
) -> Result<PlaneSection>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    let values = mesh.field(field)?;
    let range = scan_range(values).unwrap_or_default().resolved();
    let section = sweep_plane_section(mesh, values, field.location, plane, range, config, None)?;
    Ok(section.unwrap_or_default())
}

/// Cut the mesh with `config.slices` planes of the given normal spread over its bounding box
///
/// All slices share the texture range of the field.
pub fn extract_slice_stack<M>(
    mesh: &M,
    field: &FieldSelector,
    normal: &Vector3f,
    config: &SliceStackConfig,
) -> Result<Vec<PlaneSection>>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    let values = mesh.field(field)?;
    let range = scan_range(values).unwrap_or_default().resolved();
    let Some(planes) = stack_planes(mesh, normal, config)? else {
        return Ok(Vec::new());
    };

    let _span = info_span!("slice_stack", slices = planes.len()).entered();
    planes
        .iter()
        .map(|plane| {
            sweep_plane_section(mesh, values, field.location, plane, range, &config.section, None)
                .map(Option::unwrap_or_default)
        })
        .collect()
}

/// Planes of a slice stack, `None` for a mesh without nodes
pub(crate) fn stack_planes<M>(
    mesh: &M,
    normal: &Vector3f,
    config: &SliceStackConfig,
) -> Result<Option<Vec<Plane>>>
where
    M: MeshProvider + ?Sized,
{
    let unit = normal.try_normalize(f32::EPSILON).ok_or_else(|| {
        Error::InvalidConfig("Slice normal must not be zero".to_string())
    })?;
    let Some(bbox) = mesh.bounding_box() else {
        return Ok(None);
    };
    let (lo, hi) = bbox.range_along(&unit);
    let planes = stack_offsets(lo, hi, config.slices, config.offset)
        .into_iter()
        .map(|offset| Plane {
            normal: unit,
            offset,
        })
        .collect();
    Ok(Some(planes))
}

/// Per-chunk output of a section sweep
struct ChunkSection {
    triangles: Vec<SliceTriangle>,
    outlines: Vec<BoundaryEdge>,
}

/// Cut all eligible cells; `None` when the token went stale
pub(crate) fn sweep_plane_section<M>(
    mesh: &M,
    values: &[f32],
    location: FieldLocation,
    plane: &Plane,
    range: ValueRange,
    config: &PlaneSectionConfig,
    token: Option<&SweepToken<'_>>,
) -> Result<Option<PlaneSection>>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    config.validate()?;
    let _span = info_span!(
        "plane_section",
        offset = plane.offset,
        elements = mesh.element_count()
    )
    .entered();

    let subdivisions = effective_subdivisions(config.subdivisions);
    let reference = plane.offset;
    // element fields gather against zeros and carry their constant instead
    let zeros;
    let nodal: &[f32] = match location {
        FieldLocation::Node => values,
        FieldLocation::Element => {
            zeros = vec![0.0f32; mesh.node_count()];
            &zeros
        }
    };

    let chunks = parallel::parallel_chunks(mesh.element_count(), |chunk| {
        if token.is_some_and(|t| !t.is_current()) {
            return None;
        }
        let mut out = ChunkSection {
            triangles: Vec::new(),
            outlines: Vec::new(),
        };
        let mut scratch = Vec::new();
        for index in chunk {
            let element = mesh.element(index);
            if !section_eligible(mesh, element, config.cut_hidden) {
                continue;
            }
            let Some(mut cell) = Cell::gather(mesh, index, element, nodal, None) else {
                trace!(element = index, "skipping malformed element");
                continue;
            };
            if location == FieldLocation::Element {
                let Some(&value) = values.get(index) else {
                    continue;
                };
                cell = cell.with_constant_value(value);
            }
            let cell = cell.with_plane_levels(plane);
            if !straddles(&cell, reference) {
                continue;
            }

            if config.collect_cell_outlines {
                scratch.clear();
                march_cell(&cell, reference, &mut scratch);
                out.outlines.extend(cell_outline(&cell, &scratch));
            }

            for child in subdivide(&cell, subdivisions) {
                scratch.clear();
                march_cell(&child, reference, &mut scratch);
                out.triangles.extend(scratch.iter().map(|t| SliceTriangle {
                    positions: t.positions,
                    normals: [plane.normal; 3],
                    values: t.values,
                    tex: if config.normalize_texcoords {
                        t.values.map(|v| range.normalize(v))
                    } else {
                        t.values
                    },
                    element: index,
                    material: element.material,
                    active: element.active,
                    color: None,
                }));
            }
        }
        Some(vec![out])
    });

    let Some(chunks) = chunks else {
        warn!(offset = plane.offset, "discarding stale plane section sweep");
        return Ok(None);
    };

    let mut section = PlaneSection {
        triangles: TriangleBuffer::with_generation(token.map_or(0, |t| t.generation())),
        ..PlaneSection::default()
    };
    for chunk in chunks {
        section.triangles.extend(chunk.triangles);
        section.cell_outlines.extend(chunk.outlines);
    }

    if config.collect_boundary_edges {
        match boundary_edges(mesh, plane, config.cut_hidden, token) {
            Some(edges) => section.boundary_edges = edges,
            None => {
                warn!(offset = plane.offset, "discarding stale plane section sweep");
                return Ok(None);
            }
        }
    }

    debug!(
        triangles = section.triangles.len(),
        boundary_edges = section.boundary_edges.len(),
        cell_outlines = section.cell_outlines.len(),
        "plane section complete"
    );
    Ok(Some(section))
}

/// Intersection segments of the plane with the boundary faces of eligible elements
pub fn boundary_edges<M>(
    mesh: &M,
    plane: &Plane,
    cut_hidden: bool,
    token: Option<&SweepToken<'_>>,
) -> Option<Vec<BoundaryEdge>>
where
    M: MeshProvider + VisibilityOracle + ?Sized,
{
    parallel::parallel_chunks(mesh.face_count(), |chunk| {
        if token.is_some_and(|t| !t.is_current()) {
            return None;
        }
        let mut edges = Vec::new();
        for index in chunk {
            let Some(face) = mesh.face(index) else {
                continue;
            };
            if face.element >= mesh.element_count()
                || !section_eligible(mesh, mesh.element(face.element), cut_hidden)
            {
                continue;
            }
            // triangles repeat their last corner
            let corners = match face.nodes.as_slice() {
                &[a, b, c] => [a, b, c, c],
                &[a, b, c, d] => [a, b, c, d],
                _ => continue,
            };
            if corners.iter().any(|&n| n >= mesh.node_count()) {
                continue;
            }
            let positions = corners.map(|n| mesh.node_position(n));
            let levels = positions.map(|p| plane.level(&p));
            let case = square_case_index(&levels, plane.offset);
            let crossing = |e: usize| -> Point3f {
                let [a, b] = SQUARE_EDGES[e];
                let w = crossing_fraction(levels[a], levels[b], plane.offset);
                positions[a] + (positions[b] - positions[a]) * w
            };
            edges.extend(square_segments(case).map(|[e0, e1]| BoundaryEdge {
                points: [crossing(e0), crossing(e1)],
                element: face.element,
            }));
        }
        Some(edges)
    })
}
