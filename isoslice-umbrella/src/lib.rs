//! # isoslice
//!
//! Iso-surfaces and plane sections of scalar fields on mixed-element finite
//! element meshes.
//!
//! This is the umbrella crate that re-exports the core data model and the
//! contouring kernel. Use the individual crates for more granular control over
//! dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use isoslice::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut mesh = FeMesh::hex_grid([4, 4, 4], [0.25; 3], Point3f::origin());
//! mesh.set_node_field_with("temperature", |p| p.z);
//!
//! let field = FieldSelector::node("temperature");
//! let surface = extract_iso_surface(&mesh, &field, &[0.5], &IsoSurfaceConfig::default())?;
//! assert!((surface.area() - 1.0).abs() < 1e-4);
//!
//! let plane = Plane::from_coefficients([1.0, 0.0, 0.0, 0.4])?;
//! let section = extract_plane_section(&mesh, &field, &plane, &PlaneSectionConfig::default())?;
//! assert!(!section.triangles.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables the contouring kernel
//! - `contour`: Iso-surfaces, plane sections and the frame-aware engine
//! - `all`: Enables all features

// Re-export core functionality
pub use isoslice_core::*;

#[cfg(feature = "contour")]
pub use isoslice_contour as contour;

/// Convenient imports for common use cases
pub mod prelude {
    pub use isoslice_core::*;

    #[cfg(feature = "contour")]
    pub use isoslice_contour::{
        extract_iso_levels, extract_iso_surface, extract_plane_section, extract_slice_stack,
        ContourEngine, IsoSurfaceConfig, LevelSpacing, NormalMode, PlaneSection,
        PlaneSectionConfig, RangeConfig, RangeTracker, SliceStackConfig, Sweep,
    };
}
