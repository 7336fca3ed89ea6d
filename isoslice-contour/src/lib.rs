//! # isoslice contour
//!
//! Iso-surfaces and plane sections of scalar fields on mixed-element finite
//! element meshes.
//!
//! Every solid element is mapped onto a canonical eight-corner cell, optionally
//! split into smaller cells, and run through a single marching cubes kernel.
//! Plane sections reuse the same kernel with the projection of each corner on
//! the plane normal as the classified level.

pub mod canonical;
pub mod classify;
pub mod engine;
pub mod interpolate;
pub mod iso_surface;
pub mod levels;
pub mod marching;
pub mod nodal;
pub mod parallel;
pub mod range;
pub mod section;
pub mod subdivide;
pub mod tables;

// Re-export commonly used items
pub use engine::{ContourEngine, Sweep, SweepToken};
pub use iso_surface::*;
pub use levels::*;
pub use nodal::{average_to_nodes, nodal_gradient};
pub use parallel::{init_thread_pool, ThreadPoolConfig};
pub use range::*;
pub use section::*;
pub use subdivide::MAX_SUBDIVISIONS;
