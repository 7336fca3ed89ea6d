//! Core data structures and traits for isoslice
//!
//! This crate provides the mesh, field, plane and range types shared by the
//! contouring kernel, together with the provider traits through which the
//! kernel reads a model and the triangle buffer it writes.

pub mod color;
pub mod element;
pub mod error;
pub mod fe_mesh;
pub mod field;
pub mod material;
pub mod mesh;
pub mod plane;
pub mod point;
pub mod range;
pub mod traits;
pub mod triangles;

pub use color::*;
pub use element::*;
pub use error::*;
pub use fe_mesh::*;
pub use field::*;
pub use material::*;
pub use mesh::*;
pub use plane::*;
pub use point::*;
pub use range::*;
pub use traits::*;
pub use triangles::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point3, Vector3};
