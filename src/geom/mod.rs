//! Geometry kernel: the parametric meshes emitted for guide-like
//! components. Rigid transforms back the numeric checks on orientation
//! chains in test builds.

#[cfg(test)]
mod core;
mod diagnostics;
mod mesh;

#[cfg(test)]
pub use core::{Tolerance, Transform, Vec3};
pub use diagnostics::MeshDiagnostics;
pub use mesh::{
    ELLIPTIC_SEGMENTS, EllipticDimensions, OffMesh, WedgeDimensions, ellipse_half_width,
    elliptic_revolve, wedge,
};
