//! Demo path generation in the horizontal plane.
//!
//! The path is derived from a ground point and the viewer's heading. Headings
//! follow the `atan2(dx, dz)` convention, so 0 faces +Z and π/2 faces +X.

/// Path shape, heading basis and per-point headings.
pub mod path;

pub use path::{HeadingBasis, PathShape, build_path, derive_axes, heading_between, path_headings};
