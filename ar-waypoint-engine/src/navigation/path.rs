use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::coordinate_system::{FALLBACK_FORWARD, HORIZONTAL_EPSILON, UP};
use constants::path::{FINAL_LEG, FIRST_LEG, PATH_POINT_COUNT, SIDE_STEP};

/// Leg lengths of the forward, right, forward demo path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathShape {
    pub first_leg: f32,
    pub side_step: f32,
    pub final_leg: f32,
}

impl Default for PathShape {
    fn default() -> Self {
        Self {
            first_leg: FIRST_LEG,
            side_step: SIDE_STEP,
            final_leg: FINAL_LEG,
        }
    }
}

impl PathShape {
    /// Build the path from `origin` along the given basis. The basis is used
    /// as is, without normalisation.
    pub fn build(&self, origin: Vec3, forward: Vec3, right: Vec3) -> [Vec3; PATH_POINT_COUNT] {
        let p0 = origin;
        let p1 = p0 + forward * self.first_leg;
        let p2 = p1 + right * self.side_step;
        let p3 = p2 + forward * self.final_leg;
        [p0, p1, p2, p3]
    }
}

/// [`PathShape::build`] with the default leg lengths.
pub fn build_path(origin: Vec3, forward: Vec3, right: Vec3) -> [Vec3; PATH_POINT_COUNT] {
    PathShape::default().build(origin, forward, right)
}

/// Horizontal forward/right pair derived from a camera forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

/// Flatten `camera_forward` onto the ground plane.
///
/// When the camera looks straight up or down the forward falls back to -Z and
/// right to +X.
pub fn derive_axes(camera_forward: Vec3) -> HeadingBasis {
    let flat = camera_forward - UP * camera_forward.dot(UP);
    let length = flat.length();

    let forward = if length < HORIZONTAL_EPSILON || !length.is_finite() {
        FALLBACK_FORWARD
    } else {
        flat / length
    };

    HeadingBasis {
        forward,
        right: forward.cross(UP),
    }
}

/// Rotation about +Y facing from `from` towards `to`. Zero when the points
/// coincide horizontally.
pub fn heading_between(from: Vec3, to: Vec3) -> f32 {
    let delta = to - from;
    delta.x.atan2(delta.z)
}

/// Heading of each point towards its successor. The last point faces its own
/// position and so always gets 0.
pub fn path_headings(points: &[Vec3]) -> Vec<f32> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let next = points.get(index + 1).unwrap_or(point);
            heading_between(*point, *next)
        })
        .collect()
}
