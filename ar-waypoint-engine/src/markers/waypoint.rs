use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use constants::marker::{RING_INNER_RADIUS, RING_OUTER_RADIUS, RING_SEGMENTS};

use super::arrow::ArrowLayout;
use crate::navigation::path_headings;

/// Flat ring lying on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingLayout {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
}

impl RingLayout {
    pub fn scaled(scale: f32) -> Self {
        Self {
            inner_radius: RING_INNER_RADIUS * scale,
            outer_radius: RING_OUTER_RADIUS * scale,
            segments: RING_SEGMENTS,
        }
    }

    /// Annulus meshes face +Z; this lays them flat facing up.
    pub fn transform(&self) -> Transform {
        Transform::from_rotation(Quat::from_rotation_x(-FRAC_PI_2))
    }

    pub fn mesh(&self) -> Mesh {
        Annulus::new(self.inner_radius, self.outer_radius)
            .mesh()
            .resolution(self.segments)
            .build()
    }
}

/// One waypoint: a ground ring and an arrow facing `heading`.
///
/// Pure value; spawning happens in [`super::spawn_marker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointMarker {
    pub position: Vec3,
    pub heading: f32,
    pub scale: f32,
    pub ring: RingLayout,
    pub arrow: ArrowLayout,
}

impl WaypointMarker {
    /// Root transform: placed at `position`, unrotated.
    pub fn root_transform(&self) -> Transform {
        Transform::from_translation(self.position)
    }

    /// Arrow group transform relative to the root.
    pub fn arrow_transform(&self) -> Transform {
        Transform::from_xyz(0.0, self.arrow.offset_y, 0.0)
            .with_rotation(Quat::from_rotation_y(self.heading))
    }

    /// World-space direction the arrow points in.
    pub fn direction(&self) -> Vec3 {
        Quat::from_rotation_y(self.heading) * Vec3::Z
    }
}

pub fn build_marker(position: Vec3, heading: f32, scale: f32) -> WaypointMarker {
    WaypointMarker {
        position,
        heading,
        scale,
        ring: RingLayout::scaled(scale),
        arrow: ArrowLayout::scaled(scale),
    }
}

/// One marker per point, each facing its successor.
pub fn build_markers(points: &[Vec3], scale: f32) -> Vec<WaypointMarker> {
    points
        .iter()
        .zip(path_headings(points))
        .map(|(point, heading)| build_marker(*point, heading, scale))
        .collect()
}
