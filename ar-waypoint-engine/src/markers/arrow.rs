use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use constants::marker::{
    ARROW_HEAD_LENGTH, ARROW_HEAD_RADIUS, ARROW_LENGTH, ARROW_MIN_SHAFT_LENGTH, ARROW_OFFSET_Y,
    ARROW_SHAFT_RADIUS,
};

/// Arrow dimensions in the arrow's local frame. The arrow starts at the
/// origin and points along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowLayout {
    pub length: f32,
    pub shaft_length: f32,
    pub shaft_radius: f32,
    pub head_length: f32,
    pub head_radius: f32,
    /// Height above the ring.
    pub offset_y: f32,
}

impl Default for ArrowLayout {
    fn default() -> Self {
        Self::scaled(1.0)
    }
}

impl ArrowLayout {
    pub fn scaled(scale: f32) -> Self {
        let length = ARROW_LENGTH * scale;
        let head_length = ARROW_HEAD_LENGTH * scale;

        Self {
            length,
            shaft_length: (length - head_length).max(ARROW_MIN_SHAFT_LENGTH),
            shaft_radius: ARROW_SHAFT_RADIUS * scale,
            head_length,
            head_radius: ARROW_HEAD_RADIUS * scale,
            offset_y: ARROW_OFFSET_Y * scale,
        }
    }

    /// Y-aligned primitives lie along +Z after this rotation.
    pub fn primitive_rotation() -> Quat {
        Quat::from_rotation_x(FRAC_PI_2)
    }

    /// Shaft transform relative to the arrow origin.
    pub fn shaft_transform(&self) -> Transform {
        Transform::from_xyz(0.0, 0.0, self.shaft_length * 0.5)
            .with_rotation(Self::primitive_rotation())
    }

    /// Head transform relative to the arrow origin; the tip sits at
    /// `shaft_length + head_length`.
    pub fn head_transform(&self) -> Transform {
        Transform::from_xyz(0.0, 0.0, self.shaft_length + self.head_length * 0.5)
            .with_rotation(Self::primitive_rotation())
    }

    pub fn shaft_mesh(&self, segments: u32) -> Mesh {
        Cylinder::new(self.shaft_radius, self.shaft_length)
            .mesh()
            .resolution(segments)
            .build()
    }

    pub fn head_mesh(&self, segments: u32) -> Mesh {
        Cone::new(self.head_radius, self.head_length)
            .mesh()
            .resolution(segments)
            .build()
    }
}
