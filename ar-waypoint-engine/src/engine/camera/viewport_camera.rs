use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;

use constants::render_settings::{PREVIEW_EYE_HEIGHT, PREVIEW_INITIAL_PITCH};

use crate::xr::session::{ArSessionStatus, ArViewer};

#[derive(Resource, Debug, Clone)]
pub struct ViewportCamera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub move_speed: f32,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, PREVIEW_EYE_HEIGHT, 0.0),
            pitch: PREVIEW_INITIAL_PITCH,
            yaw: 0.0,
            move_speed: 1.5,
        }
    }
}

impl ViewportCamera {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation())
    }
}

pub fn spawn_viewer_camera(mut commands: Commands, viewport: Res<ViewportCamera>) {
    commands.spawn((Camera3d::default(), viewport.transform(), ArViewer));
}

/// Right-drag to look, WASD to walk, Q/E down/up, scroll to dolly.
///
/// Idle while a device-tracked session drives the camera.
pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<ArViewer>>,
    mut viewport: ResMut<ViewportCamera>,
    status: Res<ArSessionStatus>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll_accum: f32 = scroll_events
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        })
        .sum();

    if cfg!(target_arch = "wasm32") && status.running {
        return;
    }
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        viewport.yaw -= mouse_delta.x * yaw_sens;
        viewport.pitch -= mouse_delta.y * pitch_sens;
        viewport.pitch = viewport.pitch.clamp(-1.55, 1.55);
    }

    let rotation = viewport.rotation();
    let forward = rotation * Vec3::NEG_Z;
    let right = rotation * Vec3::X;

    if scroll_accum.abs() > f32::EPSILON {
        viewport.position += forward * scroll_accum * 0.25;
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) { move_input.z += 1.0; }
    if keyboard.pressed(KeyCode::KeyS) { move_input.z -= 1.0; }
    if keyboard.pressed(KeyCode::KeyD) { move_input.x += 1.0; }
    if keyboard.pressed(KeyCode::KeyA) { move_input.x -= 1.0; }
    if keyboard.pressed(KeyCode::KeyE) { move_input.y += 1.0; } // Up
    if keyboard.pressed(KeyCode::KeyQ) { move_input.y -= 1.0; } // Down

    if move_input != Vec3::ZERO {
        // Walk on the horizontal plane like a person holding a phone.
        let flat_forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
        let flat_right = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();

        let mut speed = viewport.move_speed;
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) { speed *= 3.0; }
        if keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) { speed *= 0.25; }

        let world_delta = flat_right * move_input.x + Vec3::Y * move_input.y + flat_forward * move_input.z;
        viewport.position += world_delta.normalize_or_zero() * speed * time.delta_secs();
    }

    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    let target = viewport.transform();
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target.rotation, lerp_speed);
}
