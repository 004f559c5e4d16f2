//! Scene furniture: lighting, the reticle, and on native builds the floor
//! grid and a status overlay.

/// Flat floor grid shown in the native preview.
#[cfg(not(target_arch = "wasm32"))]
pub mod grid;

/// Native status line: session state, reticle and placement count.
#[cfg(not(target_arch = "wasm32"))]
pub mod overlay;

/// Reticle ring following the last known hit pose.
pub mod reticle;

use bevy::prelude::*;

use crate::xr::session::ArFrameSet;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_lighting, reticle::spawn_reticle))
            .add_systems(Update, reticle::update_reticle.in_set(ArFrameSet::Present));

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(
            Startup,
            (grid::spawn_floor_grid, overlay::create_native_overlay),
        )
        .add_systems(
            Update,
            overlay::session_status_text_system.after(ArFrameSet::Place),
        );
    }
}

fn spawn_lighting(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}
