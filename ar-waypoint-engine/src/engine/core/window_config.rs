use bevy::prelude::*;
use bevy::window::PresentMode;

pub fn create_window_config() -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        // Transparent canvas so markers composite over the camera feed in
        // the DOM overlay.
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            transparent: true,
            composite_alpha_mode: bevy::window::CompositeAlphaMode::PreMultiplied,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "AR Waypoints (preview)".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}
