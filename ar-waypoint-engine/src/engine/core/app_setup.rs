use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

use crate::engine::camera::viewport_camera::{
    ViewportCamera, camera_controller, spawn_viewer_camera,
};
use crate::engine::core::app_state::AppState;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::settings_loader::{SettingsLoader, apply_loaded_settings, start_loading};
use crate::engine::scene::ScenePlugin;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::settings::ArSettings;
use crate::tools::input::handle_session_shortcuts;
use crate::tools::path_placement::PathPlacementPlugin;
use crate::xr::session::{ArFrameSet, ArSessionPlugin};

#[cfg(not(target_arch = "wasm32"))]
use crate::xr::simulated_plugin::SimulatedXrPlugin;
#[cfg(target_arch = "wasm32")]
use crate::xr::webxr::WebXrPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        // Registers ArSettings as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<ArSettings>::new(&["json"]))
        .add_plugins(ArSessionPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(PathPlacementPlugin)
        .add_plugins(WebRpcPlugin);

    #[cfg(not(target_arch = "wasm32"))]
    app.add_plugins(SimulatedXrPlugin);

    #[cfg(target_arch = "wasm32")]
    app.add_plugins(WebXrPlugin);

    app.init_resource::<ArSettings>()
        .init_resource::<SettingsLoader>()
        .init_resource::<ViewportCamera>();

    #[cfg(target_arch = "wasm32")]
    app.insert_resource(ClearColor(Color::NONE));

    app.add_systems(Startup, (start_loading, spawn_viewer_camera))
        .add_systems(
            Update,
            apply_loaded_settings.run_if(in_state(AppState::Loading)),
        );

    // AR frame sets only run once settings are in place.
    app.configure_sets(
        Update,
        (ArFrameSet::Track, ArFrameSet::Present, ArFrameSet::Place)
            .run_if(in_state(AppState::Running)),
    )
    .add_systems(
        Update,
        (camera_controller, handle_session_shortcuts)
            .before(ArFrameSet::Track)
            .run_if(in_state(AppState::Running)),
    );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
