use bevy::asset::LoadState;
use bevy::prelude::*;

use constants::xr::SETTINGS_PATH;

use crate::engine::core::app_state::AppState;
use crate::settings::ArSettings;

#[derive(Resource, Default)]
pub struct SettingsLoader {
    handle: Option<Handle<ArSettings>>,
}

// Start the loading process
pub fn start_loading(mut loader: ResMut<SettingsLoader>, asset_server: Res<AssetServer>) {
    loader.handle = Some(asset_server.load(SETTINGS_PATH));
}

/// Copy the loaded asset into the [`ArSettings`] resource. A missing or
/// malformed file keeps the defaults.
pub fn apply_loaded_settings(
    loader: Res<SettingsLoader>,
    asset_server: Res<AssetServer>,
    settings_assets: Res<Assets<ArSettings>>,
    mut settings: ResMut<ArSettings>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Some(handle) = loader.handle.as_ref() else {
        return;
    };

    if let Some(loaded) = settings_assets.get(handle) {
        info!("✓ Settings loaded from {}", SETTINGS_PATH);
        *settings = loaded.clone();
        next_state.set(AppState::Running);
        return;
    }

    if let LoadState::Failed(err) = asset_server.load_state(handle.id()) {
        warn!("Settings unavailable ({}), using defaults", err);
        next_state.set(AppState::Running);
    }
}
