use bevy::prelude::*;

/// `Loading` waits for the settings asset; everything AR-related runs in
/// `Running`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}
