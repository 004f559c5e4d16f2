use bevy::prelude::*;

use crate::xr::session::{CommandSource, SelectEvent, SessionEndEvent, SessionStartEvent};

/// Enter starts the session, Escape ends it, Space or left click selects.
///
/// On the web the start key is ignored: the platform only grants an AR
/// session from a user gesture on the page's start button.
pub fn handle_session_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut starts: EventWriter<SessionStartEvent>,
    mut ends: EventWriter<SessionEndEvent>,
    mut selects: EventWriter<SelectEvent>,
) {
    let source = CommandSource::Input;

    if keyboard.just_pressed(KeyCode::Enter) && cfg!(not(target_arch = "wasm32")) {
        starts.write(SessionStartEvent { source });
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        ends.write(SessionEndEvent { source });
    }
    if keyboard.just_pressed(KeyCode::Space) || mouse_button.just_pressed(MouseButton::Left) {
        selects.write(SelectEvent { source });
    }
}
