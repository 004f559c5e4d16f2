use bevy::prelude::*;

use crate::tools::path_placement::PlacedPath;
use crate::xr::session::{ArSessionStatus, HitTestSample};

#[derive(Component)]
pub struct SessionStatusText;

pub fn create_native_overlay(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Enter: start  Esc: end  Space/click: place"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.0, 1.0, 0.4)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                SessionStatusText,
            ));
        });
}

pub fn session_status_text_system(
    status: Res<ArSessionStatus>,
    sample: Res<HitTestSample>,
    placed: Res<PlacedPath>,
    mut query: Query<&mut Text, With<SessionStatusText>>,
) {
    if !(status.is_changed() || sample.is_changed() || placed.is_changed()) {
        return;
    }

    let session = match (status.running, status.reference_space()) {
        (false, _) => "no session (Enter to start)".to_string(),
        (true, Some(kind)) => format!("hit-test in `{}` space", kind),
        (true, None) => status.tracker.name().to_string(),
    };
    let reticle = if sample.is_visible() { "surface found" } else { "searching" };

    for mut text in &mut query {
        text.0 = format!(
            "{} | {} | paths placed: {}",
            session,
            reticle,
            placed.placements()
        );
    }
}
