use bevy::prelude::*;

use constants::marker::RING_SEGMENTS;
use constants::render_settings::{RETICLE_COLOR, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS};

use crate::markers::{RingLayout, parse_color};
use crate::xr::session::HitTestSample;

#[derive(Component, Debug)]
pub struct Reticle;

pub fn spawn_reticle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let ring = RingLayout {
        inner_radius: RETICLE_INNER_RADIUS,
        outer_radius: RETICLE_OUTER_RADIUS,
        segments: RING_SEGMENTS,
    };

    let material = materials.add(StandardMaterial {
        base_color: parse_color(RETICLE_COLOR, RETICLE_COLOR),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands
        .spawn((Transform::default(), Visibility::Hidden, Reticle))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(ring.mesh())),
                MeshMaterial3d(material),
                ring.transform(),
            ));
        });
}

/// Place the reticle at the last known pose; hidden when there is none.
pub fn update_reticle(
    sample: Res<HitTestSample>,
    mut reticles: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    for (mut transform, mut visibility) in &mut reticles {
        match sample.pose {
            Some(pose) => {
                *transform = pose.to_transform();
                visibility.set_if_neq(Visibility::Visible);
            }
            None => {
                visibility.set_if_neq(Visibility::Hidden);
            }
        }
    }
}
