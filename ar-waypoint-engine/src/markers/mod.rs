//! Waypoint marker construction and spawning.
//!
//! A marker is a flat ring on the ground with an arrow floating just above it,
//! rotated about +Y to face the next waypoint:
//!
//! ```text
//! root (position)
//!  ├─ ring   (annulus, rotated -90° about X)
//!  └─ arrow  (offset_y, rotated heading about Y)
//!      ├─ shaft (cylinder along +Z)
//!      └─ head  (cone along +Z)
//! ```
//!
//! [`build_marker`] is pure. [`spawn_marker`] turns the value into entities
//! using meshes cached in [`MarkerAssets`].

/// Arrow shaft and head layout.
pub mod arrow;

/// Marker value type and builders.
pub mod waypoint;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::marker::{ARROW_COLOR, ARROW_HEAD_SEGMENTS, ARROW_SHAFT_SEGMENTS, RING_COLOR};

pub use arrow::ArrowLayout;
pub use waypoint::{RingLayout, WaypointMarker, build_marker, build_markers};

/// Marker appearance, overridable from the settings asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub scale: f32,
    pub ring_color: String,
    pub arrow_color: String,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            scale: 1.0,
            ring_color: RING_COLOR.to_string(),
            arrow_color: ARROW_COLOR.to_string(),
        }
    }
}

/// Parse a `#rrggbb` colour, falling back to `fallback` when malformed.
pub fn parse_color(hex: &str, fallback: &str) -> Color {
    match Srgba::hex(hex) {
        Ok(color) => color.into(),
        Err(err) => {
            warn!("[Markers] invalid colour `{}` ({:?}), using {}", hex, err, fallback);
            Srgba::hex(fallback).map(Color::from).unwrap_or(Color::WHITE)
        }
    }
}

/// Meshes and materials shared by every marker of one style.
#[derive(Resource, Debug, Clone)]
pub struct MarkerAssets {
    pub style: MarkerStyle,
    pub ring_mesh: Handle<Mesh>,
    pub shaft_mesh: Handle<Mesh>,
    pub head_mesh: Handle<Mesh>,
    pub ring_material: Handle<StandardMaterial>,
    pub arrow_material: Handle<StandardMaterial>,
}

impl MarkerAssets {
    pub fn new(
        style: &MarkerStyle,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) -> Self {
        let ring = RingLayout::scaled(style.scale);
        let arrow = ArrowLayout::scaled(style.scale);

        Self {
            style: style.clone(),
            ring_mesh: meshes.add(ring.mesh()),
            shaft_mesh: meshes.add(arrow.shaft_mesh(ARROW_SHAFT_SEGMENTS)),
            head_mesh: meshes.add(arrow.head_mesh(ARROW_HEAD_SEGMENTS)),
            ring_material: materials.add(StandardMaterial {
                base_color: parse_color(&style.ring_color, RING_COLOR),
                unlit: true,
                double_sided: true,
                cull_mode: None,
                ..default()
            }),
            arrow_material: materials.add(StandardMaterial {
                base_color: parse_color(&style.arrow_color, ARROW_COLOR),
                ..default()
            }),
        }
    }
}

/// Tag on every marker root; `index` is the position along the path.
#[derive(Component, Debug, Clone, Copy)]
pub struct WaypointMarkerTag {
    pub index: usize,
    pub heading: f32,
}

#[derive(Component, Debug)]
pub struct MarkerRing;

#[derive(Component, Debug)]
pub struct MarkerArrow;

/// Spawn `marker` with its ring and arrow children. Returns the root entity.
pub fn spawn_marker(
    commands: &mut Commands,
    assets: &MarkerAssets,
    marker: &WaypointMarker,
    index: usize,
) -> Entity {
    let ring = commands
        .spawn((
            Mesh3d(assets.ring_mesh.clone()),
            MeshMaterial3d(assets.ring_material.clone()),
            marker.ring.transform(),
            MarkerRing,
        ))
        .id();

    let shaft = commands
        .spawn((
            Mesh3d(assets.shaft_mesh.clone()),
            MeshMaterial3d(assets.arrow_material.clone()),
            marker.arrow.shaft_transform(),
        ))
        .id();
    let head = commands
        .spawn((
            Mesh3d(assets.head_mesh.clone()),
            MeshMaterial3d(assets.arrow_material.clone()),
            marker.arrow.head_transform(),
        ))
        .id();
    let arrow = commands
        .spawn((marker.arrow_transform(), Visibility::default(), MarkerArrow))
        .add_children(&[shaft, head])
        .id();

    commands
        .spawn((
            marker.root_transform(),
            Visibility::default(),
            WaypointMarkerTag {
                index,
                heading: marker.heading,
            },
        ))
        .add_children(&[ring, arrow])
        .id()
}

/// Rebuild [`MarkerAssets`] when the configured style changes.
pub fn refresh_marker_assets(
    mut commands: Commands,
    settings: Res<crate::settings::ArSettings>,
    existing: Option<Res<MarkerAssets>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if existing.is_some_and(|assets| assets.style == settings.marker) {
        return;
    }
    commands.insert_resource(MarkerAssets::new(
        &settings.marker,
        &mut meshes,
        &mut materials,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_colour_falls_back() {
        let color = parse_color("not-a-colour", "#ff0000");
        assert_eq!(color, Color::from(Srgba::rgb(1.0, 0.0, 0.0)));
    }

    #[test]
    fn default_style_uses_marker_colours() {
        let style = MarkerStyle::default();
        assert_eq!(style.ring_color, "#00ff66");
        assert_eq!(style.arrow_color, "#ff3f3f");
        assert_eq!(style.scale, 1.0);
    }
}
