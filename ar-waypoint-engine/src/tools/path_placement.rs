use bevy::prelude::*;

use constants::coordinate_system::FALLBACK_FORWARD;

use crate::markers::{MarkerAssets, build_markers, refresh_marker_assets, spawn_marker};
use crate::navigation::derive_axes;
use crate::settings::ArSettings;
use crate::xr::session::{ArFrameSet, HitTestSample, SelectEvent, ViewerPose};

/// Root entity owning every marker of the placed path.
#[derive(Component, Debug)]
pub struct WaypointPathRoot;

/// The currently placed path, if any.
#[derive(Resource, Debug, Default)]
pub struct PlacedPath {
    root: Option<Entity>,
    points: Vec<Vec3>,
    placements: u32,
}

impl PlacedPath {
    pub fn root(&self) -> Option<Entity> {
        self.root
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn placements(&self) -> u32 {
        self.placements
    }
}

/// Fired after a path has been placed.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PathPlacedEvent {
    pub points: Vec<Vec3>,
}

pub struct PathPlacementPlugin;

impl Plugin for PathPlacementPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacedPath>()
            .add_event::<PathPlacedEvent>()
            .add_systems(
                Update,
                (
                    refresh_marker_assets.in_set(ArFrameSet::Present),
                    place_path_on_select.in_set(ArFrameSet::Place),
                ),
            );
    }
}

/// Spawn a fresh path at the last known pose on select.
///
/// The new root is spawned and the previous root despawned through the same
/// command queue, so no frame shows both sets or neither.
pub fn place_path_on_select(
    mut commands: Commands,
    mut selects: EventReader<SelectEvent>,
    sample: Res<HitTestSample>,
    viewer: Res<ViewerPose>,
    settings: Res<ArSettings>,
    marker_assets: Option<Res<MarkerAssets>>,
    mut placed: ResMut<PlacedPath>,
    mut placed_events: EventWriter<PathPlacedEvent>,
) {
    // Several selects in one frame place a single path.
    let Some(select) = selects.read().last() else {
        return;
    };

    let Some(pose) = sample.pose else {
        debug!("[Placement] select from {:?} ignored, no surface", select.source);
        return;
    };
    if placed.root.is_some() && !settings.allow_replace {
        debug!("[Placement] path already placed, replacement disabled");
        return;
    }
    let Some(marker_assets) = marker_assets else {
        warn!("[Placement] marker assets not ready");
        return;
    };

    let basis = derive_axes(viewer.forward().unwrap_or(FALLBACK_FORWARD));
    let points = settings.path.build(pose.position, basis.forward, basis.right);
    let markers = build_markers(&points, settings.marker.scale);

    let children: Vec<Entity> = markers
        .iter()
        .enumerate()
        .map(|(index, marker)| spawn_marker(&mut commands, &marker_assets, marker, index))
        .collect();

    let root = commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            WaypointPathRoot,
        ))
        .add_children(&children)
        .id();

    if let Some(previous) = placed.root.replace(root) {
        commands.entity(previous).despawn();
    }
    placed.points = points.to_vec();
    placed.placements += 1;

    info!(
        "[Placement] placed {} waypoints from {} (placement #{})",
        markers.len(),
        pose.position,
        placed.placements
    );
    placed_events.write(PathPlacedEvent {
        points: placed.points.clone(),
    });
}
