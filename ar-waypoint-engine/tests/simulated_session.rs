use std::time::Duration;

use ar_waypoint_engine::markers::WaypointMarkerTag;
use ar_waypoint_engine::settings::ArSettings;
use ar_waypoint_engine::tools::path_placement::PathPlacementPlugin;
use ar_waypoint_engine::xr::session::{
    ArSessionPlugin, ArSessionStatus, ArViewer, CommandSource, HitTestSample, SelectEvent,
    SessionEndEvent, SessionStartEvent, SessionStateChanged,
};
use ar_waypoint_engine::xr::simulated_plugin::{SimulatedXr, SimulatedXrPlugin};
use ar_waypoint_engine::xr::{ReferenceSpaceKind, TrackerState};
use bevy::prelude::*;

fn viewer_looking_down() -> Transform {
    Transform::from_xyz(0.0, 1.5, 0.0).looking_at(Vec3::new(0.0, 0.0, -1.5), Vec3::Y)
}

fn simulated_app(settings: ArSettings) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(AssetPlugin::default())
        .init_asset::<Mesh>()
        .init_asset::<StandardMaterial>()
        .insert_resource(settings)
        .add_plugins(ArSessionPlugin)
        .add_plugins(SimulatedXrPlugin)
        .add_plugins(PathPlacementPlugin);

    let viewer = viewer_looking_down();
    app.world_mut()
        .spawn((viewer, GlobalTransform::from(viewer), ArViewer));
    app
}

/// Tick until `done` holds; the negotiation runs on the async compute pool.
fn run_until(app: &mut App, done: impl Fn(&World) -> bool) -> bool {
    for _ in 0..500 {
        app.update();
        if done(app.world()) {
            return true;
        }
        std::thread::yield_now();
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

fn tracker_state(world: &World) -> TrackerState {
    world.resource::<ArSessionStatus>().tracker
}

fn start(app: &mut App) {
    app.world_mut().send_event(SessionStartEvent {
        source: CommandSource::Input,
    });
}

#[test]
fn session_start_negotiates_viewer_space_and_tracks_floor() {
    let mut app = simulated_app(ArSettings::default());
    start(&mut app);

    assert!(run_until(&mut app, |world| {
        tracker_state(world) == TrackerState::Active(ReferenceSpaceKind::Viewer)
    }));
    app.update();

    let pose = app
        .world()
        .resource::<HitTestSample>()
        .pose
        .expect("floor below the viewer");
    assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4));
    assert!(app.world().resource::<ArSessionStatus>().running);
}

#[test]
fn only_local_floor_supported() {
    let mut settings = ArSettings::default();
    settings.simulated.supported_reference_spaces = vec![ReferenceSpaceKind::LocalFloor];
    let mut app = simulated_app(settings);
    start(&mut app);

    assert!(run_until(&mut app, |world| {
        tracker_state(world) == TrackerState::Active(ReferenceSpaceKind::LocalFloor)
    }));
    app.update();

    let pose = app.world().resource::<HitTestSample>().pose.expect("visible pose");
    assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4));
}

#[test]
fn unsupported_hit_test_degrades_to_unavailable() {
    let mut settings = ArSettings::default();
    settings.simulated.hit_test_supported = false;
    let mut app = simulated_app(settings);
    start(&mut app);

    assert!(run_until(&mut app, |world| tracker_state(world) == TrackerState::Unavailable));
    app.update();

    assert!(app.world().resource::<HitTestSample>().pose.is_none());
    let published: Vec<SessionStateChanged> = app
        .world_mut()
        .resource_mut::<Events<SessionStateChanged>>()
        .drain()
        .collect();
    assert!(published.iter().any(|change| change.state == TrackerState::Unavailable));
}

#[test]
fn end_releases_source_and_hides_pose() {
    let mut app = simulated_app(ArSettings::default());
    start(&mut app);
    assert!(run_until(&mut app, |world| {
        world.resource::<HitTestSample>().pose.is_some()
    }));

    let session = app
        .world()
        .resource::<SimulatedXr>()
        .session()
        .cloned()
        .expect("running session");

    app.world_mut().send_event(SessionEndEvent {
        source: CommandSource::Input,
    });
    app.update();

    let status = *app.world().resource::<ArSessionStatus>();
    assert!(!status.running);
    assert_eq!(status.tracker, TrackerState::Ended);
    assert!(app.world().resource::<HitTestSample>().pose.is_none());
    assert_eq!(session.cancelled_count(), 1);
}

#[test]
fn restart_during_negotiation_cancels_the_late_source() {
    let mut app = simulated_app(ArSettings::default());
    start(&mut app);
    app.update();

    let first_session = app
        .world()
        .resource::<SimulatedXr>()
        .session()
        .cloned()
        .expect("running session");

    // End and restart in one frame, usually while the first negotiation is
    // still in flight.
    app.world_mut().send_event(SessionEndEvent {
        source: CommandSource::Input,
    });
    start(&mut app);

    assert!(run_until(&mut app, |world| {
        tracker_state(world) == TrackerState::Active(ReferenceSpaceKind::Viewer)
            && first_session.cancelled_count() == 1
    }));

    let xr = app.world().resource::<SimulatedXr>();
    assert!(!xr.is_negotiating());
    assert_eq!(xr.session().map(|session| session.cancelled_count()), Some(0));
}

#[test]
fn tap_after_detection_places_path() {
    let mut app = simulated_app(ArSettings::default());
    start(&mut app);
    assert!(run_until(&mut app, |world| {
        world.resource::<HitTestSample>().pose.is_some()
    }));

    app.world_mut().send_event(SelectEvent {
        source: CommandSource::Input,
    });
    app.update();

    let count = app
        .world_mut()
        .query::<&WaypointMarkerTag>()
        .iter(app.world())
        .count();
    assert_eq!(count, 4);
}
