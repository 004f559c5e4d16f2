use bevy::prelude::*;

use super::{Pose, ReferenceSpaceKind, TrackerState};

/// Ordering of the per-frame AR update.
///
/// `Track` writes [`HitTestSample`] and [`ViewerPose`], `Present` reads them for
/// the reticle, `Place` reads them on select.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArFrameSet {
    Track,
    Present,
    Place,
}

/// Camera entity acting as the AR viewer.
#[derive(Component, Debug, Default)]
pub struct ArViewer;

/// Where a session command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Input,
    Rpc,
    Platform,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SessionStartEvent {
    pub source: CommandSource,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SessionEndEvent {
    pub source: CommandSource,
}

/// User selection (tap, click, controller trigger).
#[derive(Event, Debug, Clone, Copy)]
pub struct SelectEvent {
    pub source: CommandSource,
}

/// Fired whenever the tracker state published in [`ArSessionStatus`] changes.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SessionStateChanged {
    pub running: bool,
    pub state: TrackerState,
}

/// Session status mirrored from the active backend.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ArSessionStatus {
    pub running: bool,
    pub tracker: TrackerState,
}

impl ArSessionStatus {
    pub fn reference_space(&self) -> Option<ReferenceSpaceKind> {
        self.tracker.reference_space()
    }
}

/// Last known ground hit. `None` hides the reticle and blocks placement.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct HitTestSample {
    pub pose: Option<Pose>,
}

impl HitTestSample {
    pub fn is_visible(&self) -> bool {
        self.pose.is_some()
    }
}

/// Viewer transform in world space for the current frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct ViewerPose {
    pub transform: Option<Transform>,
}

impl ViewerPose {
    pub fn forward(&self) -> Option<Vec3> {
        self.transform.map(|transform| *transform.forward())
    }
}

/// Backend-independent session resources, events and frame ordering.
pub struct ArSessionPlugin;

impl Plugin for ArSessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArSessionStatus>()
            .init_resource::<HitTestSample>()
            .init_resource::<ViewerPose>()
            .add_event::<SessionStartEvent>()
            .add_event::<SessionEndEvent>()
            .add_event::<SelectEvent>()
            .add_event::<SessionStateChanged>()
            .configure_sets(
                Update,
                (ArFrameSet::Track, ArFrameSet::Present, ArFrameSet::Place).chain(),
            )
            .add_systems(
                Update,
                (clear_sample_when_inactive, publish_state_changes)
                    .chain()
                    .after(ArFrameSet::Track)
                    .before(ArFrameSet::Present),
            );
    }
}

/// The sample only carries a pose while a hit-test source is active.
fn clear_sample_when_inactive(status: Res<ArSessionStatus>, mut sample: ResMut<HitTestSample>) {
    if !matches!(status.tracker, TrackerState::Active(_)) && sample.pose.is_some() {
        sample.pose = None;
    }
}

fn publish_state_changes(
    status: Res<ArSessionStatus>,
    mut last: Local<Option<ArSessionStatus>>,
    mut changes: EventWriter<SessionStateChanged>,
) {
    if last.as_ref() == Some(&*status) {
        return;
    }
    *last = Some(*status);

    info!(
        "[Session] running={} tracker={}",
        status.running,
        status.tracker.name()
    );
    changes.write(SessionStateChanged {
        running: status.running,
        state: status.tracker,
    });
}
