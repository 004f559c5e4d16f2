use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task, block_on};

use super::session::{
    ArFrameSet, ArSessionStatus, ArViewer, HitTestSample, SessionEndEvent, SessionStartEvent,
    ViewerPose,
};
use super::simulated::{SimulatedFrame, SimulatedSession, SimulatedSource, SimulatedSpace};
use super::{HitTestTracker, NegotiationTicket, ReferenceSpaceKind, XrError, negotiate};
use crate::settings::ArSettings;

type NegotiationOutcome = Result<(SimulatedSource, ReferenceSpaceKind), XrError>;

struct PendingNegotiation {
    ticket: NegotiationTicket,
    task: Task<NegotiationOutcome>,
}

/// Simulated session state owned by the main world.
#[derive(Resource, Default)]
pub struct SimulatedXr {
    tracker: HitTestTracker<SimulatedSource>,
    session: Option<SimulatedSession>,
    pending: Option<PendingNegotiation>,
    /// Negotiations of ended sessions, kept until their sources can be
    /// cancelled.
    stale: Vec<PendingNegotiation>,
}

impl SimulatedXr {
    pub fn tracker(&self) -> &HitTestTracker<SimulatedSource> {
        &self.tracker
    }

    pub fn session(&self) -> Option<&SimulatedSession> {
        self.session.as_ref()
    }

    pub fn is_negotiating(&self) -> bool {
        self.pending.is_some()
    }
}

/// Desktop preview: the [`ArViewer`] camera is the device and the floor plane
/// is the only detectable surface.
pub struct SimulatedXrPlugin;

impl Plugin for SimulatedXrPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulatedXr>().add_systems(
            Update,
            (
                end_simulated_session,
                start_simulated_session,
                poll_negotiation,
                update_hit_test,
                sync_status,
            )
                .chain()
                .in_set(ArFrameSet::Track),
        );
    }
}

fn viewer_transform(viewers: &Query<&GlobalTransform, With<ArViewer>>) -> Option<Transform> {
    viewers.single().ok().map(|global| global.compute_transform())
}

fn start_simulated_session(
    mut starts: EventReader<SessionStartEvent>,
    mut xr: ResMut<SimulatedXr>,
    settings: Res<ArSettings>,
    viewers: Query<&GlobalTransform, With<ArViewer>>,
) {
    let Some(start) = starts.read().last() else {
        return;
    };

    if xr.session.is_none() {
        let origin = viewer_transform(&viewers).unwrap_or_default();
        info!(
            "[SimulatedXr] session started from {:?} at {}",
            start.source, origin.translation
        );
        xr.session = Some(SimulatedSession::from_config(&settings.simulated, origin));
    }

    let Some(ticket) = xr.tracker.begin() else {
        return;
    };
    let Some(session) = xr.session.clone() else {
        return;
    };

    let order = settings.hit_test_reference_spaces.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move { negotiate(&session, &order).await });
    xr.pending = Some(PendingNegotiation { ticket, task });
}

fn poll_task(pending: &mut PendingNegotiation) -> Option<NegotiationOutcome> {
    block_on(futures_lite::future::poll_once(&mut pending.task))
}

fn poll_negotiation(mut xr: ResMut<SimulatedXr>) {
    let xr = &mut *xr;

    // Stale tickets make `complete` cancel whatever source arrives.
    let mut index = 0;
    while index < xr.stale.len() {
        match poll_task(&mut xr.stale[index]) {
            Some(outcome) => {
                let stale = xr.stale.swap_remove(index);
                xr.tracker.complete(stale.ticket, outcome);
            }
            None => index += 1,
        }
    }

    let Some(pending) = xr.pending.as_mut() else {
        return;
    };
    let Some(outcome) = poll_task(pending) else {
        return;
    };

    let ticket = pending.ticket;
    xr.pending = None;
    xr.tracker.complete(ticket, outcome);
}

fn end_simulated_session(mut ends: EventReader<SessionEndEvent>, mut xr: ResMut<SimulatedXr>) {
    let Some(end) = ends.read().last() else {
        return;
    };
    if xr.session.is_none() {
        debug!("[SimulatedXr] end ignored, no session running");
        return;
    }

    info!("[SimulatedXr] session ended from {:?}", end.source);
    xr.tracker.on_session_end();
    xr.session = None;
    if let Some(pending) = xr.pending.take() {
        xr.stale.push(pending);
    }
}

fn update_hit_test(
    xr: Res<SimulatedXr>,
    viewers: Query<&GlobalTransform, With<ArViewer>>,
    mut sample: ResMut<HitTestSample>,
    mut viewer_pose: ResMut<ViewerPose>,
) {
    let viewer = viewer_transform(&viewers);
    viewer_pose.transform = viewer;

    let Some(viewer) = viewer else {
        sample.pose = None;
        return;
    };
    if xr.session.is_none() {
        sample.pose = None;
        return;
    }

    let frame = SimulatedFrame::new(viewer);
    sample.pose = xr.tracker.query(&frame, &SimulatedSpace::world());
}

fn sync_status(xr: Res<SimulatedXr>, mut status: ResMut<ArSessionStatus>) {
    let next = ArSessionStatus {
        running: xr.session.is_some(),
        tracker: xr.tracker.state(),
    };
    if *status != next {
        *status = next;
    }
}
