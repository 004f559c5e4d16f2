use bevy::prelude::*;
use serde::Serialize;

use super::{
    HitTestResult, HitTestSource, Pose, ReferenceSpace, ReferenceSpaceKind, XrError,
    XrFrameContext, XrSessionBackend,
};

/// Lifecycle of the hit-test resource for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reference_space", rename_all = "snake_case")]
pub enum TrackerState {
    #[default]
    Uninitialized,
    Negotiating,
    Active(ReferenceSpaceKind),
    Unavailable,
    Ended,
}

impl TrackerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Negotiating => "negotiating",
            Self::Active(_) => "active",
            Self::Unavailable => "unavailable",
            Self::Ended => "ended",
        }
    }

    pub fn reference_space(&self) -> Option<ReferenceSpaceKind> {
        match self {
            Self::Active(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Proof that a negotiation was started for a given session generation.
///
/// Ending the session bumps the generation, so a ticket issued before the end
/// can no longer complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct NegotiationTicket {
    generation: u64,
}

/// Owns the single hit-test source of a session and turns per-frame results
/// into one best-guess ground pose.
#[derive(Debug)]
pub struct HitTestTracker<S> {
    state: TrackerState,
    source: Option<S>,
    generation: u64,
}

impl<S> Default for HitTestTracker<S> {
    fn default() -> Self {
        Self {
            state: TrackerState::Uninitialized,
            source: None,
            generation: 0,
        }
    }
}

impl<S: HitTestSource> HitTestTracker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Active(_))
    }

    /// Enter Negotiating. Returns `None` (no-op) while Negotiating, Active or
    /// Unavailable.
    pub fn begin(&mut self) -> Option<NegotiationTicket> {
        match self.state {
            TrackerState::Negotiating | TrackerState::Active(_) | TrackerState::Unavailable => {
                debug!("[HitTest] start ignored in state {}", self.state.name());
                None
            }
            TrackerState::Uninitialized | TrackerState::Ended => {
                self.state = TrackerState::Negotiating;
                Some(NegotiationTicket {
                    generation: self.generation,
                })
            }
        }
    }

    /// Apply a negotiation outcome. Returns `false` when the ticket is stale;
    /// a stale source is cancelled immediately.
    pub fn complete(
        &mut self,
        ticket: NegotiationTicket,
        outcome: Result<(S, ReferenceSpaceKind), XrError>,
    ) -> bool {
        if ticket.generation != self.generation || self.state != TrackerState::Negotiating {
            if let Ok((source, kind)) = outcome {
                info!("[HitTest] discarding late `{}` source after session end", kind);
                source.cancel();
            }
            return false;
        }

        match outcome {
            Ok((source, kind)) => {
                info!("[HitTest] hit-test source acquired in `{}` space", kind);
                self.source = Some(source);
                self.state = TrackerState::Active(kind);
            }
            Err(err) => {
                error!("[HitTest] failed to acquire hit-test source: {}", err);
                self.state = TrackerState::Unavailable;
            }
        }
        true
    }

    /// Negotiate against `session` and apply the outcome. No-op when
    /// [`begin`](Self::begin) refuses.
    pub async fn start<B>(&mut self, session: &B, order: &[ReferenceSpaceKind]) -> TrackerState
    where
        B: XrSessionBackend<Source = S>,
    {
        if let Some(ticket) = self.begin() {
            let outcome = negotiate(session, order).await;
            self.complete(ticket, outcome);
        }
        self.state
    }

    /// Release the source and move to Ended. Safe to call in any state.
    pub fn on_session_end(&mut self) {
        if let Some(source) = self.source.take() {
            source.cancel();
        }
        if self.state != TrackerState::Ended {
            info!("[HitTest] session ended while {}", self.state.name());
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = TrackerState::Ended;
    }

    /// First hit of this frame expressed in `space`, or `None`.
    ///
    /// Platform failures are logged and reported as `None` for this frame only.
    pub fn query<F>(&self, frame: &F, space: &F::Space) -> Option<Pose>
    where
        F: XrFrameContext<Source = S>,
    {
        if !self.is_active() {
            return None;
        }
        let source = self.source.as_ref()?;

        let first_pose = frame.hit_test_results(source).and_then(|results| {
            match results.first() {
                Some(hit) => hit.pose(space),
                None => Ok(None),
            }
        });

        match first_pose {
            Ok(pose) => pose,
            Err(err) => {
                warn!("[HitTest] query failed for this frame: {}", err);
                None
            }
        }
    }
}

/// Try each reference-space kind in `order`, returning the first source the
/// platform accepts together with its kind.
///
/// Each attempt is independent: a rejected space or source moves on to the
/// next kind.
pub async fn negotiate<B: XrSessionBackend>(
    session: &B,
    order: &[ReferenceSpaceKind],
) -> Result<(B::Source, ReferenceSpaceKind), XrError> {
    for &kind in order {
        let space = match session.request_reference_space(kind).await {
            Ok(space) => space,
            Err(err) => {
                warn!("[HitTest] `{}` space not supported: {}", kind, err);
                continue;
            }
        };

        match session.request_hit_test_source(&space).await {
            Ok(source) => return Ok((source, space.kind())),
            Err(err) => {
                warn!("[HitTest] hit-test source rejected in `{}` space: {}", kind, err);
            }
        }
    }

    Err(XrError::ResourceUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::simulated::{SimulatedFrame, SimulatedSession, SimulatedSource, SimulatedSpace};
    use futures_lite::future::block_on;

    fn viewer_looking_down() -> Transform {
        Transform::from_xyz(0.0, 1.5, 0.0).looking_at(Vec3::new(0.0, 0.0, -1.5), Vec3::Y)
    }

    fn world() -> SimulatedSpace {
        SimulatedSpace::world()
    }

    #[test]
    fn first_accepted_kind_wins() {
        let session = SimulatedSession::accepting(&[ReferenceSpaceKind::Local, ReferenceSpaceKind::LocalFloor]);
        let mut tracker = HitTestTracker::new();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));

        assert_eq!(state, TrackerState::Active(ReferenceSpaceKind::Local));
        assert_eq!(session.request_count(), 2);
    }

    #[test]
    fn start_while_active_is_a_noop() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        let requests = session.request_count();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));

        assert_eq!(state, TrackerState::Active(ReferenceSpaceKind::Viewer));
        assert_eq!(session.request_count(), requests);
    }

    #[test]
    fn start_while_negotiating_is_refused() {
        let mut tracker: HitTestTracker<SimulatedSource> = HitTestTracker::new();
        let ticket = tracker.begin();
        assert!(ticket.is_some());
        assert!(tracker.begin().is_none());
        assert_eq!(tracker.state(), TrackerState::Negotiating);
    }

    #[test]
    fn every_kind_rejected_degrades_to_unavailable() {
        let session = SimulatedSession::accepting(&[]);
        let mut tracker = HitTestTracker::new();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        assert_eq!(state, TrackerState::Unavailable);

        let frame = SimulatedFrame::new(viewer_looking_down());
        assert_eq!(tracker.query(&frame, &world()), None);

        // Terminal until the session restarts.
        assert!(tracker.begin().is_none());
    }

    #[test]
    fn setup_failure_before_negotiation_degrades_to_unavailable() {
        let mut tracker = HitTestTracker::<SimulatedSource>::new();
        let ticket = tracker.begin().expect("fresh tracker");

        let accepted = tracker.complete(
            ticket,
            Err(XrError::Unsupported("no world reference space accepted".into())),
        );
        assert!(accepted);
        assert_eq!(tracker.state(), TrackerState::Unavailable);

        tracker.on_session_end();
        assert!(tracker.begin().is_some());
    }

    #[test]
    fn rejected_source_falls_through_to_next_kind() {
        let session = SimulatedSession::default().rejecting_sources_for(&[ReferenceSpaceKind::Viewer]);
        let mut tracker = HitTestTracker::new();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        assert_eq!(state, TrackerState::Active(ReferenceSpaceKind::Local));
    }

    #[test]
    fn local_floor_scenario_sets_visible_pose() {
        let session = SimulatedSession::accepting(&[ReferenceSpaceKind::LocalFloor])
            .with_origin(viewer_looking_down());
        let mut tracker = HitTestTracker::new();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        assert_eq!(state, TrackerState::Active(ReferenceSpaceKind::LocalFloor));

        let frame = SimulatedFrame::new(viewer_looking_down());
        let pose = tracker.query(&frame, &world()).expect("floor hit");
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.5), 1e-4));
    }

    #[test]
    fn query_after_session_end_returns_none() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));

        let frame = SimulatedFrame::new(viewer_looking_down());
        assert!(tracker.query(&frame, &world()).is_some());

        tracker.on_session_end();
        tracker.on_session_end();

        assert_eq!(tracker.state(), TrackerState::Ended);
        assert_eq!(tracker.query(&frame, &world()), None);
        assert_eq!(session.cancelled_count(), 1);
    }

    #[test]
    fn late_negotiation_result_is_discarded() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        let ticket = tracker.begin().expect("fresh tracker accepts start");

        tracker.on_session_end();
        let outcome = block_on(negotiate(&session, &ReferenceSpaceKind::PREFERENCE));
        assert!(!tracker.complete(ticket, outcome));

        assert_eq!(tracker.state(), TrackerState::Ended);
        assert_eq!(session.cancelled_count(), 1);
    }

    #[test]
    fn restart_after_end_negotiates_again() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        tracker.on_session_end();

        let state = block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));
        assert_eq!(state, TrackerState::Active(ReferenceSpaceKind::Viewer));
    }

    #[test]
    fn transient_failure_recovers_next_frame() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));

        let failing = SimulatedFrame::new(viewer_looking_down()).failing("tracking lost");
        assert_eq!(tracker.query(&failing, &world()), None);
        assert!(tracker.is_active());

        let healthy = SimulatedFrame::new(viewer_looking_down());
        assert!(tracker.query(&healthy, &world()).is_some());
    }

    #[test]
    fn no_surface_yields_no_pose() {
        let session = SimulatedSession::default();
        let mut tracker = HitTestTracker::new();
        block_on(tracker.start(&session, &ReferenceSpaceKind::PREFERENCE));

        let looking_up =
            Transform::from_xyz(0.0, 1.5, 0.0).looking_at(Vec3::new(0.0, 3.0, -1.0), Vec3::Y);
        assert_eq!(tracker.query(&SimulatedFrame::new(looking_up), &world()), None);
    }
}
