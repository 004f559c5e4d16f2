use std::future::{Future, ready};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::xr::{SIMULATED_FLOOR_HEIGHT, SIMULATED_MAX_HIT_DISTANCE};

use super::{
    HitTestResult, HitTestSource, Pose, ReferenceSpace, ReferenceSpaceKind, XrError,
    XrFrameContext, XrSessionBackend,
};

/// Settings for the desktop preview backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedXrConfig {
    /// Reference spaces the simulated platform accepts.
    #[serde(deserialize_with = "super::deserialize_kind_list")]
    pub supported_reference_spaces: Vec<ReferenceSpaceKind>,
    /// When false every hit-test source request is rejected.
    pub hit_test_supported: bool,
    pub floor_height: f32,
    pub max_hit_distance: f32,
}

impl Default for SimulatedXrConfig {
    fn default() -> Self {
        Self {
            supported_reference_spaces: ReferenceSpaceKind::PREFERENCE.to_vec(),
            hit_test_supported: true,
            floor_height: SIMULATED_FLOOR_HEIGHT,
            max_hit_distance: SIMULATED_MAX_HIT_DISTANCE,
        }
    }
}

#[derive(Debug, Default)]
struct SimulatedCounters {
    space_requests: AtomicUsize,
    cancelled_sources: AtomicUsize,
}

/// Session whose platform answers are decided up front.
#[derive(Debug, Clone)]
pub struct SimulatedSession {
    accepted: Vec<ReferenceSpaceKind>,
    rejected_sources: Vec<ReferenceSpaceKind>,
    origin: Transform,
    floor_height: f32,
    max_hit_distance: f32,
    counters: Arc<SimulatedCounters>,
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self::from_config(&SimulatedXrConfig::default(), Transform::IDENTITY)
    }
}

impl SimulatedSession {
    /// `origin` is the viewer transform at session start; local spaces are
    /// anchored there.
    pub fn from_config(config: &SimulatedXrConfig, origin: Transform) -> Self {
        let rejected_sources = if config.hit_test_supported {
            Vec::new()
        } else {
            ReferenceSpaceKind::PREFERENCE.to_vec()
        };

        Self {
            accepted: config.supported_reference_spaces.clone(),
            rejected_sources,
            origin,
            floor_height: config.floor_height,
            max_hit_distance: config.max_hit_distance,
            counters: Arc::default(),
        }
    }

    /// Session accepting only `kinds`.
    pub fn accepting(kinds: &[ReferenceSpaceKind]) -> Self {
        Self {
            accepted: kinds.to_vec(),
            ..Self::default()
        }
    }

    /// Reject hit-test sources bound to any of `kinds`.
    pub fn rejecting_sources_for(mut self, kinds: &[ReferenceSpaceKind]) -> Self {
        self.rejected_sources = kinds.to_vec();
        self
    }

    pub fn with_origin(mut self, origin: Transform) -> Self {
        self.origin = origin;
        self
    }

    /// Number of reference-space requests made so far.
    pub fn request_count(&self) -> usize {
        self.counters.space_requests.load(Ordering::Relaxed)
    }

    /// Number of sources cancelled so far.
    pub fn cancelled_count(&self) -> usize {
        self.counters.cancelled_sources.load(Ordering::Relaxed)
    }
}

impl XrSessionBackend for SimulatedSession {
    type Space = SimulatedSpace;
    type Source = SimulatedSource;

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> impl Future<Output = Result<SimulatedSpace, XrError>> {
        self.counters.space_requests.fetch_add(1, Ordering::Relaxed);

        let result = if self.accepted.contains(&kind) {
            Ok(SimulatedSpace {
                kind,
                origin: self.origin,
            })
        } else {
            Err(XrError::ReferenceSpaceRejected {
                kind,
                reason: "not supported by the simulated session".to_string(),
            })
        };
        ready(result)
    }

    fn request_hit_test_source(
        &self,
        space: &SimulatedSpace,
    ) -> impl Future<Output = Result<SimulatedSource, XrError>> {
        let result = if self.rejected_sources.contains(&space.kind) {
            Err(XrError::HitTestSourceRejected {
                kind: space.kind,
                reason: "hit-test disabled in the simulated session".to_string(),
            })
        } else {
            Ok(SimulatedSource {
                space: space.clone(),
                floor_height: self.floor_height,
                max_hit_distance: self.max_hit_distance,
                counters: self.counters.clone(),
            })
        };
        ready(result)
    }
}

/// Reference space with an origin in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSpace {
    pub kind: ReferenceSpaceKind,
    pub origin: Transform,
}

impl SimulatedSpace {
    /// Floor-levelled space coinciding with the world frame.
    pub fn world() -> Self {
        Self {
            kind: ReferenceSpaceKind::LocalFloor,
            origin: Transform::IDENTITY,
        }
    }
}

impl ReferenceSpace for SimulatedSpace {
    fn kind(&self) -> ReferenceSpaceKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct SimulatedSource {
    space: SimulatedSpace,
    floor_height: f32,
    max_hit_distance: f32,
    counters: Arc<SimulatedCounters>,
}

impl HitTestSource for SimulatedSource {
    fn cancel(&self) {
        self.counters.cancelled_sources.fetch_add(1, Ordering::Relaxed);
    }
}

/// One simulated frame: the viewer transform, optionally failing.
#[derive(Debug, Clone)]
pub struct SimulatedFrame {
    viewer: Transform,
    failure: Option<String>,
}

impl SimulatedFrame {
    pub fn new(viewer: Transform) -> Self {
        Self {
            viewer,
            failure: None,
        }
    }

    /// Make `hit_test_results` fail for this frame.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

/// Floor hit in world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedHit {
    position: Vec3,
}

impl HitTestResult for SimulatedHit {
    type Space = SimulatedSpace;

    fn pose(&self, space: &SimulatedSpace) -> Result<Option<Pose>, XrError> {
        let to_space = space.origin.compute_affine().inverse();
        let position = to_space.transform_point3(self.position);
        // Floor normal is world up, so the hit is unrotated in world space.
        let orientation = space.origin.rotation.inverse();
        Ok(Some(Pose::new(position, orientation)))
    }
}

impl XrFrameContext for SimulatedFrame {
    type Space = SimulatedSpace;
    type Source = SimulatedSource;
    type Result = SimulatedHit;

    fn hit_test_results(&self, source: &SimulatedSource) -> Result<Vec<SimulatedHit>, XrError> {
        if let Some(reason) = &self.failure {
            return Err(XrError::QueryFailed(reason.clone()));
        }

        // Viewer sources follow the device; local sources cast from their origin.
        let ray_from = match source.space.kind {
            ReferenceSpaceKind::Viewer => self.viewer,
            ReferenceSpaceKind::Local | ReferenceSpaceKind::LocalFloor => source.space.origin,
        };

        let hit = floor_intersection(
            ray_from.translation,
            *ray_from.forward(),
            source.floor_height,
            source.max_hit_distance,
        );
        Ok(hit.map(|position| SimulatedHit { position }).into_iter().collect())
    }
}

/// Intersect a ray with the horizontal plane at `floor_height`.
pub fn floor_intersection(
    origin: Vec3,
    direction: Vec3,
    floor_height: f32,
    max_distance: f32,
) -> Option<Vec3> {
    if direction.y.abs() < 0.001 {
        return None;
    }
    let t = (floor_height - origin.y) / direction.y;
    let hit = origin + direction * t;
    if t > 0.0 && origin.distance(hit) <= max_distance {
        Some(hit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_intersection_hits_below_viewer() {
        let hit = floor_intersection(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, -1.0), 0.0, 10.0);
        assert_eq!(hit, Some(Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn floor_intersection_ignores_parallel_and_upward_rays() {
        assert_eq!(floor_intersection(Vec3::Y, Vec3::NEG_Z, 0.0, 10.0), None);
        assert_eq!(floor_intersection(Vec3::Y, Vec3::Y, 0.0, 10.0), None);
    }

    #[test]
    fn floor_intersection_respects_max_distance() {
        let far = floor_intersection(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -0.01, -1.0), 0.0, 10.0);
        assert_eq!(far, None);
    }

    #[test]
    fn config_without_hit_test_rejects_every_source() {
        let config = SimulatedXrConfig {
            hit_test_supported: false,
            ..default()
        };
        let session = SimulatedSession::from_config(&config, Transform::IDENTITY);
        let space = SimulatedSpace::world();
        let result = futures_lite::future::block_on(session.request_hit_test_source(&space));
        assert!(matches!(result, Err(XrError::HitTestSourceRejected { .. })));
    }

    #[test]
    fn hit_pose_is_expressed_relative_to_space_origin() {
        let space = SimulatedSpace {
            kind: ReferenceSpaceKind::Local,
            origin: Transform::from_xyz(1.0, 0.0, 0.0),
        };
        let hit = SimulatedHit {
            position: Vec3::new(1.0, 0.0, -2.0),
        };
        let pose = hit.pose(&space).unwrap().unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }
}
