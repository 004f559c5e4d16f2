//! XR platform abstraction and hit-test tracking.
//!
//! The core never talks to a platform directly. It consumes three seams:
//!
//! - [`XrSessionBackend`]: asynchronous reference-space and hit-test source
//!   requests against a running session.
//! - [`XrFrameContext`]: per-frame access to hit-test results for a source.
//! - [`HitTestResult`]: a single result, convertible to a [`Pose`] in a given
//!   reference space.
//!
//! ## Backends
//!
//! - [`simulated`]: desktop preview. Casts the viewer ray against a flat floor
//!   and lets tests reject reference spaces or fail individual frames.
//! - `webxr` (`wasm32` only): WebXR through `js-sys` reflection, driven by the
//!   XR session's own animation-frame loop.
//!
//! ## Tracker Lifecycle
//!
//! ```text
//! Uninitialized ──begin──> Negotiating ──complete(Ok)──> Active(kind)
//!       ^                      │
//!       │                      └──complete(Err)──> Unavailable
//!       │
//!    (begin)    any state ──on_session_end──> Ended
//! ```

use std::fmt;
use std::future::Future;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hit-test tracker state machine and reference-space negotiation.
pub mod hit_test;

/// Blocker and toast messages for XR failures.
pub mod notice;

/// Bevy-facing session resources, events and system sets.
pub mod session;

/// Single-session holder with epochs that go stale on close.
pub mod session_slot;

/// Desktop backend casting the viewer ray against a flat floor.
pub mod simulated;

/// Bevy plugin driving the simulated backend on native builds.
#[cfg(not(target_arch = "wasm32"))]
pub mod simulated_plugin;

/// WebXR backend and animation-frame driver.
#[cfg(target_arch = "wasm32")]
pub mod webxr;

pub use hit_test::{HitTestTracker, NegotiationTicket, TrackerState, negotiate};

/// Reference-space kinds a hit-test source can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    /// Anchored to the device; tracks where it is pointed.
    Viewer,
    /// Anchored near the viewer's position at session start.
    Local,
    /// Like `Local` with the origin levelled to the floor.
    LocalFloor,
}

impl ReferenceSpaceKind {
    /// Preferred negotiation order for hit-test sources.
    pub const PREFERENCE: [Self; 3] = [Self::Viewer, Self::Local, Self::LocalFloor];

    /// WebXR name of this reference space.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Local => "local",
            Self::LocalFloor => "local-floor",
        }
    }

    /// Parse a WebXR reference-space name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "viewer" => Some(Self::Viewer),
            "local" => Some(Self::Local),
            "local-floor" => Some(Self::LocalFloor),
            _ => None,
        }
    }

    /// Parse an ordered list of names, skipping unknown entries.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Self> {
        names
            .iter()
            .filter_map(|name| {
                let kind = Self::from_name(name.as_ref());
                if kind.is_none() {
                    warn!("[Xr] ignoring unknown reference space `{}`", name.as_ref());
                }
                kind
            })
            .collect()
    }
}

/// `deserialize_with` for reference-space lists; unknown names are skipped
/// like in [`ReferenceSpaceKind::parse_list`].
pub fn deserialize_kind_list<'de, D>(deserializer: D) -> Result<Vec<ReferenceSpaceKind>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(ReferenceSpaceKind::parse_list(&names))
}

impl fmt::Display for ReferenceSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and optional orientation sampled in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Option<Quat>,
}

impl Pose {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: None,
        }
    }

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: Some(orientation),
        }
    }

    /// Transform placing an object at this pose; identity rotation when no
    /// orientation was reported.
    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position)
            .with_rotation(self.orientation.unwrap_or(Quat::IDENTITY))
    }

    /// Forward direction (-Z) of the orientation, if present.
    pub fn forward(&self) -> Option<Vec3> {
        self.orientation.map(|rotation| rotation * Vec3::NEG_Z)
    }
}

/// Failures reported by XR backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XrError {
    #[error("reference space `{kind}` rejected: {reason}")]
    ReferenceSpaceRejected {
        kind: ReferenceSpaceKind,
        reason: String,
    },

    #[error("hit-test source for `{kind}` rejected: {reason}")]
    HitTestSourceRejected {
        kind: ReferenceSpaceKind,
        reason: String,
    },

    #[error("hit-test unavailable: every reference space was rejected")]
    ResourceUnavailable,

    #[error("hit-test query failed: {0}")]
    QueryFailed(String),

    #[error("session request failed: {0}")]
    SessionRequestFailed(String),

    #[error("XR is not supported: {0}")]
    Unsupported(String),
}

/// Reference space handed back by a backend.
pub trait ReferenceSpace {
    fn kind(&self) -> ReferenceSpaceKind;
}

/// Platform hit-test resource owned by the tracker while Active.
pub trait HitTestSource {
    /// Release the platform resource. Called at most once per source.
    fn cancel(&self) {}
}

/// Session-level requests used during negotiation.
pub trait XrSessionBackend {
    type Space: ReferenceSpace;
    type Source: HitTestSource;

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> impl Future<Output = Result<Self::Space, XrError>>;

    fn request_hit_test_source(
        &self,
        space: &Self::Space,
    ) -> impl Future<Output = Result<Self::Source, XrError>>;
}

/// One hit-test result, convertible to a pose in a reference space.
pub trait HitTestResult {
    type Space;

    /// `Ok(None)` when the platform cannot express the hit in `space` this frame.
    fn pose(&self, space: &Self::Space) -> Result<Option<Pose>, XrError>;
}

/// Per-frame query context.
pub trait XrFrameContext {
    type Space;
    type Source: HitTestSource;
    type Result: HitTestResult<Space = Self::Space>;

    /// Results ordered nearest first.
    fn hit_test_results(&self, source: &Self::Source) -> Result<Vec<Self::Result>, XrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_space_names_round_trip() {
        for kind in ReferenceSpaceKind::PREFERENCE {
            assert_eq!(ReferenceSpaceKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ReferenceSpaceKind::from_name("unbounded"), None);
    }

    #[test]
    fn preference_order_matches_defaults() {
        let parsed = ReferenceSpaceKind::parse_list(constants::xr::HIT_TEST_REFERENCE_SPACES);
        assert_eq!(parsed, ReferenceSpaceKind::PREFERENCE.to_vec());
    }

    #[test]
    fn unknown_names_are_skipped_in_lists() {
        let parsed = ReferenceSpaceKind::parse_list(&["unbounded", "local", "bounded-floor"]);
        assert_eq!(parsed, vec![ReferenceSpaceKind::Local]);
    }

    #[test]
    fn reference_space_serde_uses_webxr_names() {
        let json = serde_json::to_string(&ReferenceSpaceKind::LocalFloor).unwrap();
        assert_eq!(json, "\"local-floor\"");
        let kind: ReferenceSpaceKind = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(kind, ReferenceSpaceKind::Viewer);
    }

    #[test]
    fn pose_without_orientation_uses_identity_rotation() {
        let pose = Pose::from_position(Vec3::new(1.0, 0.0, -2.0));
        let transform = pose.to_transform();
        assert_eq!(transform.translation, Vec3::new(1.0, 0.0, -2.0));
        assert_eq!(transform.rotation, Quat::IDENTITY);
        assert_eq!(pose.forward(), None);
    }
}
