//! Browser AR demo: detect a surface with WebXR hit-testing, show a reticle,
//! and drop a short path of waypoint markers on select.
//!
//! The core is platform-independent:
//!
//! - [`xr::hit_test`]: reference-space negotiation and the single current
//!   ground pose.
//! - [`navigation`]: the fixed-shape path and its heading basis.
//! - [`markers`]: ring and arrow marker construction.
//!
//! [`engine`], [`tools`] and [`rpc`] wire the core into a Bevy app; see
//! [`engine::core::app_setup::create_app`].

pub mod engine;
pub mod markers;
pub mod navigation;
pub mod rpc;
pub mod settings;
pub mod tools;
pub mod xr;
