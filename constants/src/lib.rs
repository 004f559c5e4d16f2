//! Shared configuration defaults for the AR waypoint engine.
//!
//! Every value here is a compile-time default. Runtime overrides come from the
//! `ar_settings.json` asset loaded by the engine crate.

pub mod coordinate_system;
pub mod marker;
pub mod path;
pub mod render_settings;
pub mod xr;
