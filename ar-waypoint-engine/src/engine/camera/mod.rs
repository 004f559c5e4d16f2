//! Viewer camera.
//!
//! On native builds a fly camera stands in for the device (right-drag look,
//! WASD move). In a WebXR session the camera follows the device pose instead.

/// Preview camera resource, spawn helper and controller system.
pub mod viewport_camera;
