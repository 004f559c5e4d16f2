use bevy::math::Vec3;

/// World up axis. Tracking spaces are Y-up like WebXR.
pub const UP: Vec3 = Vec3::Y;

/// Forward used when the camera forward has no horizontal component
/// (looking straight up or down). Matches the default camera forward.
pub const FALLBACK_FORWARD: Vec3 = Vec3::NEG_Z;

/// Minimum horizontal length for a projected forward vector to be normalised.
pub const HORIZONTAL_EPSILON: f32 = 1e-4;
