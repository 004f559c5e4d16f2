/// Reticle ring radii (metres), same footprint as a waypoint ring
pub const RETICLE_INNER_RADIUS: f32 = 0.08;
pub const RETICLE_OUTER_RADIUS: f32 = 0.1;
pub const RETICLE_COLOR: &str = "#00ff66";

/// Half extent of the native preview floor grid (metres)
pub const FLOOR_GRID_HALF_EXTENT: f32 = 5.0;

/// Spacing between floor grid lines (metres)
pub const FLOOR_GRID_SPACING: f32 = 0.5;

/// Eye height of the preview camera above the floor
pub const PREVIEW_EYE_HEIGHT: f32 = 1.6;

/// Initial downward pitch of the preview camera (radians)
pub const PREVIEW_INITIAL_PITCH: f32 = -0.6;
