/// Distance travelled along forward from the origin to the first turn.
pub const FIRST_LEG: f32 = 0.8;

/// Sideways step to the right at the turn.
pub const SIDE_STEP: f32 = 0.6;

/// Distance travelled along forward after the turn.
pub const FINAL_LEG: f32 = 0.6;

/// Number of points in a generated demo path.
pub const PATH_POINT_COUNT: usize = 4;
