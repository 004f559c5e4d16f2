/// Ring inner radius at scale 1 (metres)
pub const RING_INNER_RADIUS: f32 = 0.08;

/// Ring outer radius at scale 1 (metres)
pub const RING_OUTER_RADIUS: f32 = 0.1;

pub const RING_SEGMENTS: u32 = 32;

/// Height of the arrow above the ring at scale 1
pub const ARROW_OFFSET_Y: f32 = 0.05;

/// Total arrow length (shaft + head) at scale 1
pub const ARROW_LENGTH: f32 = 0.3;

pub const ARROW_SHAFT_RADIUS: f32 = 0.015;
pub const ARROW_HEAD_LENGTH: f32 = 0.12;
pub const ARROW_HEAD_RADIUS: f32 = 0.05;

/// Shortest shaft allowed when the head is longer than the arrow
pub const ARROW_MIN_SHAFT_LENGTH: f32 = 0.01;

pub const ARROW_SHAFT_SEGMENTS: u32 = 16;
pub const ARROW_HEAD_SEGMENTS: u32 = 20;

pub const RING_COLOR: &str = "#00ff66";
pub const ARROW_COLOR: &str = "#ff3f3f";
