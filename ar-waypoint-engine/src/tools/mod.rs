//! User-facing tools: input shortcuts and waypoint path placement.
//!
//! ## Input
//!
//! | Input              | Event                | Targets          |
//! |--------------------|----------------------|------------------|
//! | `Enter`            | `SessionStartEvent`  | native           |
//! | `Escape`           | `SessionEndEvent`    | all              |
//! | `Space`/left click | `SelectEvent`        | all              |
//!
//! On the web the session also starts from the page's start button and ends
//! or selects from the XR session itself; the JSON-RPC bridge emits the same
//! events.
//!
//! ## Placement
//!
//! ```text
//! SelectEvent
//!   └─> place_path_on_select()
//!       ├─> derive_axes(viewer forward)
//!       ├─> PathShape::build(hit pose)
//!       ├─> build_markers() + spawn_marker() under a new root
//!       ├─> despawn previous root
//!       └─> PathPlacedEvent
//! ```

/// Keyboard and pointer shortcuts.
pub mod input;

/// Select-driven path placement with atomic replacement.
pub mod path_placement;
