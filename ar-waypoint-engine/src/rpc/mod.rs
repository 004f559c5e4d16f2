//! Page bridge for embedding the AR view in another page.
//!
//! When the engine runs inside an iframe, the host page drives the session and
//! listens for state changes over `postMessage`, using JSON-RPC 2.0 strings.
//! Without a host (top-level page) nothing is posted.
//!
//! Incoming requests are turned into the same events the keyboard and the
//! start button produce, so the session logic never knows who asked:
//!
//! | Method              | Params | Effect                                   |
//! |---------------------|--------|------------------------------------------|
//! | `start_session`     | none   | `SessionStartEvent` (needs a user gesture on the web) |
//! | `end_session`       | none   | `SessionEndEvent`                        |
//! | `select`            | none   | `SelectEvent`, like a tap                |
//! | `get_session_state` | none   | `{running, state, reference_space, reticle_visible}` |
//!
//! Passing params to the session commands answers `-32602`; an unknown method
//! with an `id` answers `-32601`. Messages that are not requests (responses,
//! notifications for methods the engine does not serve) are dropped.
//!
//! Notifications sent after each frame's placement step:
//!
//! - `session_state_changed` `{running, state, reference_space}`
//! - `hit_test_unavailable` `{message}`, for the host to show as a blocker
//! - `reticle_visibility_changed` `{visible}`
//! - `path_placed` `{points: [[x, y, z], ...]}`

/// JSON-RPC message types, the `postMessage` listener and request handlers.
pub mod web_rpc;
