use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::xr::HIT_TEST_UNAVAILABLE_MESSAGE;

use crate::tools::path_placement::PathPlacedEvent;
use crate::xr::TrackerState;
use crate::xr::session::{
    ArFrameSet, ArSessionStatus, CommandSource, HitTestSample, SelectEvent, SessionEndEvent,
    SessionStartEvent, SessionStateChanged,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// Methods answered by [`handle_rpc_request`].
const SERVED_METHODS: &[&str] = &["start_session", "end_session", "select", "get_session_state"];

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the page and Bevy.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the page without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Notifications queued since the last flush.
    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    /// Responses queued since the last flush.
    pub fn pending_responses(&self) -> &[RpcResponse] {
        &self.outgoing_responses
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .before(ArFrameSet::Track),
            )
            .add_systems(
                Update,
                (publish_session_notifications, send_outgoing_messages)
                    .chain()
                    .after(ArFrameSet::Place),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            // Cheap format check before queuing.
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the page.
#[derive(Event, Debug, Clone)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Session state and command writers used by request handlers.
#[derive(SystemParam)]
pub struct SessionControl<'w> {
    status: Res<'w, ArSessionStatus>,
    sample: Res<'w, HitTestSample>,
    starts: EventWriter<'w, SessionStartEvent>,
    ends: EventWriter<'w, SessionEndEvent>,
    selects: EventWriter<'w, SelectEvent>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut control: SessionControl,
) {
    for event in events.read() {
        debug!("Received RPC: {}", event.content);

        let Some(request) = parse_incoming(&event.content) else {
            continue;
        };
        if let Some(response) = handle_rpc_request(&request, &mut control) {
            rpc_interface.queue_response(response);
        }
    }
}

/// Parse a message as a request for this engine.
///
/// Responses, and notifications for methods the engine does not serve, yield
/// `None`. A page without a host receives its own notifications this way.
fn parse_incoming(content: &str) -> Option<RpcRequest> {
    let request = match serde_json::from_str::<RpcRequest>(content) {
        Ok(request) => request,
        Err(err) => {
            debug!("Ignoring non-request message: {}", err);
            return None;
        }
    };
    if request.id.is_none() && !SERVED_METHODS.contains(&request.method.as_str()) {
        debug!("Ignoring notification `{}`", request.method);
        return None;
    }
    Some(request)
}

/// Handle individual RPC request and generate response based on method.
fn handle_rpc_request(request: &RpcRequest, control: &mut SessionControl) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "start_session" => handle_session_command(&request.params, || {
            control.starts.write(SessionStartEvent {
                source: CommandSource::Rpc,
            });
        }),
        "end_session" => handle_session_command(&request.params, || {
            control.ends.write(SessionEndEvent {
                source: CommandSource::Rpc,
            });
        }),
        "select" => handle_session_command(&request.params, || {
            control.selects.write(SelectEvent {
                source: CommandSource::Rpc,
            });
        }),
        "get_session_state" => Ok(session_state_json(&control.status, &control.sample)),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            // Only generate responses for requests with IDs (notifications have no ID).
            let id = request.id.clone()?;
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({"method": request.method})),
            ));
        }
    };

    let id = request.id.clone()?;
    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Session commands take no parameters; anything but an empty object or null
/// is rejected.
fn handle_session_command(
    params: &serde_json::Value,
    dispatch: impl FnOnce(),
) -> Result<serde_json::Value, RpcError> {
    let empty = match params {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if !empty {
        return Err(RpcError::invalid_params("This method takes no parameters"));
    }

    dispatch();
    Ok(serde_json::json!({ "accepted": true }))
}

fn session_state_json(status: &ArSessionStatus, sample: &HitTestSample) -> serde_json::Value {
    serde_json::json!({
        "running": status.running,
        "state": status.tracker.name(),
        "reference_space": status.reference_space().map(|kind| kind.as_str()),
        "reticle_visible": sample.is_visible(),
    })
}

/// Forward session, reticle and placement changes to the page.
fn publish_session_notifications(
    mut state_changes: EventReader<SessionStateChanged>,
    mut placed: EventReader<PathPlacedEvent>,
    sample: Res<HitTestSample>,
    mut reticle_visible: Local<bool>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for change in state_changes.read() {
        rpc_interface.send_notification(
            "session_state_changed",
            serde_json::json!({
                "running": change.running,
                "state": change.state.name(),
                "reference_space": change.state.reference_space().map(|kind| kind.as_str()),
            }),
        );

        if change.state == TrackerState::Unavailable {
            rpc_interface.send_notification(
                "hit_test_unavailable",
                serde_json::json!({ "message": HIT_TEST_UNAVAILABLE_MESSAGE }),
            );
        }
    }

    if sample.is_visible() != *reticle_visible {
        *reticle_visible = sample.is_visible();
        rpc_interface.send_notification(
            "reticle_visibility_changed",
            serde_json::json!({ "visible": *reticle_visible }),
        );
    }

    for event in placed.read() {
        let points: Vec<[f32; 3]> = event.points.iter().map(|point| point.to_array()).collect();
        rpc_interface.send_notification("path_placed", serde_json::json!({ "points": points }));
    }
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to parent window (the hosting page).
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(window) = window() else {
            error!("Window object not available");
            return;
        };
        let Some(parent) = window.parent().ok().flatten() else {
            warn!("No parent window available for message transmission");
            return;
        };
        // Top-level page: the parent is the window itself and nobody listens.
        if js_sys::Object::is(parent.as_ref(), window.as_ref()) {
            return;
        }
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                    error!("Failed to send message to parent: {:?}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Ok(json) = serde_json::to_string(message) {
            debug!("RPC out: {}", json);
        }
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}
