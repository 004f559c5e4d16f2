//! WebXR backend.
//!
//! Bevy renders to its own canvas and cannot submit frames to an XR layer, so
//! the session runs its own animation-frame loop next to Bevy's:
//!
//! ```text
//! XR rAF callback ──> tracker.query() ──> XrShared.latest_hit / latest_viewer
//!                                               │
//! Bevy Update (ArFrameSet::Track) <── sync_webxr ┘
//! ```
//!
//! The Bevy canvas is transparent and shown through the `dom-overlay` feature,
//! so markers draw over the camera feed. The XR layer itself is a bare WebGL2
//! context that is never drawn to.
//!
//! All WebXR calls go through `js_sys::Reflect`, keeping the backend
//! independent of the unstable `web-sys` WebXR bindings.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use bevy::prelude::*;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};

use constants::xr::{DOM_OVERLAY_FEATURE, OPTIONAL_FEATURES, REQUIRED_FEATURES, SESSION_MODE, START_BUTTON_ID};

use super::notice::PageNotice;
use super::session::{
    ArFrameSet, ArSessionStatus, ArViewer, CommandSource, HitTestSample, SelectEvent,
    SessionEndEvent, SessionStartEvent, SessionStateChanged, ViewerPose,
};
use super::session_slot::{SessionEpoch, SessionSlot};
use super::{
    HitTestResult, HitTestSource, HitTestTracker, Pose, ReferenceSpace, ReferenceSpaceKind,
    XrError, XrFrameContext, XrSessionBackend, negotiate,
};
use crate::settings::ArSettings;

fn js_get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

fn js_call(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let function: Function = js_get(target, method)?.dyn_into()?;
    let arguments = Array::new();
    for arg in args {
        arguments.push(arg);
    }
    Reflect::apply(&function, target, &arguments)
}

async fn js_await(value: JsValue) -> Result<JsValue, JsValue> {
    let promise: Promise = value.dyn_into()?;
    JsFuture::from(promise).await
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| js_get(err, "message").ok().and_then(|m| m.as_string()))
        .unwrap_or_else(|| format!("{:?}", err))
}

fn js_number(target: &JsValue, key: &str) -> Result<f32, XrError> {
    js_get(target, key)
        .ok()
        .and_then(|value| value.as_f64())
        .map(|value| value as f32)
        .ok_or_else(|| XrError::QueryFailed(format!("missing numeric `{}`", key)))
}

fn string_array(values: &[&str]) -> Array {
    values.iter().map(|value| JsValue::from_str(value)).collect()
}

/// Read an `XRPose`/`XRViewerPose` into a [`Pose`].
fn read_pose(pose: &JsValue) -> Result<Pose, XrError> {
    let transform = js_get(pose, "transform").map_err(|e| XrError::QueryFailed(describe(&e)))?;
    let position = js_get(&transform, "position").map_err(|e| XrError::QueryFailed(describe(&e)))?;
    let orientation =
        js_get(&transform, "orientation").map_err(|e| XrError::QueryFailed(describe(&e)))?;

    let position = Vec3::new(
        js_number(&position, "x")?,
        js_number(&position, "y")?,
        js_number(&position, "z")?,
    );
    let orientation = Quat::from_xyzw(
        js_number(&orientation, "x")?,
        js_number(&orientation, "y")?,
        js_number(&orientation, "z")?,
        js_number(&orientation, "w")?,
    );
    Ok(Pose::new(position, orientation.normalize()))
}

/// Running `XRSession`.
#[derive(Clone)]
pub struct WebXrSession {
    session: JsValue,
}

/// `XRReferenceSpace` with the kind it was requested as.
#[derive(Clone)]
pub struct WebXrSpace {
    kind: ReferenceSpaceKind,
    space: JsValue,
}

impl ReferenceSpace for WebXrSpace {
    fn kind(&self) -> ReferenceSpaceKind {
        self.kind
    }
}

/// `XRHitTestSource`.
pub struct WebXrSource {
    source: JsValue,
}

impl HitTestSource for WebXrSource {
    fn cancel(&self) {
        if let Err(err) = js_call(&self.source, "cancel", &[]) {
            warn!("[WebXr] hit-test source cancel failed: {}", describe(&err));
        }
    }
}

/// `XRFrame` valid for the duration of one animation-frame callback.
pub struct WebXrFrame {
    frame: JsValue,
}

/// `XRHitTestResult`.
pub struct WebXrHit {
    result: JsValue,
}

impl HitTestResult for WebXrHit {
    type Space = WebXrSpace;

    fn pose(&self, space: &WebXrSpace) -> Result<Option<Pose>, XrError> {
        let pose = js_call(&self.result, "getPose", &[&space.space])
            .map_err(|e| XrError::QueryFailed(describe(&e)))?;
        if pose.is_null() || pose.is_undefined() {
            return Ok(None);
        }
        read_pose(&pose).map(Some)
    }
}

impl XrFrameContext for WebXrFrame {
    type Space = WebXrSpace;
    type Source = WebXrSource;
    type Result = WebXrHit;

    fn hit_test_results(&self, source: &WebXrSource) -> Result<Vec<WebXrHit>, XrError> {
        let results = js_call(&self.frame, "getHitTestResults", &[&source.source])
            .map_err(|e| XrError::QueryFailed(describe(&e)))?;
        let results: Array = results
            .dyn_into()
            .map_err(|e| XrError::QueryFailed(describe(&e)))?;
        Ok(results.iter().map(|result| WebXrHit { result }).collect())
    }
}

impl XrSessionBackend for WebXrSession {
    type Space = WebXrSpace;
    type Source = WebXrSource;

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> impl Future<Output = Result<WebXrSpace, XrError>> {
        let session = self.session.clone();
        async move {
            let rejected = |err: JsValue| XrError::ReferenceSpaceRejected {
                kind,
                reason: describe(&err),
            };
            let promise = js_call(
                &session,
                "requestReferenceSpace",
                &[&JsValue::from_str(kind.as_str())],
            )
            .map_err(rejected)?;
            let space = js_await(promise).await.map_err(rejected)?;
            Ok(WebXrSpace { kind, space })
        }
    }

    fn request_hit_test_source(
        &self,
        space: &WebXrSpace,
    ) -> impl Future<Output = Result<WebXrSource, XrError>> {
        let session = self.session.clone();
        let kind = space.kind;
        let js_space = space.space.clone();
        async move {
            let rejected = |err: JsValue| XrError::HitTestSourceRejected {
                kind,
                reason: describe(&err),
            };
            let options = Object::new();
            Reflect::set(&options, &JsValue::from_str("space"), &js_space).map_err(rejected)?;
            let promise =
                js_call(&session, "requestHitTestSource", &[&options]).map_err(rejected)?;
            let source = js_await(promise).await.map_err(rejected)?;
            Ok(WebXrSource { source })
        }
    }
}

/// State shared between XR callbacks and Bevy systems.
struct XrShared {
    tracker: HitTestTracker<WebXrSource>,
    session: SessionSlot<WebXrSession>,
    world_space: Option<WebXrSpace>,
    requesting: bool,
    hit_test_order: Vec<ReferenceSpaceKind>,
    world_order: Vec<ReferenceSpaceKind>,
    latest_hit: Option<Pose>,
    latest_viewer: Option<Transform>,
    pending_selects: u32,
}

impl Default for XrShared {
    /// Orders start from the built-in defaults so a session requested while
    /// the settings asset is still loading can negotiate.
    fn default() -> Self {
        let settings = ArSettings::default();
        Self {
            tracker: HitTestTracker::default(),
            session: SessionSlot::default(),
            world_space: None,
            requesting: false,
            hit_test_order: settings.hit_test_reference_spaces,
            world_order: settings.world_reference_spaces,
            latest_hit: None,
            latest_viewer: None,
            pending_selects: 0,
        }
    }
}

impl XrShared {
    /// Close the session `epoch` refers to and release its hit-test source.
    /// Returns `false` when that session was already closed.
    fn close_session(&mut self, epoch: SessionEpoch) -> bool {
        if self.session.close(epoch).is_none() {
            return false;
        }
        self.tracker.on_session_end();
        self.world_space = None;
        self.latest_hit = None;
        self.latest_viewer = None;
        true
    }
}

type SharedXr = Rc<RefCell<XrShared>>;

/// Main-thread handle to the WebXR state.
#[derive(Default)]
pub struct WebXrDriver {
    shared: SharedXr,
}

pub struct WebXrPlugin;

impl Plugin for WebXrPlugin {
    fn build(&self, app: &mut App) {
        app.insert_non_send_resource(WebXrDriver::default())
            .add_systems(Startup, install_start_button)
            .add_systems(
                Update,
                (
                    sync_settings,
                    start_from_events,
                    end_from_events,
                    sync_webxr,
                    follow_viewer,
                )
                    .chain()
                    .in_set(ArFrameSet::Track),
            )
            .add_systems(Update, show_tracker_notices.after(ArFrameSet::Place));
    }
}

fn install_start_button(driver: NonSend<WebXrDriver>) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        error!("[WebXr] document not available");
        return;
    };
    let Some(button) = document.get_element_by_id(START_BUTTON_ID) else {
        warn!("[WebXr] no #{} button, sessions start over RPC only", START_BUTTON_ID);
        return;
    };

    let shared = driver.shared.clone();
    let on_click = Closure::wrap(Box::new(move || {
        // Runs inside the click handler so the request keeps user activation.
        if shared.borrow().session.is_open() {
            end_session(&shared);
        } else {
            request_session(&shared);
        }
    }) as Box<dyn FnMut()>);

    if let Err(err) =
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
    {
        error!("[WebXr] failed to attach start button: {}", describe(&err));
    }
    on_click.forget();
}

fn sync_settings(driver: NonSend<WebXrDriver>, settings: Res<ArSettings>) {
    if !settings.is_changed() {
        return;
    }
    let mut shared = driver.shared.borrow_mut();
    shared.hit_test_order = settings.hit_test_reference_spaces.clone();
    shared.world_order = settings.world_reference_spaces.clone();
}

fn start_from_events(mut starts: EventReader<SessionStartEvent>, driver: NonSend<WebXrDriver>) {
    if let Some(start) = starts.read().last() {
        if start.source == CommandSource::Rpc {
            warn!("[WebXr] session requested over RPC; browsers require a user gesture");
        }
        request_session(&driver.shared);
    }
}

fn end_from_events(mut ends: EventReader<SessionEndEvent>, driver: NonSend<WebXrDriver>) {
    if ends.read().last().is_some() {
        end_session(&driver.shared);
    }
}

fn sync_webxr(
    driver: NonSend<WebXrDriver>,
    mut status: ResMut<ArSessionStatus>,
    mut sample: ResMut<HitTestSample>,
    mut viewer_pose: ResMut<ViewerPose>,
    mut selects: EventWriter<SelectEvent>,
) {
    let mut shared = driver.shared.borrow_mut();

    let next = ArSessionStatus {
        running: shared.session.is_open(),
        tracker: shared.tracker.state(),
    };
    if *status != next {
        *status = next;
    }

    sample.pose = if next.running { shared.latest_hit } else { None };
    viewer_pose.transform = shared.latest_viewer;

    for _ in 0..std::mem::take(&mut shared.pending_selects) {
        selects.write(SelectEvent {
            source: CommandSource::Platform,
        });
    }
}

fn show_tracker_notices(mut changes: EventReader<SessionStateChanged>) {
    for change in changes.read() {
        if let Some(notice) = PageNotice::for_tracker_state(change.state) {
            notice.show();
        }
    }
}

/// Drive the Bevy camera from the device pose while a session runs.
fn follow_viewer(
    status: Res<ArSessionStatus>,
    viewer_pose: Res<ViewerPose>,
    mut cameras: Query<&mut Transform, With<ArViewer>>,
) {
    if !status.running {
        return;
    }
    let Some(viewer) = viewer_pose.transform else {
        return;
    };
    for mut transform in &mut cameras {
        *transform = viewer;
    }
}

fn request_session(shared: &SharedXr) {
    {
        let mut state = shared.borrow_mut();
        if state.session.is_open() || state.requesting {
            debug!("[WebXr] session already running or requested");
            return;
        }
        state.requesting = true;
    }

    let promise = match call_request_session() {
        Ok(promise) => promise,
        Err(err) => {
            error!("[WebXr] {}", err);
            PageNotice::for_session_error(&err).show();
            shared.borrow_mut().requesting = false;
            return;
        }
    };

    let shared = shared.clone();
    spawn_local(async move {
        let result = match js_await(promise).await {
            Ok(session) => begin_session(&shared, session).await,
            Err(err) => Err(XrError::SessionRequestFailed(describe(&err))),
        };
        if let Err(err) = result {
            error!("[WebXr] session setup failed: {}", err);
            PageNotice::for_session_error(&err).show();
        }
        shared.borrow_mut().requesting = false;
    });
}

/// Synchronous part of the request; must run inside the user gesture.
fn call_request_session() -> Result<JsValue, XrError> {
    let window = web_sys::window().ok_or_else(|| XrError::Unsupported("no window".into()))?;
    let xr = js_get(&window.navigator(), "xr")
        .ok()
        .filter(|xr| !xr.is_undefined() && !xr.is_null())
        .ok_or_else(|| XrError::Unsupported("navigator.xr is missing".into()))?;

    let init = Object::new();
    let set = |key: &str, value: &JsValue| {
        Reflect::set(&init, &JsValue::from_str(key), value)
            .map_err(|e| XrError::SessionRequestFailed(describe(&e)))
    };
    set("requiredFeatures", &string_array(REQUIRED_FEATURES))?;

    let optional = string_array(OPTIONAL_FEATURES);
    if let Some(body) = window
        .document()
        .and_then(|document| js_get(&document, "body").ok())
        .filter(|body| !body.is_undefined() && !body.is_null())
    {
        optional.push(&JsValue::from_str(DOM_OVERLAY_FEATURE));
        let overlay = Object::new();
        Reflect::set(&overlay, &JsValue::from_str("root"), &body)
            .map_err(|e| XrError::SessionRequestFailed(describe(&e)))?;
        set("domOverlay", &overlay)?;
    }
    set("optionalFeatures", &optional)?;

    js_call(
        &xr,
        "requestSession",
        &[&JsValue::from_str(SESSION_MODE), &init],
    )
    .map_err(|e| XrError::SessionRequestFailed(describe(&e)))
}

fn end_session(shared: &SharedXr) {
    let session = shared.borrow().session.get().cloned();
    let Some(session) = session else {
        debug!("[WebXr] end ignored, no session running");
        return;
    };
    // Cleanup happens in the session's `end` listener.
    if let Err(err) = js_call(&session.session, "end", &[]) {
        warn!("[WebXr] session.end() failed: {}", describe(&err));
    }
}

/// Set up a granted session. The session is stored before the first await so
/// the start button and the `end` listener can always reach it.
async fn begin_session(shared: &SharedXr, session: JsValue) -> Result<(), XrError> {
    let backend = WebXrSession {
        session: session.clone(),
    };
    let epoch = shared.borrow_mut().session.open(backend.clone());

    if let Err(err) = attach_base_layer(&session)
        .and_then(|()| attach_session_listeners(shared, &session, epoch))
    {
        abandon_session(shared, epoch, &session);
        return Err(err);
    }

    let (ticket, hit_test_order, world_order) = {
        let mut state = shared.borrow_mut();
        let ticket = state.tracker.begin();
        (ticket, state.hit_test_order.clone(), state.world_order.clone())
    };

    let world_space = request_world_space(&backend, &world_order).await;
    if !shared.borrow().session.is_current(epoch) {
        debug!("[WebXr] session ended during setup");
        return Ok(());
    }

    let world_space = match world_space {
        Ok(space) => space,
        Err(err) => {
            // No space to report poses in; the session stays up so the user
            // sees the notice and can end it.
            match ticket {
                Some(ticket) => {
                    shared.borrow_mut().tracker.complete(ticket, Err(err));
                }
                None => error!("[WebXr] {}", err),
            }
            return Ok(());
        }
    };
    info!("[WebXr] session started, poses in `{}` space", world_space.kind);
    shared.borrow_mut().world_space = Some(world_space);

    start_frame_loop(shared.clone(), session, epoch);

    if let Some(ticket) = ticket {
        let outcome = negotiate(&backend, &hit_test_order).await;
        // A stale ticket cancels the source if the session ended meanwhile.
        shared.borrow_mut().tracker.complete(ticket, outcome);
    }
    Ok(())
}

/// Drop a session whose setup failed and ask the platform to end it.
fn abandon_session(shared: &SharedXr, epoch: SessionEpoch, session: &JsValue) {
    shared.borrow_mut().close_session(epoch);
    if let Err(err) = js_call(session, "end", &[]) {
        warn!("[WebXr] session.end() failed: {}", describe(&err));
    }
}

async fn request_world_space(
    backend: &WebXrSession,
    order: &[ReferenceSpaceKind],
) -> Result<WebXrSpace, XrError> {
    for &kind in order {
        match backend.request_reference_space(kind).await {
            Ok(space) => return Ok(space),
            Err(err) => warn!("[WebXr] world space: {}", err),
        }
    }
    Err(XrError::Unsupported("no world reference space accepted".into()))
}

/// Frames are only delivered once the session has a base layer.
fn attach_base_layer(session: &JsValue) -> Result<(), XrError> {
    let fail = |e: JsValue| XrError::SessionRequestFailed(describe(&e));

    let window = web_sys::window().ok_or_else(|| XrError::Unsupported("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| XrError::Unsupported("no document".into()))?;
    let canvas = document.create_element("canvas").map_err(fail)?;

    let attributes = Object::new();
    Reflect::set(&attributes, &JsValue::from_str("xrCompatible"), &JsValue::TRUE).map_err(fail)?;
    Reflect::set(&attributes, &JsValue::from_str("alpha"), &JsValue::TRUE).map_err(fail)?;
    let gl = js_call(&canvas, "getContext", &[&JsValue::from_str("webgl2"), &attributes])
        .map_err(fail)?;
    if gl.is_null() {
        return Err(XrError::Unsupported("WebGL2 is not available".into()));
    }

    let layer_ctor: Function = js_get(&window, "XRWebGLLayer")
        .and_then(|ctor| ctor.dyn_into())
        .map_err(fail)?;
    let layer = Reflect::construct(&layer_ctor, &Array::of2(session, &gl)).map_err(fail)?;

    let render_state = Object::new();
    Reflect::set(&render_state, &JsValue::from_str("baseLayer"), &layer).map_err(fail)?;
    js_call(session, "updateRenderState", &[&render_state]).map_err(fail)?;
    Ok(())
}

fn attach_session_listeners(
    shared: &SharedXr,
    session: &JsValue,
    epoch: SessionEpoch,
) -> Result<(), XrError> {
    let fail = |e: JsValue| XrError::SessionRequestFailed(describe(&e));

    let on_select = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move || {
            shared.borrow_mut().pending_selects += 1;
        }) as Box<dyn FnMut()>)
    };
    let on_end = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move || {
            if shared.borrow_mut().close_session(epoch) {
                info!("[WebXr] session ended");
            }
        }) as Box<dyn FnMut()>)
    };

    js_call(
        session,
        "addEventListener",
        &[&JsValue::from_str("select"), on_select.as_ref()],
    )
    .map_err(fail)?;
    js_call(
        session,
        "addEventListener",
        &[&JsValue::from_str("end"), on_end.as_ref()],
    )
    .map_err(fail)?;

    on_select.forget();
    on_end.forget();
    Ok(())
}

type FrameCallback = Closure<dyn FnMut(f64, JsValue)>;

fn start_frame_loop(shared: SharedXr, session: JsValue, epoch: SessionEpoch) {
    let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();
    let loop_session = session.clone();

    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_time: f64, frame: JsValue| {
        if !on_xr_frame(&shared, epoch, frame) {
            return;
        }
        if let Some(cb) = next.borrow().as_ref() {
            request_frame(&loop_session, cb);
        }
    }) as Box<dyn FnMut(f64, JsValue)>));

    if let Some(cb) = callback.borrow().as_ref() {
        request_frame(&session, cb);
    }
}

fn request_frame(session: &JsValue, callback: &FrameCallback) {
    if let Err(err) = js_call(session, "requestAnimationFrame", &[callback.as_ref()]) {
        error!("[WebXr] requestAnimationFrame failed: {}", describe(&err));
    }
}

/// Per-frame tracking step. Returns `false` once the session is gone.
fn on_xr_frame(shared: &SharedXr, epoch: SessionEpoch, frame: JsValue) -> bool {
    let mut state = shared.borrow_mut();
    if !state.session.is_current(epoch) {
        return false;
    }
    let Some(world_space) = state.world_space.clone() else {
        return false;
    };

    state.latest_viewer = js_call(&frame, "getViewerPose", &[&world_space.space])
        .ok()
        .filter(|pose| !pose.is_null() && !pose.is_undefined())
        .and_then(|pose| read_pose(&pose).ok())
        .map(|pose| pose.to_transform());

    let frame = WebXrFrame { frame };
    state.latest_hit = state.tracker.query(&frame, &world_space);
    true
}
