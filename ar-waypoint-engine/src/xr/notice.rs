//! User-facing notices for XR failures.
//!
//! A blocker covers the page and stays; a toast sits at the bottom and goes
//! away after [`TOAST_DURATION_MS`]. Both are plain `div`s appended to
//! `<body>`, which is also the dom-overlay root, so they show inside the AR
//! session too. Styling lives in `index.html` (`.ar-blocker`, `.ar-toast`).

use constants::xr::{HIT_TEST_UNAVAILABLE_MESSAGE, XR_UNSUPPORTED_MESSAGE};
#[cfg(target_arch = "wasm32")]
use constants::xr::TOAST_DURATION_MS;

use super::{TrackerState, XrError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNotice {
    Blocker(String),
    Toast(String),
}

impl PageNotice {
    /// Notice for a session request or setup failure.
    pub fn for_session_error(err: &XrError) -> Self {
        match err {
            XrError::Unsupported(reason) => {
                Self::Blocker(format!("{}\n{}", XR_UNSUPPORTED_MESSAGE, reason))
            }
            other => Self::Toast(format!("Could not start AR: {}", other)),
        }
    }

    /// Notice for the tracker entering `state`, if any.
    pub fn for_tracker_state(state: TrackerState) -> Option<Self> {
        (state == TrackerState::Unavailable)
            .then(|| Self::Toast(HIT_TEST_UNAVAILABLE_MESSAGE.to_string()))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Blocker(message) | Self::Toast(message) => message,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Blocker(_) => "ar-blocker",
            Self::Toast(_) => "ar-toast",
        }
    }

    /// Append the notice to the page. Failures are only logged.
    #[cfg(target_arch = "wasm32")]
    pub fn show(&self) {
        if let Err(err) = self.append_to_page() {
            bevy::log::warn!("[Notice] could not show `{}`: {:?}", self.message(), err);
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn append_to_page(&self) -> Result<(), wasm_bindgen::JsValue> {
        use wasm_bindgen::{JsCast, JsValue, closure::Closure};

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;

        let element = document.create_element("div")?;
        element.set_class_name(self.class_name());
        element.set_text_content(Some(self.message()));
        body.append_child(&element)?;

        if let Self::Toast(_) = self {
            let remove = Closure::once_into_js(move || element.remove());
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                remove.unchecked_ref(),
                TOAST_DURATION_MS,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::ReferenceSpaceKind;

    #[test]
    fn missing_webxr_blocks_the_page() {
        let notice = PageNotice::for_session_error(&XrError::Unsupported(
            "navigator.xr is missing".into(),
        ));
        assert_eq!(notice.class_name(), "ar-blocker");
        assert!(notice.message().starts_with(XR_UNSUPPORTED_MESSAGE));
        assert!(notice.message().contains("navigator.xr"));
    }

    #[test]
    fn refused_request_is_a_toast() {
        let notice =
            PageNotice::for_session_error(&XrError::SessionRequestFailed("NotAllowedError".into()));
        assert_eq!(notice.class_name(), "ar-toast");
        assert!(notice.message().contains("NotAllowedError"));
    }

    #[test]
    fn only_unavailable_tracker_raises_a_notice() {
        assert_eq!(
            PageNotice::for_tracker_state(TrackerState::Unavailable),
            Some(PageNotice::Toast(HIT_TEST_UNAVAILABLE_MESSAGE.to_string()))
        );
        assert_eq!(
            PageNotice::for_tracker_state(TrackerState::Active(ReferenceSpaceKind::Viewer)),
            None
        );
        assert_eq!(PageNotice::for_tracker_state(TrackerState::Ended), None);
    }
}
