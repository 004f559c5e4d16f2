/// Hit-test reference spaces tried in order until one is accepted.
pub const HIT_TEST_REFERENCE_SPACES: &[&str] = &["viewer", "local", "local-floor"];

/// Reference spaces tried in order for expressing world poses.
pub const WORLD_REFERENCE_SPACES: &[&str] = &["local-floor", "local"];

pub const SESSION_MODE: &str = "immersive-ar";
pub const REQUIRED_FEATURES: &[&str] = &["hit-test"];
pub const OPTIONAL_FEATURES: &[&str] = &["local-floor"];

/// Requested only when the page has a `<body>` to use as the overlay root
pub const DOM_OVERLAY_FEATURE: &str = "dom-overlay";

/// DOM id of the page button that starts the AR session
pub const START_BUTTON_ID: &str = "start-ar";

/// Shown when no reference space yields a hit-test source
pub const HIT_TEST_UNAVAILABLE_MESSAGE: &str = "Surface detection is not supported on this device.";

/// Shown when the browser cannot run an immersive AR session
pub const XR_UNSUPPORTED_MESSAGE: &str = "AR is not supported in this browser.";

/// How long a toast stays on the page
pub const TOAST_DURATION_MS: i32 = 2500;

/// Floor plane height used by the simulated backend
pub const SIMULATED_FLOOR_HEIGHT: f32 = 0.0;

/// Furthest hit the simulated backend reports (metres)
pub const SIMULATED_MAX_HIT_DISTANCE: f32 = 10.0;

/// Settings asset path relative to the asset root
pub const SETTINGS_PATH: &str = "ar_settings.json";
