//! Settings loading for the `Loading` app state.
//!
//! The settings asset is requested at startup. Once it is loaded, or fails to
//! load, the app moves to `Running` with whatever settings are in place.

/// Settings asset request and load-state monitoring.
pub mod settings_loader;
