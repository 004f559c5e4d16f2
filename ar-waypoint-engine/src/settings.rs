use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::xr::{HIT_TEST_REFERENCE_SPACES, WORLD_REFERENCE_SPACES};

use crate::markers::MarkerStyle;
use crate::navigation::PathShape;
use crate::xr::{ReferenceSpaceKind, deserialize_kind_list};
use crate::xr::simulated::SimulatedXrConfig;

/// Runtime settings loaded from `assets/ar_settings.json`.
///
/// Every field is optional in the file; missing fields keep the defaults from
/// the `constants` crate.
#[derive(Asset, TypePath, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArSettings {
    /// Negotiation order for the hit-test source.
    #[serde(deserialize_with = "deserialize_kind_list")]
    pub hit_test_reference_spaces: Vec<ReferenceSpaceKind>,
    /// Order tried for the space poses are reported in (WebXR only).
    #[serde(deserialize_with = "deserialize_kind_list")]
    pub world_reference_spaces: Vec<ReferenceSpaceKind>,
    /// Replace the placed path on every select. When false only the first
    /// select places markers.
    pub allow_replace: bool,
    pub path: PathShape,
    pub marker: MarkerStyle,
    pub simulated: SimulatedXrConfig,
}

impl Default for ArSettings {
    fn default() -> Self {
        Self {
            hit_test_reference_spaces: ReferenceSpaceKind::parse_list(HIT_TEST_REFERENCE_SPACES),
            world_reference_spaces: ReferenceSpaceKind::parse_list(WORLD_REFERENCE_SPACES),
            allow_replace: true,
            path: PathShape::default(),
            marker: MarkerStyle::default(),
            simulated: SimulatedXrConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings: ArSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ArSettings::default());
        assert_eq!(
            settings.hit_test_reference_spaces,
            ReferenceSpaceKind::PREFERENCE.to_vec()
        );
    }

    #[test]
    fn default_orders_allow_negotiation_before_loading() {
        let settings = ArSettings::default();
        assert_eq!(
            settings.world_reference_spaces,
            vec![ReferenceSpaceKind::LocalFloor, ReferenceSpaceKind::Local]
        );
        assert!(!settings.hit_test_reference_spaces.is_empty());
    }

    #[test]
    fn partial_nested_fields_keep_remaining_defaults() {
        let json = r#"{
            "allow_replace": false,
            "path": { "side_step": 1.0 },
            "marker": { "scale": 2.0 },
            "hit_test_reference_spaces": ["local-floor"]
        }"#;
        let settings: ArSettings = serde_json::from_str(json).unwrap();

        assert!(!settings.allow_replace);
        assert_eq!(settings.path.side_step, 1.0);
        assert_eq!(settings.path.first_leg, PathShape::default().first_leg);
        assert_eq!(settings.marker.scale, 2.0);
        assert_eq!(settings.marker.ring_color, MarkerStyle::default().ring_color);
        assert_eq!(
            settings.hit_test_reference_spaces,
            vec![ReferenceSpaceKind::LocalFloor]
        );
    }

    #[test]
    fn unknown_reference_space_keeps_other_overrides() {
        let json = r#"{
            "allow_replace": false,
            "hit_test_reference_spaces": ["unbounded", "local-floor"],
            "world_reference_spaces": ["bounded-floor"],
            "simulated": { "supported_reference_spaces": ["viewer", "unbounded"] }
        }"#;
        let settings: ArSettings = serde_json::from_str(json).unwrap();

        assert!(!settings.allow_replace);
        assert_eq!(
            settings.hit_test_reference_spaces,
            vec![ReferenceSpaceKind::LocalFloor]
        );
        assert!(settings.world_reference_spaces.is_empty());
        assert_eq!(
            settings.simulated.supported_reference_spaces,
            vec![ReferenceSpaceKind::Viewer]
        );
    }

    #[test]
    fn simulated_capabilities_are_configurable() {
        let json = r#"{ "simulated": { "supported_reference_spaces": ["local"], "hit_test_supported": false } }"#;
        let settings: ArSettings = serde_json::from_str(json).unwrap();

        assert_eq!(
            settings.simulated.supported_reference_spaces,
            vec![ReferenceSpaceKind::Local]
        );
        assert!(!settings.simulated.hit_test_supported);
        assert_eq!(settings.simulated.max_hit_distance, SimulatedXrConfig::default().max_hit_distance);
    }
}
