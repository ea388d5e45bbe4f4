//! Service tunables.

use std::time::Duration;

use gesture_actions::{LoadedConfig, DEFAULT_DEBOUNCE};
use gesture_window::{ClassifierConfig, EnergyMode};
use hand_pose::MIN_JOINT_CONFIDENCE;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Minimum spacing between action batches of one gesture type.
    pub debounce:             Duration,
    /// Collected gestures older than this are pruned.
    pub retention:            Duration,
    /// A gesture type is active while its last event is this recent.
    pub active_window:        Duration,
    /// Event-record log cap.
    pub log_cap:              usize,
    /// Collected-gesture list cap.
    pub collected_cap:        usize,
    pub min_joint_confidence: f64,
    pub energy_mode:          EnergyMode,
    pub advanced_override:    Option<bool>,
    pub classifier:           ClassifierConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            debounce:             DEFAULT_DEBOUNCE,
            retention:            Duration::from_secs(30),
            active_window:        Duration::from_secs(5),
            log_cap:              100,
            collected_cap:        100,
            min_joint_confidence: MIN_JOINT_CONFIDENCE,
            energy_mode:          EnergyMode::Balanced,
            advanced_override:    None,
            classifier:           ClassifierConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Take the energy settings of a loaded configuration document.
    pub fn with_loaded(mut self, loaded: &LoadedConfig) -> Self {
        self.energy_mode = loaded.energy_mode;
        self.advanced_override = loaded.advanced_override;
        self
    }

    /// Select a mode; drops any advanced-pattern override.
    pub fn with_energy_mode(mut self, mode: EnergyMode) -> Self {
        self.energy_mode = mode;
        self.advanced_override = None;
        self
    }
}
