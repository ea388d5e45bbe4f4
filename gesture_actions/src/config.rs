//! The JSON configuration document: energy settings plus mapping records.
//!
//! Records are validated one at a time. A bad record lands in
//! [`LoadedConfig::rejected`] and never stops the rest from loading.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use gesture_window::{EnergyMode, GestureType};

use crate::action::{self, ActionConfiguration, ActionKind};
use crate::error::{ConfigError, Result};
use crate::mapping::{GestureActionMapping, MappingRegistry, DEFAULT_MIN_CONFIDENCE};

// ════════════════════════════════════════════════════════════════════════════
// Document schema
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub version:          String,
    #[serde(default)]
    pub description:      String,
    #[serde(default)]
    pub instructions:     Vec<String>,
    #[serde(default)]
    pub energy_settings:  Option<EnergySettings>,
    /// Kept as raw values so one malformed record cannot fail the document.
    #[serde(default)]
    pub gesture_mappings: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_mode:              Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_advanced_patterns: Option<bool>,
}

/// One mapping record. `enabled`, `minimum_confidence` and `capture_output`
/// accept either a JSON scalar or its string form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gesture_id:         Option<String>,
    /// Display name, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gesture:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:               Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled:            Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_confidence: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name:           Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id:          Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url:                Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command:            Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_output:     Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut_name:      Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Loading
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub mappings:          Vec<GestureActionMapping>,
    /// Record index and why it was rejected.
    pub rejected:          Vec<(usize, ConfigError)>,
    pub energy_mode:       EnergyMode,
    /// `enable_advanced_patterns`, when the document sets it.
    pub advanced_override: Option<bool>,
}

impl LoadedConfig {
    pub fn registry(&self) -> MappingRegistry {
        let mut reg = MappingRegistry::new();
        reg.extend(self.mappings.iter().cloned());
        reg
    }
}

pub fn parse_document(text: &str) -> Result<LoadedConfig> {
    let doc: ConfigDocument = serde_json::from_str(text)?;
    Ok(load_document(&doc))
}

pub fn load_document(doc: &ConfigDocument) -> LoadedConfig {
    let mut loaded = LoadedConfig::default();

    if let Some(settings) = &doc.energy_settings {
        if let Some(tag) = &settings.energy_mode {
            loaded.energy_mode = tag.parse().unwrap_or_else(|e| {
                warn!("{e}; using balanced");
                EnergyMode::Balanced
            });
        }
        loaded.advanced_override = settings.enable_advanced_patterns;
    }

    for (index, raw) in doc.gesture_mappings.iter().enumerate() {
        let parsed = serde_json::from_value::<MappingRecord>(raw.clone())
            .map_err(ConfigError::from)
            .and_then(|r| mapping_from_record(&r));
        match parsed {
            Ok(m)  => loaded.mappings.push(m),
            Err(e) => {
                warn!("mapping record {index} rejected: {e}");
                loaded.rejected.push((index, e));
            }
        }
    }

    info!(
        "loaded {} mapping(s), {} rejected, energy mode {}",
        loaded.mappings.len(), loaded.rejected.len(), loaded.energy_mode,
    );
    loaded
}

pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedConfig> {
    let text = fs::read_to_string(path)?;
    parse_document(&text)
}

/// Load `path`, first writing the default document there if it is missing.
pub fn load_or_create(path: impl AsRef<Path>) -> Result<LoadedConfig> {
    let path = path.as_ref();
    if !path.exists() {
        write_default(path)?;
        info!("created default configuration at {}", path.display());
    }
    load_file(path)
}

pub fn write_default(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, serde_json::to_string_pretty(&default_document())?)?;
    Ok(())
}

// ── record → mapping ──────────────────────────────────────────────────────

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    value.as_deref().ok_or(ConfigError::MissingField(field))
}

fn invalid(field: &'static str, value: &Value) -> ConfigError {
    ConfigError::InvalidField { field, value: value.to_string() }
}

fn flag(field: &'static str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b)   => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true"  => Ok(true),
            "false" => Ok(false),
            _       => Err(invalid(field, value)),
        },
        _ => Err(invalid(field, value)),
    }
}

fn number(field: &'static str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(field, value)),
        Value::String(s) => s.trim().parse().map_err(|_| invalid(field, value)),
        _                => Err(invalid(field, value)),
    }
}

pub fn mapping_from_record(record: &MappingRecord) -> Result<GestureActionMapping> {
    let gesture_id = required("gesture_id", &record.gesture_id)?;
    let name       = required("name", &record.name)?;
    let kind_tag   = required("action_type", &record.action_type)?;

    let gesture: GestureType = gesture_id.parse()
        .map_err(|_| ConfigError::UnknownGesture(gesture_id.to_string()))?;
    let kind: ActionKind = kind_tag.parse()
        .map_err(|_| ConfigError::UnknownActionKind(kind_tag.to_string()))?;

    let enabled = match &record.enabled {
        Some(v) => flag("enabled", v)?,
        None    => true,
    };
    let min_confidence = match &record.minimum_confidence {
        Some(v) => number("minimum_confidence", v)?,
        None    => DEFAULT_MIN_CONFIDENCE,
    };
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(ConfigError::InvalidField {
            field: "minimum_confidence",
            value: min_confidence.to_string(),
        });
    }

    let mut action = ActionConfiguration::new(name, kind);
    // Only the keys the kind understands are carried over.
    let params: Vec<(&str, &Option<String>)> = match kind {
        ActionKind::OpenApp      => vec![(action::APP_NAME, &record.app_name), (action::BUNDLE_ID, &record.bundle_id)],
        ActionKind::OpenUrl      => vec![(action::URL, &record.url)],
        ActionKind::ShellCommand => vec![(action::COMMAND, &record.command)],
        ActionKind::RunShortcut  => vec![(action::SHORTCUT_NAME, &record.shortcut_name)],
    };
    for (key, value) in params {
        if let Some(v) = value {
            action = action.with_parameter(key, v);
        }
    }
    if kind == ActionKind::ShellCommand {
        if let Some(v) = &record.capture_output {
            if flag("capture_output", v)? {
                action = action.with_parameter(action::CAPTURE_OUTPUT, "true");
            }
        }
    }

    Ok(GestureActionMapping::new(gesture, action)
        .with_min_confidence(min_confidence)
        .with_enabled(enabled))
}

// ════════════════════════════════════════════════════════════════════════════
// Default document
// ════════════════════════════════════════════════════════════════════════════

fn example(gesture: GestureType, name: &str, kind: ActionKind, params: &[(&str, &str)]) -> MappingRecord {
    let mut r = MappingRecord {
        gesture_id:         Some(gesture.id().to_string()),
        gesture:            Some(gesture.display_name().to_string()),
        name:               Some(name.to_string()),
        action_type:        Some(kind.tag().to_string()),
        enabled:            Some(Value::String("false".into())),
        minimum_confidence: Some(Value::String(DEFAULT_MIN_CONFIDENCE.to_string())),
        ..MappingRecord::default()
    };
    for (key, value) in params {
        let slot = match *key {
            action::APP_NAME      => &mut r.app_name,
            action::BUNDLE_ID     => &mut r.bundle_id,
            action::URL           => &mut r.url,
            action::COMMAND       => &mut r.command,
            action::SHORTCUT_NAME => &mut r.shortcut_name,
            _                     => continue,
        };
        *slot = Some(value.to_string());
    }
    r
}

/// The starter document: every detectable gesture with a disabled example.
pub fn default_document() -> ConfigDocument {
    use ActionKind::*;
    use GestureType::*;

    let records = [
        example(Fist,           "Take Screenshot",   ShellCommand, &[(action::COMMAND, "screencapture ~/Desktop/screenshot.png")]),
        example(OpenHand,       "Open Finder",       OpenApp,      &[(action::APP_NAME, "Finder")]),
        example(PointingFinger, "Open Terminal",     OpenApp,      &[(action::APP_NAME, "Terminal"), (action::BUNDLE_ID, "com.apple.Terminal")]),
        example(ThumbsUp,       "List Directory",    ShellCommand, &[(action::COMMAND, "ls -la")]),
        example(PeaceSign,      "Open Website",      OpenUrl,      &[(action::URL, "https://www.apple.com")]),
        example(ThreeFingers,   "Open Search",       OpenUrl,      &[(action::URL, "https://www.google.com")]),
        example(FourFingers,    "Open Calendar",     OpenApp,      &[(action::APP_NAME, "Calendar")]),
        example(SwipeLeft,      "Previous Desktop",  ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"System Events\" to key code 123 using {control down}'")]),
        example(SwipeRight,     "Next Desktop",      ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"System Events\" to key code 124 using {control down}'")]),
        example(SwipeUp,        "Mission Control",   ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"System Events\" to key code 126 using {control down}'")]),
        example(SwipeDown,      "Show Desktop",      ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"System Events\" to key code 103'")]),
        example(Wave,           "Say Hello",         ShellCommand, &[(action::COMMAND, "say 'Hello'")]),
        example(OkSign,         "Run My Shortcut",   RunShortcut,  &[(action::SHORTCUT_NAME, "My Shortcut")]),
        example(Pinch,          "Open Safari",       OpenApp,      &[(action::APP_NAME, "Safari"), (action::BUNDLE_ID, "com.apple.Safari")]),
        example(Grab,           "Minimize Window",   ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"System Events\" to keystroke \"m\" using {command down}'")]),
        example(Release,        "Show Notifications", ShellCommand, &[(action::COMMAND, "open -a 'Notification Center'")]),
        example(TwoHandClap,    "Play/Pause Music",  ShellCommand, &[(action::COMMAND, "osascript -e 'tell application \"Music\" to playpause'")]),
        example(SequencePeaceFistPeace, "Lock Screen", ShellCommand, &[(action::COMMAND, "pmset displaysleepnow")]),
    ];

    ConfigDocument {
        version:      "1.0".into(),
        description:  "Gesture control configuration".into(),
        instructions: vec![
            "Edit this file to configure gesture-to-action mappings and energy settings".into(),
            "Available action types: open_app, open_url, shell_command, run_shortcut".into(),
            "Energy modes: high_performance (all features), balanced (default), energy_saver (minimal features)".into(),
            "Set enabled to \"true\" to activate a mapping".into(),
            "Minimum confidence range: 0.1 to 1.0".into(),
            "For open_app actions, bundle_id may be given alongside or instead of app_name".into(),
        ],
        energy_settings: Some(EnergySettings {
            energy_mode:              Some(EnergyMode::Balanced.tag().into()),
            enable_advanced_patterns: Some(false),
        }),
        gesture_mappings: records.iter()
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(records: Value) -> String {
        json!({
            "version": "1.0",
            "energy_settings": { "energy_mode": "high_performance" },
            "gesture_mappings": records,
        }).to_string()
    }

    #[test]
    fn string_and_native_scalars_both_load() {
        let text = doc(json!([
            { "gesture_id": "peaceSign", "name": "site", "action_type": "open_url",
              "url": "https://example.com", "enabled": "true", "minimum_confidence": "0.8" },
            { "gesture_id": "fist", "name": "ls", "action_type": "shell_command",
              "command": "ls", "enabled": true, "minimum_confidence": 0.6, "capture_output": "true" },
        ]));
        let loaded = parse_document(&text).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.mappings.len(), 2);
        assert_eq!(loaded.mappings[0].gesture, GestureType::PeaceSign);
        assert_eq!(loaded.mappings[0].min_confidence, 0.8);
        assert!(loaded.mappings[1].action.capture_output());
        assert_eq!(loaded.energy_mode, EnergyMode::HighPerformance);
    }

    #[test]
    fn bad_records_are_skipped_individually() {
        let text = doc(json!([
            { "gesture_id": "moonwalk", "name": "x", "action_type": "open_url", "url": "u" },
            { "gesture_id": "fist", "name": "x", "action_type": "teleport" },
            { "gesture_id": "fist", "name": "x", "action_type": "open_url", "enabled": "maybe" },
            { "gesture_id": "fist", "name": "x", "action_type": "open_url", "minimum_confidence": "high" },
            { "name": "no gesture", "action_type": "open_url" },
            "not even an object",
            { "gesture_id": "wave", "name": "ok", "action_type": "open_url", "url": "https://example.com" },
        ]));
        let loaded = parse_document(&text).unwrap();
        assert_eq!(loaded.mappings.len(), 1);
        assert_eq!(loaded.mappings[0].gesture, GestureType::Wave);
        assert_eq!(loaded.mappings[0].min_confidence, DEFAULT_MIN_CONFIDENCE);

        let kinds: Vec<_> = loaded.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(kinds, vec![0, 1, 2, 3, 4, 5]);
        assert!(matches!(loaded.rejected[0].1, ConfigError::UnknownGesture(_)));
        assert!(matches!(loaded.rejected[1].1, ConfigError::UnknownActionKind(_)));
        assert!(matches!(loaded.rejected[2].1, ConfigError::InvalidField { field: "enabled", .. }));
        assert!(matches!(loaded.rejected[3].1, ConfigError::InvalidField { field: "minimum_confidence", .. }));
        assert!(matches!(loaded.rejected[4].1, ConfigError::MissingField("gesture_id")));
        assert!(matches!(loaded.rejected[5].1, ConfigError::Json(_)));
    }

    #[test]
    fn disabled_records_load_disabled() {
        let text = doc(json!([
            { "gesture_id": "fist", "name": "x", "action_type": "shell_command",
              "command": "true", "enabled": "false" },
        ]));
        let loaded = parse_document(&text).unwrap();
        assert_eq!(loaded.mappings.len(), 1);
        assert!(!loaded.mappings[0].enabled);
    }

    #[test]
    fn unknown_energy_mode_falls_back() {
        let text = json!({ "energy_settings": { "energy_mode": "turbo", "enable_advanced_patterns": true } }).to_string();
        let loaded = parse_document(&text).unwrap();
        assert_eq!(loaded.energy_mode, EnergyMode::Balanced);
        assert_eq!(loaded.advanced_override, Some(true));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(parse_document("{ nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn default_document_loads_every_record_disabled() {
        let text = serde_json::to_string(&default_document()).unwrap();
        let loaded = parse_document(&text).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_eq!(loaded.mappings.len(), GestureType::ALL.len() - 1);
        assert!(loaded.mappings.iter().all(|m| !m.enabled));
        assert!(loaded.mappings.iter().all(|m| m.action.validate().is_ok()));
        assert!(!loaded.mappings.iter().any(|m| m.gesture == GestureType::TwoHandHeart));
    }

    #[test]
    fn load_or_create_writes_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gestures.json");
        let loaded = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(loaded.energy_mode, EnergyMode::Balanced);
        assert_eq!(loaded.advanced_override, Some(false));
        assert!(!loaded.mappings.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_file(dir.path().join("absent.json")), Err(ConfigError::Io(_))));
    }
}
