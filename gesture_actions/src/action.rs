//! What a gesture can trigger.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::error::ActionError;

// ── parameter keys ────────────────────────────────────────────────────────

pub const APP_NAME:       &str = "app_name";
pub const BUNDLE_ID:      &str = "bundle_id";
pub const URL:            &str = "url";
pub const COMMAND:        &str = "command";
pub const CAPTURE_OUTPUT: &str = "capture_output";
pub const SHORTCUT_NAME:  &str = "shortcut_name";

// ════════════════════════════════════════════════════════════════════════════
// ActionKind
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    OpenApp,
    OpenUrl,
    ShellCommand,
    RunShortcut,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::OpenApp,
        ActionKind::OpenUrl,
        ActionKind::ShellCommand,
        ActionKind::RunShortcut,
    ];

    /// Configuration-file tag.
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::OpenApp      => "open_app",
            ActionKind::OpenUrl      => "open_url",
            ActionKind::ShellCommand => "shell_command",
            ActionKind::RunShortcut  => "run_shortcut",
        }
    }

    /// The parameter that names this kind's target.
    pub fn primary_key(self) -> &'static str {
        match self {
            ActionKind::OpenApp      => APP_NAME,
            ActionKind::OpenUrl      => URL,
            ActionKind::ShellCommand => COMMAND,
            ActionKind::RunShortcut  => SHORTCUT_NAME,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown action type `{0}`")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL.iter()
            .copied()
            .find(|k| k.tag() == s)
            .ok_or_else(|| UnknownActionKind(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ActionConfiguration
// ════════════════════════════════════════════════════════════════════════════

/// One configured action. Parameter keys are interpreted per [`ActionKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct ActionConfiguration {
    pub id:         Uuid,
    pub name:       String,
    pub kind:       ActionKind,
    pub parameters: BTreeMap<String, String>,
    pub enabled:    bool,
}

impl ActionConfiguration {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        ActionConfiguration {
            id:         Uuid::new_v4(),
            name:       name.into(),
            kind,
            parameters: BTreeMap::new(),
            enabled:    true,
        }
    }

    pub fn open_app(name: impl Into<String>, app_name: &str, bundle_id: Option<&str>) -> Self {
        let action = ActionConfiguration::new(name, ActionKind::OpenApp).with_parameter(APP_NAME, app_name);
        match bundle_id {
            Some(b) => action.with_parameter(BUNDLE_ID, b),
            None    => action,
        }
    }

    pub fn open_url(name: impl Into<String>, url: &str) -> Self {
        ActionConfiguration::new(name, ActionKind::OpenUrl).with_parameter(URL, url)
    }

    pub fn shell_command(name: impl Into<String>, command: &str, capture_output: bool) -> Self {
        let action = ActionConfiguration::new(name, ActionKind::ShellCommand).with_parameter(COMMAND, command);
        if capture_output { action.with_parameter(CAPTURE_OUTPUT, "true") } else { action }
    }

    pub fn run_shortcut(name: impl Into<String>, shortcut: &str) -> Self {
        ActionConfiguration::new(name, ActionKind::RunShortcut).with_parameter(SHORTCUT_NAME, shortcut)
    }

    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// A non-empty parameter value.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// What the action acts on: app (or bundle id), URL, command or shortcut.
    pub fn target(&self) -> Option<&str> {
        match self.kind {
            ActionKind::OpenApp => self.parameter(APP_NAME).or_else(|| self.parameter(BUNDLE_ID)),
            kind                => self.parameter(kind.primary_key()),
        }
    }

    pub fn capture_output(&self) -> bool {
        self.parameter(CAPTURE_OUTPUT).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Check the kind's required parameter is present.
    pub fn validate(&self) -> Result<(), ActionError> {
        match self.target() {
            Some(_) => Ok(()),
            None    => Err(ActionError::MissingParameter { action: self.kind, key: self.kind.primary_key() }),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_back() {
        for k in ActionKind::ALL {
            assert_eq!(k.tag().parse::<ActionKind>(), Ok(k));
        }
        assert!("launch_rocket".parse::<ActionKind>().is_err());
    }

    #[test]
    fn open_app_accepts_bundle_id_alone() {
        let a = ActionConfiguration::new("Terminal", ActionKind::OpenApp)
            .with_parameter(BUNDLE_ID, "com.apple.Terminal");
        assert_eq!(a.target(), Some("com.apple.Terminal"));
        assert!(a.validate().is_ok());
    }

    #[test]
    fn blank_parameter_is_missing() {
        let a = ActionConfiguration::open_url("Nowhere", "  ");
        match a.validate() {
            Err(ActionError::MissingParameter { action, key }) => {
                assert_eq!(action, ActionKind::OpenUrl);
                assert_eq!(key, URL);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn capture_output_flag() {
        assert!(ActionConfiguration::shell_command("ls", "ls -la", true).capture_output());
        assert!(!ActionConfiguration::shell_command("ls", "ls -la", false).capture_output());
    }

    #[test]
    fn ids_are_unique() {
        let a = ActionConfiguration::open_url("a", "https://example.com");
        let b = ActionConfiguration::open_url("a", "https://example.com");
        assert_ne!(a.id, b.id);
    }
}
