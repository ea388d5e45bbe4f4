//! The gesture → action table.

use log::info;
use uuid::Uuid;

use gesture_window::{GestureEvent, GestureType};

use crate::action::ActionConfiguration;

/// Default per-mapping confidence floor.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

// ════════════════════════════════════════════════════════════════════════════
// GestureActionMapping
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct GestureActionMapping {
    pub id:             Uuid,
    pub gesture:        GestureType,
    pub action:         ActionConfiguration,
    /// Events below this confidence never fire the mapping.
    pub min_confidence: f64,
    pub enabled:        bool,
}

impl GestureActionMapping {
    pub fn new(gesture: GestureType, action: ActionConfiguration) -> Self {
        GestureActionMapping {
            id: Uuid::new_v4(),
            gesture,
            action,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            enabled: true,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled, same gesture, and confident enough. The action's own
    /// enabled flag is the dispatcher's concern.
    pub fn matches(&self, event: &GestureEvent) -> bool {
        self.enabled && self.gesture == event.kind && self.min_confidence <= event.confidence
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingRegistry
// ════════════════════════════════════════════════════════════════════════════

/// Ordered list of mappings. Duplicates for one gesture are allowed and all fire.
#[derive(Clone, Debug, Default)]
pub struct MappingRegistry {
    mappings: Vec<GestureActionMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self { MappingRegistry::default() }

    /// Peace → website, pointing → terminal, thumbs-up → directory listing.
    pub fn with_defaults() -> Self {
        let mut reg = MappingRegistry::new();
        reg.add(GestureActionMapping::new(
            GestureType::PeaceSign,
            ActionConfiguration::open_url("Open Apple Website", "https://www.apple.com"),
        ));
        reg.add(GestureActionMapping::new(
            GestureType::PointingFinger,
            ActionConfiguration::open_app("Open Terminal", "Terminal", Some("com.apple.Terminal")),
        ));
        reg.add(GestureActionMapping::new(
            GestureType::ThumbsUp,
            ActionConfiguration::shell_command("List Directory", "ls -la", true),
        ));
        reg
    }

    pub fn add(&mut self, mapping: GestureActionMapping) -> Uuid {
        info!("mapping added: {} → {} ({})", mapping.gesture, mapping.action.name, mapping.action.kind);
        let id = mapping.id;
        self.mappings.push(mapping);
        id
    }

    /// Remove by id; `None` if unknown.
    pub fn remove(&mut self, id: Uuid) -> Option<GestureActionMapping> {
        let pos = self.mappings.iter().position(|m| m.id == id)?;
        let removed = self.mappings.remove(pos);
        info!("mapping removed: {} → {}", removed.gesture, removed.action.name);
        Some(removed)
    }

    /// Replace the mapping with the same id, keeping its position.
    pub fn update(&mut self, mapping: GestureActionMapping) -> bool {
        match self.mappings.iter_mut().find(|m| m.id == mapping.id) {
            Some(slot) => {
                info!("mapping updated: {} → {}", mapping.gesture, mapping.action.name);
                *slot = mapping;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        info!("all mappings cleared ({})", self.mappings.len());
        self.mappings.clear();
    }

    pub fn get(&self, id: Uuid) -> Option<&GestureActionMapping> {
        self.mappings.iter().find(|m| m.id == id)
    }

    pub fn mappings_for(&self, gesture: GestureType) -> impl Iterator<Item = &GestureActionMapping> {
        self.mappings.iter().filter(move |m| m.gesture == gesture)
    }

    /// Enabled mappings whose gesture and confidence floor accept `event`.
    pub fn matching<'a>(&'a self, event: &'a GestureEvent) -> impl Iterator<Item = &'a GestureActionMapping> {
        self.mappings.iter().filter(move |m| m.matches(event))
    }

    pub fn all(&self)      -> &[GestureActionMapping] { &self.mappings }
    pub fn len(&self)      -> usize { self.mappings.len() }
    pub fn is_empty(&self) -> bool  { self.mappings.is_empty() }

    // ── shorthands ───────────────────────────────────────────────────────

    pub fn map_to_open_app(&mut self, gesture: GestureType, name: &str, app_name: &str, min_confidence: f64) -> Uuid {
        let action = ActionConfiguration::open_app(name, app_name, None);
        self.add(GestureActionMapping::new(gesture, action).with_min_confidence(min_confidence))
    }

    pub fn map_to_open_url(&mut self, gesture: GestureType, name: &str, url: &str, min_confidence: f64) -> Uuid {
        let action = ActionConfiguration::open_url(name, url);
        self.add(GestureActionMapping::new(gesture, action).with_min_confidence(min_confidence))
    }

    pub fn map_to_shell_command(&mut self, gesture: GestureType, name: &str, command: &str, min_confidence: f64) -> Uuid {
        let action = ActionConfiguration::shell_command(name, command, false);
        self.add(GestureActionMapping::new(gesture, action).with_min_confidence(min_confidence))
    }

    pub fn map_to_shortcut(&mut self, gesture: GestureType, name: &str, shortcut: &str, min_confidence: f64) -> Uuid {
        let action = ActionConfiguration::run_shortcut(name, shortcut);
        self.add(GestureActionMapping::new(gesture, action).with_min_confidence(min_confidence))
    }
}

impl Extend<GestureActionMapping> for MappingRegistry {
    fn extend<I: IntoIterator<Item = GestureActionMapping>>(&mut self, iter: I) {
        for m in iter { self.add(m); }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::synthetic::{hand, Pose};
    use hand_pose::{FeatureExtractor, Point2};
    use std::time::Instant;

    fn event(kind: GestureType, confidence: f64) -> GestureEvent {
        let obs = hand(Pose::Peace, Point2::new(0.5, 0.5), confidence);
        let features = FeatureExtractor::default().extract(&obs).unwrap();
        GestureEvent::new(kind, confidence, Instant::now(), features)
    }

    #[test]
    fn confidence_floor_is_inclusive() {
        let mut reg = MappingRegistry::new();
        reg.map_to_open_url(GestureType::PeaceSign, "site", "https://example.com", 0.8);
        assert_eq!(reg.matching(&event(GestureType::PeaceSign, 0.7)).count(), 0);
        assert_eq!(reg.matching(&event(GestureType::PeaceSign, 0.8)).count(), 1);
        assert_eq!(reg.matching(&event(GestureType::PeaceSign, 0.85)).count(), 1);
        assert_eq!(reg.matching(&event(GestureType::Fist, 0.95)).count(), 0);
    }

    #[test]
    fn duplicates_all_match() {
        let mut reg = MappingRegistry::new();
        reg.map_to_shell_command(GestureType::Fist, "a", "true", 0.5);
        reg.map_to_shell_command(GestureType::Fist, "b", "true", 0.5);
        assert_eq!(reg.matching(&event(GestureType::Fist, 0.9)).count(), 2);
        assert_eq!(reg.mappings_for(GestureType::Fist).count(), 2);
    }

    #[test]
    fn disabled_mapping_never_matches() {
        let mut reg = MappingRegistry::new();
        let id = reg.map_to_shortcut(GestureType::OkSign, "s", "My Shortcut", 0.5);
        let mut m = reg.get(id).unwrap().clone();
        m.enabled = false;
        assert!(reg.update(m));
        assert_eq!(reg.matching(&event(GestureType::OkSign, 0.9)).count(), 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut reg = MappingRegistry::with_defaults();
        assert_eq!(reg.len(), 3);
        assert!(reg.remove(Uuid::new_v4()).is_none());
        let first = reg.all()[0].id;
        assert!(reg.remove(first).is_some());
        assert_eq!(reg.len(), 2);
        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn update_unknown_is_false() {
        let mut reg = MappingRegistry::new();
        let m = GestureActionMapping::new(GestureType::Wave, ActionConfiguration::open_url("x", "https://x"));
        assert!(!reg.update(m));
    }
}
