//! The classifier: owns the history window and runs the detector tiers on
//! every appended frame.
//!
//! # Evaluation order
//!
//! 1. **Static**: stable pose over `stability_frames`. Edge-triggered: an
//!    event fires when a stable pose is first reached (or changes), and a
//!    pose that stays held keeps later tiers of the primary slot quiet.
//! 2. **Dynamic**: swipe, then wave, once `dynamic_min_history` frames exist.
//! 3. **Advanced**: grab/release, OK sign, pinch; only when enabled. Latched
//!    like the static tier: a held pinch reports once.
//!
//! Tiers 1–3 share one *primary* slot: the first that answers wins. The
//! **two-hand** and **sequential** detectors are always evaluated on top, so
//! one frame yields at most three events.

use log::{debug, info};

use hand_pose::GestureFrame;

use crate::detectors::{self, Detection, Thresholds, PEACE_FIST_PEACE};
use crate::energy::EnergyMode;
use crate::gesture::{GestureEvent, GestureType};
use crate::history::{HistoryBuffer, HISTORY_CAPACITY};

// ════════════════════════════════════════════════════════════════════════════
// ClassifierConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierConfig {
    pub history_capacity:    usize,
    /// Consecutive frames with an identical finger count before a static pose counts.
    pub stability_frames:    usize,
    /// Frames required in history before motion is considered.
    pub dynamic_min_history: usize,
    /// Frames the motion detectors look at.
    pub dynamic_window:      usize,
    /// First-hand finger counts for the peace → fist → peace sequence.
    pub sequence_pattern:    Vec<usize>,
    pub thresholds:          Thresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            history_capacity:    HISTORY_CAPACITY,
            stability_frames:    3,
            dynamic_min_history: 5,
            dynamic_window:      4,
            sequence_pattern:    PEACE_FIST_PEACE.to_vec(),
            thresholds:          Thresholds::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureClassifier
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureClassifier {
    config:            ClassifierConfig,
    history:           HistoryBuffer,
    energy_mode:       EnergyMode,
    /// Explicit override of the mode's advanced flag.
    advanced_override: Option<bool>,
    /// The static pose currently held (already reported).
    held_static:       Option<GestureType>,
    /// Last advanced kind reported, until the tier answers something else.
    held_advanced:     Option<GestureType>,
}

impl Default for GestureClassifier {
    fn default() -> Self { GestureClassifier::new(ClassifierConfig::default()) }
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let history = HistoryBuffer::new(config.history_capacity);
        GestureClassifier {
            config,
            history,
            energy_mode:       EnergyMode::default(),
            advanced_override: None,
            held_static:       None,
            held_advanced:     None,
        }
    }

    pub fn config(&self)  -> &ClassifierConfig { &self.config }
    pub fn history(&self) -> &HistoryBuffer    { &self.history }

    // ── energy mode ──────────────────────────────────────────────────────

    pub fn energy_mode(&self) -> EnergyMode { self.energy_mode }

    /// Takes effect from the next frame; clears any advanced override.
    pub fn set_energy_mode(&mut self, mode: EnergyMode) {
        if mode != self.energy_mode {
            info!("energy mode: {} → {}", self.energy_mode, mode);
        }
        self.energy_mode = mode;
        self.advanced_override = None;
    }

    /// Force the advanced tier on or off regardless of mode.
    pub fn set_advanced_patterns(&mut self, enabled: bool) {
        info!("advanced patterns: {}", if enabled { "enabled" } else { "disabled" });
        self.advanced_override = Some(enabled);
    }

    /// Whether the advanced tier runs (and raw landmarks should be kept).
    pub fn advanced_patterns(&self) -> bool {
        self.advanced_override.unwrap_or_else(|| self.energy_mode.advanced_patterns())
    }

    // ── ingestion ────────────────────────────────────────────────────────

    /// Append a frame and return every gesture it completes.
    ///
    /// Frames without hands are not stored; they release a held static pose.
    pub fn push_frame(&mut self, frame: GestureFrame) -> Vec<GestureEvent> {
        if frame.is_empty() {
            self.note_empty_frame();
            return Vec::new();
        }

        let timestamp = frame.timestamp;
        self.history.push(frame);

        let mut events = Vec::with_capacity(3);
        if let Some(e) = self.primary() {
            events.push(e);
        }

        let th = &self.config.thresholds;
        if let Some(latest) = self.history.latest() {
            if latest.hands.len() == 2 {
                if let Some(d) = detectors::detect_two_hand(latest, th.clap_distance) {
                    events.push(d.into_event(timestamp));
                }
            }
        }
        if let Some(d) = detectors::detect_sequence(&self.history, &self.config.sequence_pattern) {
            events.push(d.into_event(timestamp));
        }

        for e in &events {
            debug!("detected {} ({:.2})", e.kind, e.confidence);
        }
        events
    }

    /// The hand left the frame.
    pub fn note_empty_frame(&mut self) {
        self.held_static = None;
        self.held_advanced = None;
    }

    /// Drop all history and held state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.held_static = None;
        self.held_advanced = None;
    }

    fn primary(&mut self) -> Option<GestureEvent> {
        let timestamp = self.history.latest()?.timestamp;

        let held_advanced = self.held_advanced.take();

        // ── static ───────────────────────────────────────────────────────
        match detectors::detect_static(&self.history, self.config.stability_frames) {
            Some(d) => {
                if self.held_static == Some(d.kind) {
                    return None;
                }
                self.held_static = Some(d.kind);
                return Some(d.into_event(timestamp));
            }
            None => self.held_static = None,
        }

        // ── dynamic ──────────────────────────────────────────────────────
        if self.history.len() >= self.config.dynamic_min_history {
            let frames: Vec<_> = self.history.recent(self.config.dynamic_window).collect();
            let hit = detectors::detect_swipe(&frames, self.config.thresholds.swipe_distance)
                .or_else(|| detectors::detect_wave(&frames));
            if let Some(d) = hit {
                return Some(d.into_event(timestamp));
            }
        }

        // ── advanced ─────────────────────────────────────────────────────
        if !self.advanced_patterns() { return None; }
        let d = self.advanced()?;
        let kind = d.kind;
        let event = (held_advanced != Some(kind)).then(|| d.into_event(timestamp));
        self.held_advanced = Some(kind);
        event
    }

    fn advanced(&self) -> Option<Detection<'_>> {
        let th = &self.config.thresholds;
        let latest = self.history.latest()?;
        detectors::detect_grab_release(&self.history)
            .or_else(|| detectors::detect_ok_sign(latest, th.ok_distance))
            .or_else(|| detectors::detect_pinch(latest, th.pinch_distance))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
