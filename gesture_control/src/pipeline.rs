//! The single-writer ingestion path: extract → classify → publish → plan.
//!
//! A [`Pipeline`] owns every piece of mutable classification state. It is
//! driven by exactly one caller at a time (the service's ingest worker, or a
//! test directly); action plans it produces are executed elsewhere.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use gesture_actions::{DispatchPlan, Dispatcher, MappingRegistry};
use gesture_window::{EnergyMode, GestureClassifier, GestureEvent};
use hand_pose::{FeatureExtractor, LandmarkFrame};

use crate::bus::EventBus;
use crate::settings::ServiceConfig;
use crate::stats::SharedStatistics;

/// What one frame produced.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub events: Vec<GestureEvent>,
    /// Non-empty plans only, one per event that fires actions.
    pub plans:  Vec<DispatchPlan>,
}

pub struct Pipeline {
    extractor:  FeatureExtractor,
    classifier: GestureClassifier,
    bus:        EventBus,
    dispatcher: Dispatcher,
    registry:   Arc<RwLock<MappingRegistry>>,
    published:  SharedStatistics,
}

impl Pipeline {
    pub fn new(config: &ServiceConfig, registry: Arc<RwLock<MappingRegistry>>) -> Self {
        let mut classifier = GestureClassifier::new(config.classifier.clone());
        classifier.set_energy_mode(config.energy_mode);
        if let Some(enabled) = config.advanced_override {
            classifier.set_advanced_patterns(enabled);
        }

        let extractor = FeatureExtractor {
            min_joint_confidence: config.min_joint_confidence,
            min_hand_confidence:  config.min_joint_confidence,
            keep_landmarks:       classifier.advanced_patterns(),
        };

        Pipeline {
            extractor,
            classifier,
            bus: EventBus::new(config),
            dispatcher: Dispatcher::new(config.debounce),
            registry,
            published:  SharedStatistics::new(),
        }
    }

    /// Pipeline with its own registry.
    pub fn standalone(config: &ServiceConfig, registry: MappingRegistry) -> Self {
        Pipeline::new(config, Arc::new(RwLock::new(registry)))
    }

    /// Classify one frame at `now` and publish what it yields.
    ///
    /// Frames with no usable hand are dropped without error.
    pub fn submit_frame(&mut self, frame: &LandmarkFrame, now: Instant) -> FrameOutcome {
        let features = self.extractor.extract_frame(frame);
        let events = self.classifier.push_frame(features);
        if events.is_empty() {
            self.bus.prune(now);
            return FrameOutcome::default();
        }

        let registry = self.registry.read();
        let mut plans = Vec::new();
        for event in &events {
            self.bus.record(event, now);
            self.published.store(self.bus.statistics());
            self.bus.notify(event);
            let plan = self.dispatcher.plan(&registry, event, now);
            if !plan.is_empty() || !plan.skipped.is_empty() {
                plans.push(plan);
            }
        }
        FrameOutcome { events, plans }
    }

    // ── energy ───────────────────────────────────────────────────────────

    pub fn set_energy_mode(&mut self, mode: EnergyMode) {
        self.classifier.set_energy_mode(mode);
        self.sync_landmarks();
    }

    pub fn set_advanced_patterns(&mut self, enabled: bool) {
        self.classifier.set_advanced_patterns(enabled);
        self.sync_landmarks();
    }

    fn sync_landmarks(&mut self) {
        self.extractor.keep_landmarks = self.classifier.advanced_patterns();
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn bus(&self)            -> &EventBus          { &self.bus }
    pub fn bus_mut(&mut self)    -> &mut EventBus      { &mut self.bus }
    pub fn classifier(&self)     -> &GestureClassifier { &self.classifier }
    pub fn dispatcher(&self)     -> &Dispatcher        { &self.dispatcher }
    pub fn registry(&self)       -> &Arc<RwLock<MappingRegistry>> { &self.registry }

    /// A handle that follows this pipeline's statistics.
    pub fn shared_statistics(&self) -> SharedStatistics { self.published.clone() }

    /// Clear bus history and statistics, classifier history and debounce timers.
    pub fn reset(&mut self) {
        self.bus.clear();
        self.classifier.reset();
        self.dispatcher.reset();
        self.published.store(self.bus.statistics());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_window::GestureType;
    use hand_pose::synthetic::{hand, Pose};
    use hand_pose::Point2;
    use std::time::Duration;

    fn frame(at: Instant, pose: Pose) -> LandmarkFrame {
        LandmarkFrame::new(at, vec![hand(pose, Point2::new(0.5, 0.5), 0.9)])
    }

    #[test]
    fn held_peace_plans_once() {
        let mut reg = MappingRegistry::new();
        reg.map_to_open_url(GestureType::PeaceSign, "site", "https://example.com", 0.7);
        let mut p = Pipeline::standalone(&ServiceConfig::default(), reg);

        let t0 = Instant::now();
        let mut plans = 0;
        for i in 0..10 {
            let t = t0 + Duration::from_millis(i * 33);
            plans += p.submit_frame(&frame(t, Pose::Peace), t).plans.len();
        }
        assert_eq!(plans, 1);
        assert_eq!(p.bus().statistics().count(GestureType::PeaceSign), 1);
    }

    #[test]
    fn observers_run_in_order_against_updated_statistics() {
        let mut p = Pipeline::standalone(&ServiceConfig::default(), MappingRegistry::new());
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let seen  = seen.clone();
            let stats = p.shared_statistics();
            p.bus_mut().subscribe(Box::new(move |e: &GestureEvent| {
                seen.lock().push((name, e.kind, stats.snapshot().total));
            }));
        }

        let t0 = Instant::now();
        for i in 0..3 {
            let t = t0 + Duration::from_millis(i * 33);
            p.submit_frame(&frame(t, Pose::Fist), t);
        }
        assert_eq!(
            *seen.lock(),
            vec![("first", GestureType::Fist, 1), ("second", GestureType::Fist, 1)]
        );
    }

    #[test]
    fn empty_frames_are_dropped_silently() {
        let mut p = Pipeline::standalone(&ServiceConfig::default(), MappingRegistry::new());
        let t0 = Instant::now();
        let out = p.submit_frame(&LandmarkFrame::empty(t0), t0);
        assert!(out.events.is_empty());
        let weak = LandmarkFrame::new(t0, vec![hand(Pose::Fist, Point2::new(0.5, 0.5), 0.1)]);
        assert!(p.submit_frame(&weak, t0).events.is_empty());
        assert!(p.classifier().history().is_empty());
    }

    #[test]
    fn energy_mode_toggles_landmark_retention() {
        let mut p = Pipeline::standalone(&ServiceConfig::default(), MappingRegistry::new());
        let t0 = Instant::now();
        assert!(p.submit_frame(&frame(t0, Pose::OkSign), t0).events.is_empty());

        p.set_energy_mode(EnergyMode::HighPerformance);
        let t1 = t0 + Duration::from_millis(33);
        let kinds: Vec<_> = p.submit_frame(&frame(t1, Pose::OkSign), t1).events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![GestureType::OkSign]);
        let kept = p.classifier().history().latest().unwrap().hands[0].landmarks.is_some();
        assert!(kept);
    }

    #[test]
    fn reset_clears_state() {
        let mut p = Pipeline::standalone(&ServiceConfig::default(), MappingRegistry::new());
        let t0 = Instant::now();
        for i in 0..3 {
            let t = t0 + Duration::from_millis(i * 33);
            p.submit_frame(&frame(t, Pose::Fist), t);
        }
        assert_eq!(p.bus().statistics().total, 1);
        assert_eq!(p.shared_statistics().snapshot().total, 1);
        p.reset();
        assert_eq!(p.bus().statistics().total, 0);
        assert_eq!(p.shared_statistics().snapshot().total, 0);
        assert!(p.classifier().history().is_empty());
    }
}
