//! The threaded service driven through its public handle, with a manual
//! clock standing in for wall time.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gesture_actions::{config, MappingRegistry, RecordingExecutor};
use gesture_control::{
    spawn_landmark_source, ChannelObserver, Clock, GestureService, ManualClock, ScriptedSource,
    ServiceConfig, REPORT_BACKLOG,
};
use gesture_window::{EnergyMode, GestureEvent, GestureType};
use hand_pose::synthetic::{hand, Pose};
use hand_pose::{LandmarkFrame, Point2};

fn fist_registry() -> MappingRegistry {
    let mut reg = MappingRegistry::new();
    reg.map_to_shell_command(GestureType::Fist, "fist", "true", 0.5);
    reg
}

struct Harness {
    clock:    ManualClock,
    executor: RecordingExecutor,
    service:  GestureService,
}

impl Harness {
    fn new(config: ServiceConfig, registry: MappingRegistry) -> Self {
        let clock = ManualClock::new();
        let executor = RecordingExecutor::new();
        let service = GestureService::spawn_with_clock(
            config,
            registry,
            Box::new(executor.clone()),
            Arc::new(clock.clone()),
        );
        Harness { clock, executor, service }
    }

    fn show(&self, pose: Pose, frames: usize, confidence: f64) {
        for _ in 0..frames {
            let obs = hand(pose, Point2::new(0.5, 0.5), confidence);
            self.service.submit_frame(LandmarkFrame::new(self.clock.now(), vec![obs])).unwrap();
        }
    }

    fn clap(&self, frames: usize) {
        for _ in 0..frames {
            let hands = vec![
                hand(Pose::Open, Point2::new(0.475, 0.5), 0.9),
                hand(Pose::Open, Point2::new(0.525, 0.5), 0.9),
            ];
            self.service.submit_frame(LandmarkFrame::new(self.clock.now(), hands)).unwrap();
        }
    }

    fn hand_leaves(&self) {
        self.service.submit_frame(LandmarkFrame::empty(self.clock.now())).unwrap();
    }
}

#[test]
fn repeated_gesture_is_debounced_by_the_clock() {
    let h = Harness::new(ServiceConfig::default(), fist_registry());

    h.show(Pose::Fist, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.executor.count(), 1);

    h.clock.advance(Duration::from_millis(300));
    h.show(Pose::Open, 3, 0.9);
    h.show(Pose::Fist, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.executor.count(), 1);
    assert_eq!(h.service.statistics().count(GestureType::Fist), 2);

    h.clock.advance(Duration::from_millis(300));
    h.show(Pose::Open, 3, 0.9);
    h.show(Pose::Fist, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.executor.count(), 2);

    let reports = h.service.drain_reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.executed == 1 && r.failures.is_empty()));
}

#[test]
fn statistics_average_and_clear() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    h.show(Pose::Fist, 3, 0.6);
    h.hand_leaves();
    h.show(Pose::Fist, 3, 0.8);
    h.service.flush().unwrap();

    let stats = h.service.statistics();
    assert_eq!(stats.total, 2);
    assert!((stats.average_confidence() - 0.7).abs() < 1e-12);

    h.service.clear_history().unwrap();
    h.service.flush().unwrap();
    let stats = h.service.statistics();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.average_confidence(), 0.0);
    assert!(stats.most_frequent().is_none());
}

#[test]
fn observers_see_events_until_unsubscribed() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    let (tx, rx) = mpsc::channel();
    let id = h.service.subscribe(Box::new(ChannelObserver::new(tx))).unwrap();

    h.show(Pose::ThumbsUp, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(rx.try_recv().unwrap().kind, GestureType::ThumbsUp);

    h.service.unsubscribe(id).unwrap();
    h.hand_leaves();
    h.show(Pose::ThumbsUp, 3, 0.9);
    h.service.flush().unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn observers_run_in_registration_order_after_statistics_update() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in ["first", "second"] {
        let seen  = seen.clone();
        let stats = h.service.shared_statistics();
        h.service.subscribe(Box::new(move |e: &GestureEvent| {
            seen.lock().unwrap().push((name, e.kind, stats.snapshot().total));
        })).unwrap();
    }

    h.show(Pose::Fist, 3, 0.9);
    h.hand_leaves();
    h.show(Pose::Peace, 3, 0.9);
    h.service.flush().unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![
        ("first",  GestureType::Fist,      1),
        ("second", GestureType::Fist,      1),
        ("first",  GestureType::PeaceSign, 2),
        ("second", GestureType::PeaceSign, 2),
    ]);
}

#[test]
fn undrained_reports_are_bounded() {
    let mut reg = MappingRegistry::new();
    reg.map_to_shell_command(GestureType::TwoHandClap, "clap", "true", 0.5);
    let config = ServiceConfig { debounce: Duration::ZERO, ..ServiceConfig::default() };
    let h = Harness::new(config, reg);

    let plans = REPORT_BACKLOG * 3;
    h.clap(plans);
    h.service.flush().unwrap();
    assert_eq!(h.executor.count(), plans);
    assert_eq!(h.service.drain_reports().len(), REPORT_BACKLOG);

    // Draining makes room again.
    h.clap(2);
    h.service.flush().unwrap();
    assert_eq!(h.service.drain_reports().len(), 2);
}

#[test]
fn energy_mode_switch_reaches_the_worker() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    h.show(Pose::Pinch, 1, 0.9);
    h.service.set_energy_mode(EnergyMode::HighPerformance).unwrap();
    h.show(Pose::Pinch, 1, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.service.statistics().count(GestureType::Pinch), 1);
}

#[test]
fn export_reflects_bus_contents() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    h.show(Pose::Peace, 3, 0.9);
    h.clock.advance(Duration::from_secs(2));

    let export = h.service.export().unwrap();
    assert_eq!(export.gestures.len(), 1);
    assert_eq!(export.gestures[0].gesture, "peaceSign");
    assert!((export.gestures[0].age_secs - 2.0).abs() < 1e-9);
    assert_eq!(export.statistics.total, 1);
    assert!(export.to_json().unwrap().contains("peaceSign"));
}

#[test]
fn registry_edits_apply_to_later_events() {
    let h = Harness::new(ServiceConfig::default(), MappingRegistry::new());
    h.show(Pose::Fist, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.executor.count(), 0);

    h.service.with_registry(|reg| reg.map_to_open_url(GestureType::Fist, "docs", "https://example.com", 0.5));
    assert_eq!(h.service.mappings().len(), 1);

    h.clock.advance(Duration::from_secs(1));
    h.hand_leaves();
    h.show(Pose::Fist, 3, 0.9);
    h.service.flush().unwrap();
    assert_eq!(h.executor.names(), vec!["docs".to_string()]);
}

#[test]
fn configuration_file_drives_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gestures.json");
    std::fs::write(&path, r#"{
        "version": "1.0",
        "energy_settings": { "energy_mode": "high_performance" },
        "gesture_mappings": [
            { "gesture_id": "fist", "name": "list", "action_type": "shell_command",
              "command": "ls", "enabled": "true", "minimum_confidence": "0.6" },
            { "gesture_id": "jazzHands", "name": "nope", "action_type": "shell_command",
              "command": "true" },
            { "gesture_id": "wave", "name": "off", "action_type": "open_url",
              "url": "https://example.com", "enabled": false }
        ]
    }"#).unwrap();

    let loaded = config::load_file(&path).unwrap();
    assert_eq!(loaded.mappings.len(), 2);
    assert_eq!(loaded.rejected.len(), 1);
    assert_eq!(loaded.rejected[0].0, 1);
    assert_eq!(loaded.energy_mode, EnergyMode::HighPerformance);

    let h = Harness::new(ServiceConfig::default().with_loaded(&loaded), loaded.registry());
    h.show(Pose::Fist, 3, 0.5);
    h.hand_leaves();
    h.clock.advance(Duration::from_secs(1));
    h.show(Pose::Fist, 3, 0.7);
    h.service.flush().unwrap();
    assert_eq!(h.executor.names(), vec!["list".to_string()]);
}

#[test]
fn scripted_demo_runs_end_to_end() {
    let clock = ManualClock::starting_at(Instant::now());
    let executor = RecordingExecutor::new();
    let service = GestureService::spawn_with_clock(
        ServiceConfig::default(),
        MappingRegistry::with_defaults(),
        Box::new(executor.clone()),
        Arc::new(clock.clone()),
    );

    for frame in spawn_landmark_source(ScriptedSource::demo().realtime(false)) {
        clock.set_offset(frame.timestamp.saturating_duration_since(clock.base()));
        service.submit_frame(frame).unwrap();
    }
    service.flush().unwrap();

    let stats = service.shutdown();
    for kind in [
        GestureType::Fist,
        GestureType::SwipeRight,
        GestureType::SequencePeaceFistPeace,
        GestureType::TwoHandClap,
        GestureType::ThumbsUp,
    ] {
        assert!(stats.count(kind) >= 1, "{kind} not detected");
    }
    // Default mappings cover peace and thumbs-up.
    assert!(executor.count() >= 2);
}
