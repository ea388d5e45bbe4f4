//! The gesture event bus: collected gestures, the active set, statistics,
//! the event-record log and observer fan-out.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

use gesture_window::{GestureEvent, GestureType};

use crate::settings::ServiceConfig;
use crate::stats::{GestureStatistics, StatisticsSummary};

/// Default window for [`EventBus::frequency`].
pub const FREQUENCY_WINDOW: Duration = Duration::from_secs(60);
/// Default window for [`EventBus::has_detected`].
pub const RECENT_WINDOW: Duration = Duration::from_secs(1);
/// Default limit for [`EventBus::event_history`].
pub const HISTORY_LIMIT: usize = 50;

// ════════════════════════════════════════════════════════════════════════════
// Observers
// ════════════════════════════════════════════════════════════════════════════

/// Receives every published event, synchronously, after bus state is updated.
/// Must return quickly: it runs on the ingestion thread.
pub trait GestureObserver: Send {
    fn on_gesture(&mut self, event: &GestureEvent);
}

impl<F> GestureObserver for F
where
    F: FnMut(&GestureEvent) + Send,
{
    fn on_gesture(&mut self, event: &GestureEvent) { self(event) }
}

/// Forwards events over a channel; a closed receiver is ignored.
pub struct ChannelObserver {
    tx: Sender<GestureEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<GestureEvent>) -> Self { ChannelObserver { tx } }
}

impl GestureObserver for ChannelObserver {
    fn on_gesture(&mut self, event: &GestureEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    pub fn new() -> Self { ObserverId(Uuid::new_v4()) }
}

impl Default for ObserverId {
    fn default() -> Self { ObserverId::new() }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

// ════════════════════════════════════════════════════════════════════════════
// Records and export
// ════════════════════════════════════════════════════════════════════════════

/// Lightweight log entry for one event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureRecord {
    pub kind:       GestureType,
    pub confidence: f64,
    pub timestamp:  Instant,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportedGesture {
    pub gesture:    String,
    pub name:       String,
    pub confidence: f64,
    /// Seconds before the export.
    pub age_secs:   f64,
    pub palm:       [f64; 2],
    pub fingers:    [bool; 5],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportedRecord {
    pub gesture:    String,
    pub confidence: f64,
    pub age_secs:   f64,
}

/// Point-in-time dump of the bus.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GestureExport {
    /// Seconds since the Unix epoch.
    pub exported_at: f64,
    pub gestures:    Vec<ExportedGesture>,
    pub events:      Vec<ExportedRecord>,
    pub statistics:  StatisticsSummary,
}

impl GestureExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn age(now: Instant, then: Instant) -> f64 {
    now.saturating_duration_since(then).as_secs_f64()
}

// ════════════════════════════════════════════════════════════════════════════
// EventBus
// ════════════════════════════════════════════════════════════════════════════

pub struct EventBus {
    collected:     VecDeque<GestureEvent>,
    /// Last event time per type.
    last_seen:     HashMap<GestureType, Instant>,
    stats:         GestureStatistics,
    log:           VecDeque<GestureRecord>,
    observers:     Vec<(ObserverId, Box<dyn GestureObserver>)>,
    retention:     Duration,
    active_window: Duration,
    log_cap:       usize,
    collected_cap: usize,
}

impl Default for EventBus {
    fn default() -> Self { EventBus::new(&ServiceConfig::default()) }
}

impl EventBus {
    pub fn new(config: &ServiceConfig) -> Self {
        EventBus {
            collected:     VecDeque::new(),
            last_seen:     HashMap::new(),
            stats:         GestureStatistics::new(),
            log:           VecDeque::new(),
            observers:     Vec::new(),
            retention:     config.retention,
            active_window: config.active_window,
            log_cap:       config.log_cap.max(1),
            collected_cap: config.collected_cap.max(1),
        }
    }

    // ── publishing ───────────────────────────────────────────────────────

    /// Record `event`, then notify observers in registration order.
    pub fn publish(&mut self, event: &GestureEvent, now: Instant) {
        self.record(event, now);
        self.notify(event);
    }

    /// Update collected gestures, the active set, the log and statistics.
    pub fn record(&mut self, event: &GestureEvent, now: Instant) {
        self.collected.push_back(event.clone());
        while self.collected.len() > self.collected_cap {
            self.collected.pop_front();
        }
        self.last_seen.insert(event.kind, event.timestamp);
        self.stats.record(event);

        self.log.push_back(GestureRecord {
            kind:       event.kind,
            confidence: event.confidence,
            timestamp:  event.timestamp,
        });
        while self.log.len() > self.log_cap {
            self.log.pop_front();
        }

        self.prune(now);
    }

    pub fn notify(&mut self, event: &GestureEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer.on_gesture(event);
        }
    }

    /// Drop collected gestures past retention and stale active types.
    pub fn prune(&mut self, now: Instant) {
        let retention = self.retention;
        while let Some(front) = self.collected.front() {
            if now.saturating_duration_since(front.timestamp) > retention {
                self.collected.pop_front();
            } else {
                break;
            }
        }
        let window = self.active_window;
        self.last_seen.retain(|_, t| now.saturating_duration_since(*t) <= window);
    }

    /// Forget gestures, records and statistics. Observers stay registered.
    pub fn clear(&mut self) {
        self.collected.clear();
        self.last_seen.clear();
        self.log.clear();
        self.stats.reset();
        info!("gesture history cleared");
    }

    // ── observers ────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: Box<dyn GestureObserver>) -> ObserverId {
        let id = ObserverId::new();
        self.subscribe_as(id, observer);
        id
    }

    /// Register under a caller-chosen id.
    pub fn subscribe_as(&mut self, id: ObserverId, observer: Box<dyn GestureObserver>) {
        debug!("observer {id} registered");
        self.observers.push((id, observer));
    }

    /// Removing an unknown id is a no-op returning `false`.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        before != self.observers.len()
    }

    pub fn observer_count(&self) -> usize { self.observers.len() }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn statistics(&self) -> &GestureStatistics { &self.stats }

    pub fn collected(&self) -> impl Iterator<Item = &GestureEvent> { self.collected.iter() }

    /// Types with an event inside the active window, in variant order.
    pub fn active_gestures(&self, now: Instant) -> BTreeSet<GestureType> {
        self.last_seen.iter()
            .filter(|(_, t)| now.saturating_duration_since(**t) <= self.active_window)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn is_active(&self, kind: GestureType, now: Instant) -> bool {
        self.last_seen.get(&kind)
            .is_some_and(|t| now.saturating_duration_since(*t) <= self.active_window)
    }

    pub fn gestures_of(&self, kind: GestureType) -> Vec<&GestureEvent> {
        self.collected.iter().filter(|e| e.kind == kind).collect()
    }

    /// Collected gestures no older than `window`.
    pub fn recent(&self, window: Duration, now: Instant) -> Vec<&GestureEvent> {
        self.collected.iter()
            .filter(|e| now.saturating_duration_since(e.timestamp) <= window)
            .collect()
    }

    /// The last `limit` records, oldest first.
    pub fn event_history(&self, limit: usize) -> Vec<GestureRecord> {
        let skip = self.log.len().saturating_sub(limit);
        self.log.iter().skip(skip).copied().collect()
    }

    pub fn last_confidence(&self, kind: GestureType) -> Option<f64> {
        self.log.iter().rev().find(|r| r.kind == kind).map(|r| r.confidence)
    }

    /// Logged events of `kind` within `window`.
    pub fn frequency(&self, kind: GestureType, window: Duration, now: Instant) -> usize {
        self.log.iter()
            .filter(|r| r.kind == kind && now.saturating_duration_since(r.timestamp) <= window)
            .count()
    }

    pub fn has_detected(&self, kind: GestureType, window: Duration, now: Instant) -> bool {
        self.frequency(kind, window, now) > 0
    }

    pub fn most_frequent(&self) -> Option<GestureType> { self.stats.most_frequent() }

    pub fn average_confidence_by_type(&self) -> BTreeMap<GestureType, f64> {
        self.stats.average_confidence_by_type()
    }

    pub fn unique_types(&self) -> usize { self.stats.unique_types() }

    pub fn export(&self, now: Instant) -> GestureExport {
        let exported_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        GestureExport {
            exported_at,
            gestures: self.collected.iter().map(|e| ExportedGesture {
                gesture:    e.kind.id().to_string(),
                name:       e.kind.display_name().to_string(),
                confidence: e.confidence,
                age_secs:   age(now, e.timestamp),
                palm:       [e.hand.palm_center.x, e.hand.palm_center.y],
                fingers:    e.hand.fingers.as_array(),
            }).collect(),
            events: self.log.iter().map(|r| ExportedRecord {
                gesture:    r.kind.id().to_string(),
                confidence: r.confidence,
                age_secs:   age(now, r.timestamp),
            }).collect(),
            statistics: self.stats.summary(),
        }
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
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    fn event(kind: GestureType, confidence: f64, at: Instant) -> GestureEvent {
        let f = FeatureExtractor::default()
            .extract(&hand(Pose::Open, Point2::new(0.5, 0.5), confidence))
            .unwrap();
        GestureEvent::new(kind, confidence, at, f)
    }

    fn secs(s: u64) -> Duration { Duration::from_secs(s) }

    #[test]
    fn retention_prunes_on_next_publish() {
        let mut bus = EventBus::default();
        let t0 = Instant::now();
        bus.publish(&event(GestureType::Fist, 0.9, t0), t0);
        assert_eq!(bus.collected().count(), 1);

        let later = t0 + secs(31);
        bus.publish(&event(GestureType::Wave, 0.9, later), later);
        let kinds: Vec<_> = bus.collected().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![GestureType::Wave]);
        // The log and statistics keep the old event.
        assert_eq!(bus.event_history(HISTORY_LIMIT).len(), 2);
        assert_eq!(bus.statistics().total, 2);
    }

    #[test]
    fn active_set_excludes_stale_types() {
        let mut bus = EventBus::default();
        let t0 = Instant::now();
        bus.publish(&event(GestureType::Fist, 0.9, t0), t0);
        let t1 = t0 + secs(3);
        bus.publish(&event(GestureType::Wave, 0.9, t1), t1);

        assert_eq!(bus.active_gestures(t1).len(), 2);
        let t2 = t0 + Duration::from_millis(5_500);
        let active = bus.active_gestures(t2);
        assert!(!active.contains(&GestureType::Fist));
        assert!(active.contains(&GestureType::Wave));
        assert!(!bus.is_active(GestureType::Fist, t2));
    }

    #[test]
    fn log_is_capped() {
        let mut bus = EventBus::default();
        let t0 = Instant::now();
        for i in 0..130 {
            let t = t0 + Duration::from_millis(i * 10);
            bus.publish(&event(GestureType::Fist, 0.9, t), t);
        }
        assert_eq!(bus.event_history(usize::MAX).len(), 100);
        assert_eq!(bus.event_history(HISTORY_LIMIT).len(), 50);
        assert_eq!(bus.collected().count(), 100);
        assert_eq!(bus.statistics().total, 130);
    }

    #[test]
    fn observers_run_in_order_after_state_update() {
        let mut bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = seen.clone();
        bus.subscribe(Box::new(move |e: &GestureEvent| a.lock().unwrap().push(("a", e.kind))));
        let b = seen.clone();
        let b_id = bus.subscribe(Box::new(move |e: &GestureEvent| b.lock().unwrap().push(("b", e.kind))));

        let t0 = Instant::now();
        bus.publish(&event(GestureType::Fist, 0.9, t0), t0);
        assert_eq!(*seen.lock().unwrap(), vec![("a", GestureType::Fist), ("b", GestureType::Fist)]);

        assert!(bus.unsubscribe(b_id));
        assert!(!bus.unsubscribe(b_id));
        bus.publish(&event(GestureType::Wave, 0.9, t0), t0);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn channel_observer_forwards() {
        let mut bus = EventBus::default();
        let (tx, rx) = mpsc::channel();
        bus.subscribe(Box::new(ChannelObserver::new(tx)));
        let t0 = Instant::now();
        bus.publish(&event(GestureType::PeaceSign, 0.8, t0), t0);
        assert_eq!(rx.try_recv().unwrap().kind, GestureType::PeaceSign);
    }

    #[test]
    fn frequency_and_recency_queries() {
        let mut bus = EventBus::default();
        let t0 = Instant::now();
        for i in 0..3 {
            let t = t0 + secs(i * 20);
            bus.publish(&event(GestureType::Wave, 0.6 + 0.1 * i as f64, t), t);
        }
        let now = t0 + secs(40);
        assert_eq!(bus.frequency(GestureType::Wave, FREQUENCY_WINDOW, now), 3);
        assert_eq!(bus.frequency(GestureType::Wave, secs(25), now), 2);
        assert!(bus.has_detected(GestureType::Wave, RECENT_WINDOW, now));
        assert!(!bus.has_detected(GestureType::Fist, RECENT_WINDOW, now));
        assert!((bus.last_confidence(GestureType::Wave).unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(bus.recent(secs(25), now).len(), 2);
        assert_eq!(bus.gestures_of(GestureType::Wave).len(), 2);
        assert_eq!(bus.most_frequent(), Some(GestureType::Wave));
        assert_eq!(bus.unique_types(), 1);
    }

    #[test]
    fn clear_zeroes_everything_but_observers() {
        let mut bus = EventBus::default();
        bus.subscribe(Box::new(|_: &GestureEvent| {}));
        let t0 = Instant::now();
        bus.publish(&event(GestureType::Fist, 0.9, t0), t0);
        bus.clear();
        assert_eq!(*bus.statistics(), GestureStatistics::default());
        assert_eq!(bus.collected().count(), 0);
        assert!(bus.active_gestures(t0).is_empty());
        assert_eq!(bus.observer_count(), 1);
    }

    #[test]
    fn export_serializes() {
        let mut bus = EventBus::default();
        let t0 = Instant::now();
        bus.publish(&event(GestureType::OpenHand, 0.9, t0), t0);
        let export = bus.export(t0 + secs(2));
        assert_eq!(export.gestures.len(), 1);
        assert_eq!(export.gestures[0].gesture, "openHand");
        assert!((export.events[0].age_secs - 2.0).abs() < 1e-9);
        let json = export.to_json().unwrap();
        assert!(json.contains("\"statistics\""));
    }
}
