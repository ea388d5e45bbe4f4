//! Running gesture statistics.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;

use gesture_window::{GestureEvent, GestureType};

/// Aggregate over every event since the last clear. Cloned out as a snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureStatistics {
    pub total:          u64,
    pub per_type:       BTreeMap<GestureType, u64>,
    pub confidence_sum: f64,
    per_type_conf:      BTreeMap<GestureType, f64>,
    pub first_event:    Option<Instant>,
    pub last_event:     Option<Instant>,
}

/// Statistics readable from any thread. The pipeline stores a fresh copy
/// after each event is recorded and before observers hear about it.
#[derive(Clone, Debug, Default)]
pub struct SharedStatistics(Arc<RwLock<GestureStatistics>>);

impl SharedStatistics {
    pub fn new() -> Self { SharedStatistics::default() }

    pub fn snapshot(&self) -> GestureStatistics { self.0.read().clone() }

    pub(crate) fn store(&self, stats: &GestureStatistics) {
        self.0.write().clone_from(stats);
    }
}

impl GestureStatistics {
    pub fn new() -> Self { GestureStatistics::default() }

    pub fn record(&mut self, event: &GestureEvent) {
        self.total += 1;
        *self.per_type.entry(event.kind).or_insert(0) += 1;
        *self.per_type_conf.entry(event.kind).or_insert(0.0) += event.confidence;
        self.confidence_sum += event.confidence;
        self.first_event.get_or_insert(event.timestamp);
        self.last_event = Some(event.timestamp);
    }

    pub fn reset(&mut self) { *self = GestureStatistics::default(); }

    pub fn count(&self, kind: GestureType) -> u64 {
        self.per_type.get(&kind).copied().unwrap_or(0)
    }

    /// 0 before the first event.
    pub fn average_confidence(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.confidence_sum / self.total as f64 }
    }

    pub fn average_confidence_of(&self, kind: GestureType) -> Option<f64> {
        let n = self.count(kind);
        (n > 0).then(|| self.per_type_conf.get(&kind).copied().unwrap_or(0.0) / n as f64)
    }

    pub fn average_confidence_by_type(&self) -> BTreeMap<GestureType, f64> {
        self.per_type.keys()
            .filter_map(|k| self.average_confidence_of(*k).map(|a| (*k, a)))
            .collect()
    }

    /// Events per second between the first and last event; 0 when that span is 0.
    pub fn detection_rate(&self) -> f64 {
        match (self.first_event, self.last_event) {
            (Some(first), Some(last)) => {
                let span = last.saturating_duration_since(first).as_secs_f64();
                if span > 0.0 { self.total as f64 / span } else { 0.0 }
            }
            _ => 0.0,
        }
    }

    /// Highest count; ties go to the earlier variant.
    pub fn most_frequent(&self) -> Option<GestureType> {
        self.per_type.iter()
            .fold(None, |best: Option<(GestureType, u64)>, (k, n)| match best {
                Some((_, m)) if m >= *n => best,
                _ => Some((*k, *n)),
            })
            .map(|(k, _)| k)
    }

    pub fn unique_types(&self) -> usize { self.per_type.len() }

    pub fn summary(&self) -> StatisticsSummary {
        StatisticsSummary {
            total:              self.total,
            per_type:           self.per_type.iter().map(|(k, n)| (k.id().to_string(), *n)).collect(),
            average_confidence: self.average_confidence(),
            detection_rate:     self.detection_rate(),
            unique_types:       self.unique_types(),
            most_frequent:      self.most_frequent().map(|k| k.id().to_string()),
        }
    }
}

/// Serializable view of [`GestureStatistics`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total:              u64,
    pub per_type:           BTreeMap<String, u64>,
    pub average_confidence: f64,
    pub detection_rate:     f64,
    pub unique_types:       usize,
    pub most_frequent:      Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
