//! Confidence- and debounce-gated selection of the actions an event fires.
//!
//! Selection ([`Dispatcher::plan`]) is cheap and runs on the ingestion path;
//! execution ([`execute_plan`]) may be slow and runs wherever the caller
//! queues it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use gesture_window::{GestureEvent, GestureType};

use crate::action::ActionConfiguration;
use crate::error::ActionError;
use crate::executor::ActionExecutor;
use crate::mapping::MappingRegistry;

/// Minimum spacing between two accepted batches of one gesture type.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

// ════════════════════════════════════════════════════════════════════════════
// DispatchPlan / ActionReport
// ════════════════════════════════════════════════════════════════════════════

/// The actions one event will run.
#[derive(Debug, Default)]
pub struct DispatchPlan {
    pub gesture:   Option<GestureType>,
    /// Valid, enabled actions, in mapping order.
    pub actions:   Vec<ActionConfiguration>,
    /// Enabled actions dropped for an unresolved parameter.
    pub skipped:   Vec<(String, ActionError)>,
    /// The whole batch fell inside the debounce interval.
    pub debounced: bool,
}

impl DispatchPlan {
    pub fn is_empty(&self) -> bool { self.actions.is_empty() }
}

/// Outcome of running a plan.
#[derive(Debug, Default)]
pub struct ActionReport {
    pub gesture:  Option<GestureType>,
    pub executed: usize,
    /// Action name and error, for skipped and failed actions alike.
    pub failures: Vec<(String, ActionError)>,
}

/// Run every action of `plan`; failures are collected, never propagated.
pub fn execute_plan(plan: DispatchPlan, executor: &mut dyn ActionExecutor) -> ActionReport {
    let mut report = ActionReport { gesture: plan.gesture, executed: 0, failures: plan.skipped };
    for action in plan.actions {
        match executor.execute(&action) {
            Ok(()) => report.executed += 1,
            Err(e) => {
                warn!("action '{}' failed: {}", action.name, e);
                report.failures.push((action.name, e));
            }
        }
    }
    if let Some(g) = report.gesture {
        if report.executed > 0 {
            info!("executed {} action(s) for {}", report.executed, g);
        }
    }
    report
}

// ════════════════════════════════════════════════════════════════════════════
// Dispatcher
// ════════════════════════════════════════════════════════════════════════════

/// Holds the per-gesture debounce timers. One timer per gesture type,
/// shared by every mapping of that type.
#[derive(Debug)]
pub struct Dispatcher {
    debounce:   Duration,
    last_fired: HashMap<GestureType, Instant>,
}

impl Default for Dispatcher {
    fn default() -> Self { Dispatcher::new(DEFAULT_DEBOUNCE) }
}

impl Dispatcher {
    pub fn new(debounce: Duration) -> Self {
        Dispatcher { debounce, last_fired: HashMap::new() }
    }

    pub fn debounce(&self) -> Duration { self.debounce }

    pub fn last_fired(&self, gesture: GestureType) -> Option<Instant> {
        self.last_fired.get(&gesture).copied()
    }

    /// Decide which actions `event` fires at `now`.
    ///
    /// The timer for the event's gesture moves only when at least one action
    /// is queued.
    pub fn plan(&mut self, registry: &MappingRegistry, event: &GestureEvent, now: Instant) -> DispatchPlan {
        let gesture = event.kind;
        let mut plan = DispatchPlan { gesture: Some(gesture), ..DispatchPlan::default() };

        let matching: Vec<_> = registry.matching(event).collect();
        if matching.is_empty() {
            return plan;
        }

        if let Some(last) = self.last_fired.get(&gesture) {
            if now.saturating_duration_since(*last) < self.debounce {
                debug!("{} debounced ({} mapping(s))", gesture, matching.len());
                plan.debounced = true;
                return plan;
            }
        }

        for mapping in matching {
            let action = &mapping.action;
            if !action.enabled {
                continue;
            }
            match action.validate() {
                Ok(())  => plan.actions.push(action.clone()),
                Err(e) => {
                    warn!("skipping action '{}': {}", action.name, e);
                    plan.skipped.push((action.name.clone(), e));
                }
            }
        }

        if !plan.actions.is_empty() {
            self.last_fired.insert(gesture, now);
        }
        plan
    }

    /// Plan and run synchronously.
    pub fn dispatch(
        &mut self,
        registry: &MappingRegistry,
        event:    &GestureEvent,
        now:      Instant,
        executor: &mut dyn ActionExecutor,
    ) -> ActionReport {
        let plan = self.plan(registry, event, now);
        execute_plan(plan, executor)
    }

    /// Forget every debounce timer.
    pub fn reset(&mut self) {
        self.last_fired.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
