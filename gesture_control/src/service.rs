//! The threaded gesture service.
//!
//! Two workers connected by channels:
//!
//! * **ingest** owns the [`Pipeline`] and handles [`ServiceCommand`]s one at a
//!   time, so classification state has a single writer.
//! * **action** runs the [`DispatchPlan`]s the ingest worker queues, so a slow
//!   process launch never delays the next frame.
//!
//! Statistics and the mapping registry are shared behind `RwLock`s; readers
//! always get a copied snapshot. Action reports wait in a bounded queue;
//! once it is full, new reports are dropped until [`GestureService::drain_reports`]
//! makes room.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use parking_lot::RwLock;
use thiserror::Error;

use gesture_actions::{
    execute_plan, ActionExecutor, ActionReport, DispatchPlan, GestureActionMapping, MappingRegistry,
};
use gesture_window::EnergyMode;
use hand_pose::LandmarkFrame;

use crate::bus::{GestureExport, GestureObserver, ObserverId};
use crate::clock::{Clock, SystemClock};
use crate::pipeline::Pipeline;
use crate::settings::ServiceConfig;
use crate::stats::{GestureStatistics, SharedStatistics};

/// Undrained action reports kept before new ones are dropped.
pub const REPORT_BACKLOG: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("gesture service has stopped")]
    Stopped,
}

// ════════════════════════════════════════════════════════════════════════════
// Commands
// ════════════════════════════════════════════════════════════════════════════

pub enum ServiceCommand {
    /// Classify one frame.
    Frame(LandmarkFrame),
    SetEnergyMode(EnergyMode),
    SetAdvancedPatterns(bool),
    Subscribe(ObserverId, Box<dyn GestureObserver>),
    Unsubscribe(ObserverId),
    /// Clear bus history, statistics, classifier window and debounce timers.
    ClearHistory,
    Export(Sender<GestureExport>),
    /// Acknowledged once every earlier command and queued action has run.
    Flush(Sender<()>),
    /// Terminate both workers.
    Quit,
}

enum ActionJob {
    Run(DispatchPlan),
    Flush(Sender<()>),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureService
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the running workers. Dropping it stops them.
pub struct GestureService {
    cmd_tx:    Sender<ServiceCommand>,
    report_rx: Receiver<ActionReport>,
    stats:     SharedStatistics,
    registry:  Arc<RwLock<MappingRegistry>>,
    ingest:    Option<JoinHandle<()>>,
    action:    Option<JoinHandle<()>>,
}

impl GestureService {
    /// Spawn with the system clock.
    pub fn spawn(
        config:   ServiceConfig,
        registry: MappingRegistry,
        executor: Box<dyn ActionExecutor>,
    ) -> Self {
        GestureService::spawn_with_clock(config, registry, executor, Arc::new(SystemClock))
    }

    pub fn spawn_with_clock(
        config:   ServiceConfig,
        registry: MappingRegistry,
        executor: Box<dyn ActionExecutor>,
        clock:    Arc<dyn Clock>,
    ) -> Self {
        let (cmd_tx, cmd_rx)       = mpsc::channel::<ServiceCommand>();
        let (job_tx, job_rx)       = mpsc::channel::<ActionJob>();
        let (report_tx, report_rx) = mpsc::sync_channel::<ActionReport>(REPORT_BACKLOG);

        let registry = Arc::new(RwLock::new(registry));
        let pipeline = Pipeline::new(&config, registry.clone());
        let stats    = pipeline.shared_statistics();

        let ingest = thread::spawn(move || ingest_worker(pipeline, clock, cmd_rx, job_tx));
        let action = thread::spawn(move || action_worker(executor, job_rx, report_tx));
        info!("gesture service started ({} mode)", config.energy_mode);

        GestureService {
            cmd_tx,
            report_rx,
            stats,
            registry,
            ingest: Some(ingest),
            action: Some(action),
        }
    }

    fn send(&self, cmd: ServiceCommand) -> Result<(), ServiceError> {
        self.cmd_tx.send(cmd).map_err(|_| ServiceError::Stopped)
    }

    // ── inbound ──────────────────────────────────────────────────────────

    pub fn submit_frame(&self, frame: LandmarkFrame) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Frame(frame))
    }

    /// A sender that feeds frames straight into the ingest queue.
    pub fn command_sender(&self) -> Sender<ServiceCommand> { self.cmd_tx.clone() }

    pub fn set_energy_mode(&self, mode: EnergyMode) -> Result<(), ServiceError> {
        self.send(ServiceCommand::SetEnergyMode(mode))
    }

    pub fn set_advanced_patterns(&self, enabled: bool) -> Result<(), ServiceError> {
        self.send(ServiceCommand::SetAdvancedPatterns(enabled))
    }

    pub fn subscribe(&self, observer: Box<dyn GestureObserver>) -> Result<ObserverId, ServiceError> {
        let id = ObserverId::new();
        self.send(ServiceCommand::Subscribe(id, observer))?;
        Ok(id)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Unsubscribe(id))
    }

    pub fn clear_history(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::ClearHistory)
    }

    /// Block until every command sent so far, and the actions it queued,
    /// has been processed.
    pub fn flush(&self) -> Result<(), ServiceError> {
        let (tx, rx) = mpsc::channel();
        self.send(ServiceCommand::Flush(tx))?;
        rx.recv().map_err(|_| ServiceError::Stopped)
    }

    pub fn export(&self) -> Result<GestureExport, ServiceError> {
        let (tx, rx) = mpsc::channel();
        self.send(ServiceCommand::Export(tx))?;
        rx.recv().map_err(|_| ServiceError::Stopped)
    }

    // ── snapshots ────────────────────────────────────────────────────────

    pub fn statistics(&self) -> GestureStatistics { self.stats.snapshot() }

    /// A statistics handle that can move into an observer or another thread.
    pub fn shared_statistics(&self) -> SharedStatistics { self.stats.clone() }

    pub fn mappings(&self) -> Vec<GestureActionMapping> { self.registry.read().all().to_vec() }

    /// Mutate the mapping table; visible from the next event on.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut MappingRegistry) -> R) -> R {
        f(&mut self.registry.write())
    }

    /// Drain action reports (non-blocking). At most [`REPORT_BACKLOG`] are held.
    pub fn drain_reports(&self) -> Vec<ActionReport> {
        self.report_rx.try_iter().collect()
    }

    /// Stop both workers and return the final statistics.
    pub fn shutdown(mut self) -> GestureStatistics {
        self.stop();
        self.statistics()
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(ServiceCommand::Quit);
        for handle in [self.ingest.take(), self.action.take()].into_iter().flatten() {
            if handle.join().is_err() {
                warn!("gesture worker panicked");
            }
        }
    }
}

impl Drop for GestureService {
    fn drop(&mut self) {
        if self.ingest.is_some() || self.action.is_some() {
            self.stop();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Workers
// ════════════════════════════════════════════════════════════════════════════

fn ingest_worker(
    mut pipeline: Pipeline,
    clock:        Arc<dyn Clock>,
    cmd_rx:       Receiver<ServiceCommand>,
    job_tx:       Sender<ActionJob>,
) {
    for cmd in cmd_rx {
        match cmd {
            ServiceCommand::Frame(frame) => {
                let outcome = pipeline.submit_frame(&frame, clock.now());
                for plan in outcome.plans {
                    if job_tx.send(ActionJob::Run(plan)).is_err() {
                        warn!("action worker gone; dropping plan");
                    }
                }
            }
            ServiceCommand::SetEnergyMode(mode)    => pipeline.set_energy_mode(mode),
            ServiceCommand::SetAdvancedPatterns(b) => pipeline.set_advanced_patterns(b),
            ServiceCommand::Subscribe(id, obs)     => pipeline.bus_mut().subscribe_as(id, obs),
            ServiceCommand::Unsubscribe(id) => {
                if !pipeline.bus_mut().unsubscribe(id) {
                    debug!("unsubscribe of unknown observer {id}");
                }
            }
            ServiceCommand::ClearHistory => pipeline.reset(),
            ServiceCommand::Export(tx) => {
                if tx.send(pipeline.bus().export(clock.now())).is_err() {
                    debug!("export requester hung up");
                }
            }
            ServiceCommand::Flush(ack) => {
                if job_tx.send(ActionJob::Flush(ack)).is_err() {
                    debug!("action worker gone; flush not acknowledged");
                }
            }
            ServiceCommand::Quit => break,
        }
    }
    let _ = job_tx.send(ActionJob::Quit);
    info!("ingest worker stopped");
}

fn action_worker(
    mut executor: Box<dyn ActionExecutor>,
    job_rx:       Receiver<ActionJob>,
    report_tx:    SyncSender<ActionReport>,
) {
    let mut dropped = 0u64;
    for job in job_rx {
        match job {
            ActionJob::Run(plan) => {
                let report = execute_plan(plan, executor.as_mut());
                match report_tx.try_send(report) {
                    Ok(()) => dropped = 0,
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        if dropped == 1 {
                            debug!("report backlog full; dropping reports until drained");
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => {}
                }
            }
            ActionJob::Flush(ack) => {
                if ack.send(()).is_err() {
                    debug!("flush requester hung up");
                }
            }
            ActionJob::Quit       => break,
        }
    }
    info!("action worker stopped");
}
