//! Backends that actually perform an [`ActionConfiguration`].

use std::collections::HashSet;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use log::{debug, info};
use parking_lot::Mutex;

use crate::action::{ActionConfiguration, ActionKind, APP_NAME, BUNDLE_ID};
use crate::error::ActionError;

/// Performs one action. Implementations run on the action worker thread.
pub trait ActionExecutor: Send {
    fn execute(&mut self, action: &ActionConfiguration) -> Result<(), ActionError>;
}

// ════════════════════════════════════════════════════════════════════════════
// CommandExecutor — real processes
// ════════════════════════════════════════════════════════════════════════════

/// Shells out through `sh -c` and the platform opener.
///
/// Commands are spawned and reaped on a helper thread unless
/// `capture_output` is set, in which case the call waits and logs the output.
#[derive(Clone, Debug, Default)]
pub struct CommandExecutor;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

impl CommandExecutor {
    pub fn new() -> Self { CommandExecutor }

    fn open_app(&self, action: &ActionConfiguration) -> Result<Command, ActionError> {
        let app    = action.parameter(APP_NAME);
        let bundle = action.parameter(BUNDLE_ID);
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new(OPENER);
            match (bundle, app) {
                (Some(b), _)    => { cmd.args(["-b", b]); }
                (None, Some(a)) => { cmd.args(["-a", a]); }
                (None, None)    => return Err(missing(action)),
            }
            Ok(cmd)
        } else {
            let program = app.or(bundle).ok_or_else(|| missing(action))?;
            Ok(Command::new(program))
        }
    }

    fn build(&self, action: &ActionConfiguration) -> Result<Command, ActionError> {
        let target = action.target().ok_or_else(|| missing(action))?;
        match action.kind {
            ActionKind::OpenApp => self.open_app(action),
            ActionKind::OpenUrl => {
                let mut cmd = Command::new(OPENER);
                cmd.arg(target);
                Ok(cmd)
            }
            ActionKind::ShellCommand => {
                let mut cmd = Command::new("sh");
                cmd.args(["-c", target]);
                Ok(cmd)
            }
            ActionKind::RunShortcut => {
                let mut cmd = Command::new("shortcuts");
                cmd.args(["run", target]);
                Ok(cmd)
            }
        }
    }
}

fn missing(action: &ActionConfiguration) -> ActionError {
    ActionError::MissingParameter { action: action.kind, key: action.kind.primary_key() }
}

fn spawn_error(program: &str, e: io::Error) -> ActionError {
    match e.kind() {
        io::ErrorKind::NotFound => ActionError::TargetNotFound(program.to_string()),
        _                       => ActionError::ExecutionFailed(format!("{program}: {e}")),
    }
}

impl ActionExecutor for CommandExecutor {
    fn execute(&mut self, action: &ActionConfiguration) -> Result<(), ActionError> {
        let mut cmd = self.build(action)?;
        let program = cmd.get_program().to_string_lossy().into_owned();

        if action.capture_output() {
            let out = cmd.output().map_err(|e| spawn_error(&program, e))?;
            let text = String::from_utf8_lossy(&out.stdout);
            if !text.trim().is_empty() {
                info!("{} output:\n{}", action.name, text.trim_end());
            }
            if !out.status.success() {
                return Err(ActionError::ExecutionFailed(format!("{} exited with {}", action.name, out.status)));
            }
            return Ok(());
        }

        let mut child = cmd
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(&program, e))?;
        let name = action.name.clone();
        thread::spawn(move || {
            if let Ok(status) = child.wait() {
                debug!("{name} finished: {status}");
            }
        });
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DryRunExecutor — log only
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct DryRunExecutor;

impl ActionExecutor for DryRunExecutor {
    fn execute(&mut self, action: &ActionConfiguration) -> Result<(), ActionError> {
        info!("[dry run] {} ({}): {}", action.name, action.kind, action.target().unwrap_or("-"));
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingExecutor — for tests
// ════════════════════════════════════════════════════════════════════════════

/// Records every executed action. Clones share one log.
#[derive(Clone, Debug, Default)]
pub struct RecordingExecutor {
    log:     Arc<Mutex<Vec<ActionConfiguration>>>,
    failing: HashSet<ActionKind>,
}

impl RecordingExecutor {
    pub fn new() -> Self { RecordingExecutor::default() }

    /// Fail every action of `kind` with `ExecutionFailed` (nothing recorded).
    pub fn failing_on(mut self, kind: ActionKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn executed(&self) -> Vec<ActionConfiguration> { self.log.lock().clone() }

    pub fn names(&self) -> Vec<String> {
        self.log.lock().iter().map(|a| a.name.clone()).collect()
    }

    pub fn count(&self) -> usize { self.log.lock().len() }
}

impl ActionExecutor for RecordingExecutor {
    fn execute(&mut self, action: &ActionConfiguration) -> Result<(), ActionError> {
        if self.failing.contains(&action.kind) {
            return Err(ActionError::ExecutionFailed(format!("{} refused", action.name)));
        }
        self.log.lock().push(action.clone());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
