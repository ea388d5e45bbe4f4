//! Error types for action execution and configuration loading.

use std::io;

use thiserror::Error;

use crate::action::ActionKind;

/// Why one action could not be performed. Never fatal to the dispatcher.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{action} action is missing required parameter `{key}`")]
    MissingParameter { action: ActionKind, key: &'static str },

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// A configuration document, or one record of it, was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value `{value}` for field `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("unknown gesture id `{0}`")]
    UnknownGesture(String),

    #[error("unknown action type `{0}`")]
    UnknownActionKind(String),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
