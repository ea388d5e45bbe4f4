//! # gesture_actions
//!
//! What happens when a gesture is recognized: configured actions, the
//! gesture → action table, and a dispatcher that gates each event by the
//! mapping's confidence floor and a per-gesture debounce before handing the
//! actions to an [`ActionExecutor`].
//!
//! ## Action kinds
//!
//! | Tag | Required parameter | Optional |
//! |---|---|---|
//! | `open_app` | `app_name` or `bundle_id` | the other one |
//! | `open_url` | `url` | |
//! | `shell_command` | `command` | `capture_output` |
//! | `run_shortcut` | `shortcut_name` | |
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use gesture_actions::{Dispatcher, MappingRegistry, RecordingExecutor};
//! use gesture_window::{GestureEvent, GestureType};
//! use hand_pose::{FeatureExtractor, Point2};
//! use hand_pose::synthetic::{hand, Pose};
//!
//! let mut registry = MappingRegistry::new();
//! registry.map_to_open_url(GestureType::PeaceSign, "Docs", "https://docs.rs", 0.7);
//!
//! let features = FeatureExtractor::default()
//!     .extract(&hand(Pose::Peace, Point2::new(0.5, 0.5), 0.9))
//!     .unwrap();
//! let now = Instant::now();
//! let event = GestureEvent::new(GestureType::PeaceSign, 0.9, now, features);
//!
//! let mut executor = RecordingExecutor::new();
//! let report = Dispatcher::default().dispatch(&registry, &event, now, &mut executor);
//! assert_eq!(report.executed, 1);
//! ```

pub mod error;
pub mod action;
pub mod mapping;
pub mod executor;
pub mod dispatcher;
pub mod config;

pub use error::{ActionError, ConfigError};
pub use action::{ActionConfiguration, ActionKind, UnknownActionKind};
pub use mapping::{GestureActionMapping, MappingRegistry, DEFAULT_MIN_CONFIDENCE};
pub use executor::{ActionExecutor, CommandExecutor, DryRunExecutor, RecordingExecutor};
pub use dispatcher::{execute_plan, ActionReport, DispatchPlan, Dispatcher, DEFAULT_DEBOUNCE};
pub use config::{ConfigDocument, EnergySettings, LoadedConfig, MappingRecord};
