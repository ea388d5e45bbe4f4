//! # gesture_control
//!
//! Hand-gesture control service. Landmark frames go in; recognized gestures
//! come out on an event bus, and configured actions run on a worker thread.
//!
//! ## Data flow
//!
//! ```text
//! LandmarkSource ──frames──▶ ingest worker ──plans──▶ action worker ──▶ ActionExecutor
//!                            (Pipeline:                                    │
//!                             extract → classify →                         ▼
//!                             bus → dispatcher)                      ActionReport
//! ```
//!
//! The ingest worker is the single writer of classification history, bus
//! state, statistics and debounce timers. Statistics and the mapping table
//! are readable from any thread as copied snapshots.
//!
//! ## Feature flags
//!
//! * (default): [`ScriptedSource`] replays synthetic hands.
//! * `leap`: `LeapSource` reads a real LeapMotion controller via LeapC.

pub mod clock;
pub mod settings;
pub mod stats;
pub mod bus;
pub mod pipeline;
pub mod service;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use settings::ServiceConfig;
pub use stats::{GestureStatistics, SharedStatistics, StatisticsSummary};
pub use bus::{ChannelObserver, EventBus, GestureExport, GestureObserver, GestureRecord, ObserverId};
pub use pipeline::{FrameOutcome, Pipeline};
pub use service::{GestureService, ServiceCommand, ServiceError, REPORT_BACKLOG};
pub use source::{spawn_landmark_source, LandmarkSource, ScriptedSource};
#[cfg(feature = "leap")]
pub use source::LeapSource;
