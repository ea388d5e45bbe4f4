//! # gesture_window
//!
//! Sliding-window gesture classification over [`hand_pose::GestureFrame`]s.
//!
//! ## Detector tiers
//!
//! | Tier | Gestures | Needs |
//! |---|---|---|
//! | Static | fist, open hand, peace, pointing, thumbs up, three, four | 3 stable frames |
//! | Dynamic | swipes (4 directions), wave | 5 frames of history |
//! | Two-hand | clap | exactly 2 hands in the latest frame |
//! | Sequential | peace → fist → peace | 6 frames |
//! | Advanced | grab, release, OK sign, pinch | `HighPerformance` mode + landmarks |
//!
//! Static, dynamic and advanced compete for one primary slot per frame;
//! two-hand and sequential are evaluated alongside.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use gesture_window::{GestureClassifier, GestureType};
//! use hand_pose::{FeatureExtractor, LandmarkFrame, Point2};
//! use hand_pose::synthetic::{hand, Pose};
//!
//! let mut classifier = GestureClassifier::default();
//! let extractor = FeatureExtractor::default();
//! let t0 = Instant::now();
//!
//! let mut seen = Vec::new();
//! for i in 0..3 {
//!     let raw = LandmarkFrame::new(
//!         t0 + Duration::from_millis(i * 33),
//!         vec![hand(Pose::Fist, Point2::new(0.5, 0.5), 0.9)],
//!     );
//!     seen.extend(classifier.push_frame(extractor.extract_frame(&raw)));
//! }
//! assert_eq!(seen.len(), 1);
//! assert_eq!(seen[0].kind, GestureType::Fist);
//! ```

pub mod gesture;
pub mod history;
pub mod energy;
pub mod detectors;
pub mod classifier;

pub use gesture::{GestureEvent, GestureType, Tier, UnknownGesture};
pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use energy::{EnergyMode, UnknownEnergyMode};
pub use detectors::{Detection, Thresholds, PEACE_FIST_PEACE};
pub use classifier::{ClassifierConfig, GestureClassifier};
