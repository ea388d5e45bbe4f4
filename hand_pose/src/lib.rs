//! # hand_pose
//!
//! The landmark data model delivered by a pose-estimation collaborator, and
//! the per-hand feature extractor that turns 21 named joints into the compact
//! [`HandFeatures`] record every gesture detector works from.
//!
//! Coordinates are normalized image space in `[0, 1]` with **y growing
//! upward**, so "finger tip above the PIP joint" means a larger `y`.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Instant;
//! use hand_pose::{FeatureExtractor, LandmarkFrame, Point2};
//! use hand_pose::synthetic::{hand, Pose};
//!
//! let frame = LandmarkFrame::new(
//!     Instant::now(),
//!     vec![hand(Pose::Peace, Point2::new(0.5, 0.5), 0.9)],
//! );
//!
//! let features = FeatureExtractor::default().extract_frame(&frame);
//! assert_eq!(features.hands.len(), 1);
//! assert_eq!(features.hands[0].extended_count(), 2);
//! ```

pub mod landmark;
pub mod features;
pub mod synthetic;

pub use landmark::{HandObservation, Joint, JointSample, LandmarkFrame, Point2, JOINT_COUNT, MAX_HANDS};
pub use features::{
    FeatureExtractor, FingerStates, GestureFrame, HandFeatures, ShapeMetrics,
    EXTENSION_MARGIN, MIN_JOINT_CONFIDENCE,
};
