//! Per-hand feature extraction.
//!
//! [`FeatureExtractor::extract`] is a pure function of one
//! [`HandObservation`]: it either yields a [`HandFeatures`] record or nothing
//! (a required joint is missing or under the confidence floor).
//!
//! # Algorithm
//!
//! * **Palm center**: arithmetic mean of the wrist and the four finger MCPs.
//! * **Thumb**: extended iff `|tip.x − ip.x| > EXTENSION_MARGIN`; the thumb
//!   abducts sideways rather than flexing vertically.
//! * **Other fingers**: extended iff `tip.y > pip.y + EXTENSION_MARGIN`.
//! * **Orientation**: `atan2` of the wrist → middle-MCP vector.
//! * **Shape metrics**: only when `keep_landmarks` is set.

use std::f64::consts::PI;
use std::time::Instant;

use log::trace;

use crate::landmark::{HandObservation, Joint, LandmarkFrame, Point2, JOINT_COUNT};

/// Minimum tip/PIP separation (normalized units) for a finger to count as extended.
pub const EXTENSION_MARGIN: f64 = 0.02;

/// Joints below this confidence make the whole hand unusable.
pub const MIN_JOINT_CONFIDENCE: f64 = 0.3;

// ════════════════════════════════════════════════════════════════════════════
// FingerStates
// ════════════════════════════════════════════════════════════════════════════

/// Extension flags for the five fingers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerStates {
    pub thumb:  bool,
    pub index:  bool,
    pub middle: bool,
    pub ring:   bool,
    pub little: bool,
}

impl FingerStates {
    pub fn new(thumb: bool, index: bool, middle: bool, ring: bool, little: bool) -> Self {
        FingerStates { thumb, index, middle, ring, little }
    }

    /// All five extended.
    pub fn all() -> Self { FingerStates::new(true, true, true, true, true) }

    /// None extended.
    pub fn none() -> Self { FingerStates::default() }

    /// Flags in thumb → little order.
    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.little]
    }

    /// Count of extended fingers, always in `0..=5`.
    pub fn extended_count(&self) -> usize {
        self.as_array().iter().filter(|f| **f).count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShapeMetrics
// ════════════════════════════════════════════════════════════════════════════

/// Optional shape measurements; all zero when not computed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapeMetrics {
    /// Thumb tip → little tip distance.
    pub span:      f64,
    /// Mean of index↔middle and middle↔ring tip distances.
    pub spread:    f64,
    /// Deviation of the index finger from straight, in radians.
    pub curvature: f64,
}

// ════════════════════════════════════════════════════════════════════════════
// HandFeatures / GestureFrame
// ════════════════════════════════════════════════════════════════════════════

/// The derived summary of one hand that every detector consumes.
///
/// `landmarks` is only populated when the extractor keeps them (advanced
/// detection); the struct shape is identical either way.
#[derive(Clone, Debug, PartialEq)]
pub struct HandFeatures {
    pub palm_center: Point2,
    pub fingers:     FingerStates,
    /// Radians, wrist → middle MCP.
    pub orientation: f64,
    pub confidence:  f64,
    pub landmarks:   Option<Vec<Point2>>,
    pub metrics:     ShapeMetrics,
}

impl HandFeatures {
    pub fn extended_count(&self) -> usize { self.fingers.extended_count() }

    /// A retained landmark, if landmarks were kept.
    pub fn landmark(&self, joint: Joint) -> Option<Point2> {
        self.landmarks.as_ref().and_then(|l| l.get(joint.index()).copied())
    }
}

/// One processed camera frame: 0–2 feature records in detection order.
#[derive(Clone, Debug)]
pub struct GestureFrame {
    pub timestamp: Instant,
    pub hands:     Vec<HandFeatures>,
}

impl GestureFrame {
    pub fn new(timestamp: Instant, hands: Vec<HandFeatures>) -> Self {
        GestureFrame { timestamp, hands }
    }

    pub fn first_hand(&self) -> Option<&HandFeatures> { self.hands.first() }

    pub fn is_empty(&self) -> bool { self.hands.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// FeatureExtractor
// ════════════════════════════════════════════════════════════════════════════

/// Converts raw observations into [`HandFeatures`].
#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    /// Every one of the 21 joints must reach this confidence.
    pub min_joint_confidence: f64,
    /// The observation as a whole must reach this confidence.
    pub min_hand_confidence:  f64,
    /// Keep the raw landmark list and compute [`ShapeMetrics`].
    pub keep_landmarks:       bool,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        FeatureExtractor {
            min_joint_confidence: MIN_JOINT_CONFIDENCE,
            min_hand_confidence:  MIN_JOINT_CONFIDENCE,
            keep_landmarks:       false,
        }
    }
}

impl FeatureExtractor {
    pub fn new(keep_landmarks: bool) -> Self {
        FeatureExtractor { keep_landmarks, ..FeatureExtractor::default() }
    }

    /// Extract one hand, or `None` if any required joint is absent or weak.
    pub fn extract(&self, obs: &HandObservation) -> Option<HandFeatures> {
        if obs.confidence < self.min_hand_confidence {
            trace!("hand dropped: confidence {:.2} below floor", obs.confidence);
            return None;
        }

        let mut points = [Point2::ZERO; JOINT_COUNT];
        for joint in Joint::ALL {
            match obs.joint(joint) {
                Some(s) if s.confidence >= self.min_joint_confidence => {
                    points[joint.index()] = s.location;
                }
                _ => {
                    trace!("hand dropped: joint {} missing or weak", joint.name());
                    return None;
                }
            }
        }

        let (landmarks, metrics) = if self.keep_landmarks {
            (Some(points.to_vec()), shape_metrics(&points))
        } else {
            (None, ShapeMetrics::default())
        };

        Some(HandFeatures {
            palm_center: palm_center(&points),
            fingers:     finger_states(&points),
            orientation: orientation(&points),
            confidence:  obs.confidence,
            landmarks,
            metrics,
        })
    }

    /// Extract every usable hand of a frame, preserving detection order.
    pub fn extract_frame(&self, frame: &LandmarkFrame) -> GestureFrame {
        let hands = frame.hands.iter().filter_map(|h| self.extract(h)).collect();
        GestureFrame::new(frame.timestamp, hands)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

fn at(points: &[Point2; JOINT_COUNT], joint: Joint) -> Point2 {
    points[joint.index()]
}

/// Mean of wrist and the four finger MCPs.
pub fn palm_center(points: &[Point2; JOINT_COUNT]) -> Point2 {
    let anchors = [
        Joint::Wrist, Joint::IndexMcp, Joint::MiddleMcp, Joint::RingMcp, Joint::LittleMcp,
    ];
    let (sx, sy) = anchors.iter()
        .map(|j| at(points, *j))
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2::new(sx / anchors.len() as f64, sy / anchors.len() as f64)
}

pub fn finger_states(points: &[Point2; JOINT_COUNT]) -> FingerStates {
    let thumb = (at(points, Joint::ThumbTip).x - at(points, Joint::ThumbIp).x).abs() > EXTENSION_MARGIN;
    let raised = |tip: Joint, pip: Joint| at(points, tip).y > at(points, pip).y + EXTENSION_MARGIN;

    FingerStates {
        thumb,
        index:  raised(Joint::IndexTip,  Joint::IndexPip),
        middle: raised(Joint::MiddleTip, Joint::MiddlePip),
        ring:   raised(Joint::RingTip,   Joint::RingPip),
        little: raised(Joint::LittleTip, Joint::LittlePip),
    }
}

/// Angle of the wrist → middle-MCP vector, in radians.
pub fn orientation(points: &[Point2; JOINT_COUNT]) -> f64 {
    let w = at(points, Joint::Wrist);
    let m = at(points, Joint::MiddleMcp);
    (m.y - w.y).atan2(m.x - w.x)
}

pub fn shape_metrics(points: &[Point2; JOINT_COUNT]) -> ShapeMetrics {
    let span = at(points, Joint::ThumbTip).distance(at(points, Joint::LittleTip));

    let index  = at(points, Joint::IndexTip);
    let middle = at(points, Joint::MiddleTip);
    let ring   = at(points, Joint::RingTip);
    let spread = (index.distance(middle) + middle.distance(ring)) / 2.0;

    let bend = angle_at(
        at(points, Joint::IndexMcp),
        at(points, Joint::IndexPip),
        at(points, Joint::IndexTip),
    );

    ShapeMetrics { span, spread, curvature: (bend - PI).abs() }
}

/// Interior angle at `vertex` formed by `a` and `c`; 0 for degenerate input.
fn angle_at(a: Point2, vertex: Point2, c: Point2) -> f64 {
    let v1 = (a.x - vertex.x, a.y - vertex.y);
    let v2 = (c.x - vertex.x, c.y - vertex.y);
    let m1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let m2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if m1 <= 0.0 || m2 <= 0.0 { return 0.0; }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (m1 * m2)).clamp(-1.0, 1.0);
    cos.acos()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
