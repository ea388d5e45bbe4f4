//! Raw landmark observations, as produced by the pose-estimation side.
//!
//! A [`LandmarkFrame`] is immutable once built: a timestamp plus up to
//! [`MAX_HANDS`] [`HandObservation`]s, each holding whatever subset of the 21
//! named joints the estimator managed to locate.

use std::time::Instant;

/// Number of named joints per hand.
pub const JOINT_COUNT: usize = 21;

/// A frame never carries more than two hands; extras are dropped on construction.
pub const MAX_HANDS: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Point2
// ════════════════════════════════════════════════════════════════════════════

/// A point in normalized image space (`y` up).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ZERO: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self { Point2 { x, y } }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Component-wise offset.
    pub fn offset(self, dx: f64, dy: f64) -> Point2 {
        Point2 { x: self.x + dx, y: self.y + dy }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Joint — the 21 named hand joints
// ════════════════════════════════════════════════════════════════════════════

/// Named hand joints, in the conventional 21-point order
/// (wrist, then thumb → little finger, base → tip).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    Wrist,
    ThumbCmc,   ThumbMp,   ThumbIp,   ThumbTip,
    IndexMcp,   IndexPip,  IndexDip,  IndexTip,
    MiddleMcp,  MiddlePip, MiddleDip, MiddleTip,
    RingMcp,    RingPip,   RingDip,   RingTip,
    LittleMcp,  LittlePip, LittleDip, LittleTip,
}

impl Joint {
    /// Every joint, in index order.
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Wrist,
        Joint::ThumbCmc,  Joint::ThumbMp,   Joint::ThumbIp,   Joint::ThumbTip,
        Joint::IndexMcp,  Joint::IndexPip,  Joint::IndexDip,  Joint::IndexTip,
        Joint::MiddleMcp, Joint::MiddlePip, Joint::MiddleDip, Joint::MiddleTip,
        Joint::RingMcp,   Joint::RingPip,   Joint::RingDip,   Joint::RingTip,
        Joint::LittleMcp, Joint::LittlePip, Joint::LittleDip, Joint::LittleTip,
    ];

    /// Position of this joint in a 21-element landmark array.
    pub fn index(self) -> usize { self as usize }

    pub fn name(self) -> &'static str {
        match self {
            Joint::Wrist     => "wrist",
            Joint::ThumbCmc  => "thumb_cmc",
            Joint::ThumbMp   => "thumb_mp",
            Joint::ThumbIp   => "thumb_ip",
            Joint::ThumbTip  => "thumb_tip",
            Joint::IndexMcp  => "index_mcp",
            Joint::IndexPip  => "index_pip",
            Joint::IndexDip  => "index_dip",
            Joint::IndexTip  => "index_tip",
            Joint::MiddleMcp => "middle_mcp",
            Joint::MiddlePip => "middle_pip",
            Joint::MiddleDip => "middle_dip",
            Joint::MiddleTip => "middle_tip",
            Joint::RingMcp   => "ring_mcp",
            Joint::RingPip   => "ring_pip",
            Joint::RingDip   => "ring_dip",
            Joint::RingTip   => "ring_tip",
            Joint::LittleMcp => "little_mcp",
            Joint::LittlePip => "little_pip",
            Joint::LittleDip => "little_dip",
            Joint::LittleTip => "little_tip",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// One located joint with the estimator's confidence for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointSample {
    pub location:   Point2,
    pub confidence: f64,
}

/// One detected hand: a sparse set of joints plus an overall confidence.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    joints:         [Option<JointSample>; JOINT_COUNT],
    pub confidence: f64,
}

impl HandObservation {
    /// An observation with no joints located yet.
    pub fn new(confidence: f64) -> Self {
        HandObservation { joints: [None; JOINT_COUNT], confidence }
    }

    /// Build from a full 21-point array in [`Joint::ALL`] order, every joint
    /// sharing `joint_confidence`.
    pub fn from_points(points: &[Point2; JOINT_COUNT], joint_confidence: f64, confidence: f64) -> Self {
        let mut obs = HandObservation::new(confidence);
        for (joint, p) in Joint::ALL.iter().zip(points.iter()) {
            obs.set_joint(*joint, *p, joint_confidence);
        }
        obs
    }

    pub fn set_joint(&mut self, joint: Joint, location: Point2, confidence: f64) {
        self.joints[joint.index()] = Some(JointSample { location, confidence });
    }

    /// Builder form of [`set_joint`](Self::set_joint).
    pub fn with_joint(mut self, joint: Joint, location: Point2, confidence: f64) -> Self {
        self.set_joint(joint, location, confidence);
        self
    }

    /// Forget a joint, as if the estimator never located it.
    pub fn clear_joint(&mut self, joint: Joint) {
        self.joints[joint.index()] = None;
    }

    pub fn joint(&self, joint: Joint) -> Option<&JointSample> {
        self.joints[joint.index()].as_ref()
    }

    /// Number of joints present.
    pub fn located(&self) -> usize {
        self.joints.iter().filter(|j| j.is_some()).count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame
// ════════════════════════════════════════════════════════════════════════════

/// A timestamped set of 0–2 hand observations.
#[derive(Clone, Debug)]
pub struct LandmarkFrame {
    pub timestamp: Instant,
    pub hands:     Vec<HandObservation>,
}

impl LandmarkFrame {
    pub fn new(timestamp: Instant, mut hands: Vec<HandObservation>) -> Self {
        hands.truncate(MAX_HANDS);
        LandmarkFrame { timestamp, hands }
    }

    /// A frame in which nothing was detected.
    pub fn empty(timestamp: Instant) -> Self {
        LandmarkFrame { timestamp, hands: Vec::new() }
    }

    pub fn is_empty(&self) -> bool { self.hands.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
