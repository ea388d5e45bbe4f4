//! Synthetic 21-joint hands for simulation and tests.
//!
//! Every pose is laid out around a chosen palm center so that
//! [`palm_center`](crate::features::palm_center) returns exactly that point and
//! the extension rules report exactly [`Pose::fingers`].
//!
//! Layout, relative to the palm center `P` (y up):
//!
//! * wrist at `P + (0, -0.08)`, MCPs at `y + 0.02`, x = −0.03 / −0.01 / +0.01 / +0.03
//! * extended finger: PIP/DIP/TIP at +0.03 / +0.05 / +0.07 above its MCP
//! * curled finger: PIP +0.03, DIP +0.01, TIP level with the MCP
//! * thumb chain CMC → MP → IP runs down-left of the palm; an extended thumb
//!   tip sits 0.04 further out, a curled one tucks 0.01 back in
//! * pinch / ok: the index curls toward the thumb and the two tips meet

use crate::features::FingerStates;
use crate::landmark::{HandObservation, Joint, Point2, JOINT_COUNT};

/// Per-joint confidence given to every synthetic joint.
pub const SYNTHETIC_JOINT_CONFIDENCE: f64 = 0.95;

/// Named hand shapes the generator can lay out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pose {
    Fist,
    Open,
    Point,
    ThumbsUp,
    Peace,
    ThreeFingers,
    FourFingers,
    /// Thumb and little finger out; matches no static rule.
    Shaka,
    /// Thumb and index tips 0.035 apart, middle/ring/little extended.
    Pinch,
    /// Thumb and index tips touching, middle/ring/little extended.
    OkSign,
}

impl Pose {
    pub const ALL: [Pose; 10] = [
        Pose::Fist, Pose::Open, Pose::Point, Pose::ThumbsUp, Pose::Peace,
        Pose::ThreeFingers, Pose::FourFingers, Pose::Shaka, Pose::Pinch, Pose::OkSign,
    ];

    /// The extension flags feature extraction reports for this pose.
    pub fn fingers(self) -> FingerStates {
        match self {
            Pose::Fist         => FingerStates::none(),
            Pose::Open         => FingerStates::all(),
            Pose::Point        => FingerStates::new(false, true,  false, false, false),
            Pose::ThumbsUp     => FingerStates::new(true,  false, false, false, false),
            Pose::Peace        => FingerStates::new(false, true,  true,  false, false),
            Pose::ThreeFingers => FingerStates::new(false, true,  true,  true,  false),
            Pose::FourFingers  => FingerStates::new(false, true,  true,  true,  true),
            Pose::Shaka        => FingerStates::new(true,  false, false, false, true),
            Pose::Pinch |
            Pose::OkSign       => FingerStates::new(false, false, true,  true,  true),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pose::Fist         => "fist",
            Pose::Open         => "open",
            Pose::Point        => "point",
            Pose::ThumbsUp     => "thumbs_up",
            Pose::Peace        => "peace",
            Pose::ThreeFingers => "three",
            Pose::FourFingers  => "four",
            Pose::Shaka        => "shaka",
            Pose::Pinch        => "pinch",
            Pose::OkSign       => "ok",
        }
    }

    pub fn from_name(name: &str) -> Option<Pose> {
        Pose::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// The 21 landmark positions of `pose` centered on `palm`.
pub fn hand_points(pose: Pose, palm: Point2) -> [Point2; JOINT_COUNT] {
    let mut pts = [Point2::ZERO; JOINT_COUNT];
    let mut put = |j: Joint, dx: f64, dy: f64| pts[j.index()] = palm.offset(dx, dy);
    let flags = pose.fingers();

    put(Joint::Wrist, 0.0, -0.08);

    // ── four fingers ────────────────────────────────────────────────────
    let fingers = [
        (flags.index,  -0.03, [Joint::IndexMcp,  Joint::IndexPip,  Joint::IndexDip,  Joint::IndexTip]),
        (flags.middle, -0.01, [Joint::MiddleMcp, Joint::MiddlePip, Joint::MiddleDip, Joint::MiddleTip]),
        (flags.ring,    0.01, [Joint::RingMcp,   Joint::RingPip,   Joint::RingDip,   Joint::RingTip]),
        (flags.little,  0.03, [Joint::LittleMcp, Joint::LittlePip, Joint::LittleDip, Joint::LittleTip]),
    ];
    for (extended, x, [mcp, pip, dip, tip]) in fingers {
        put(mcp, x, 0.02);
        put(pip, x, 0.05);
        if extended {
            put(dip, x, 0.07);
            put(tip, x, 0.09);
        } else {
            put(dip, x, 0.03);
            put(tip, x, 0.02);
        }
    }

    // ── thumb ───────────────────────────────────────────────────────────
    put(Joint::ThumbCmc, -0.05, -0.05);
    put(Joint::ThumbMp,  -0.06, -0.03);
    put(Joint::ThumbIp,  -0.07, -0.01);
    if flags.thumb {
        put(Joint::ThumbTip, -0.11, 0.00);
    } else {
        put(Joint::ThumbTip, -0.06, 0.00);
    }

    // ── index curled onto the thumb ─────────────────────────────────────
    if matches!(pose, Pose::Pinch | Pose::OkSign) {
        put(Joint::IndexDip, -0.05,  0.045);
        put(Joint::IndexTip, -0.065, 0.03);
        match pose {
            Pose::OkSign => put(Joint::ThumbTip, -0.075,  0.03),
            _            => put(Joint::ThumbTip, -0.065, -0.005),
        }
    }

    pts
}

/// A full synthetic observation of `pose` at `palm`.
pub fn hand(pose: Pose, palm: Point2, confidence: f64) -> HandObservation {
    HandObservation::from_points(&hand_points(pose, palm), SYNTHETIC_JOINT_CONFIDENCE, confidence)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
