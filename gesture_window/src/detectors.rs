//! The individual detectors. Each is a pure function over the history
//! window (or its latest frame) returning at most one [`Detection`].

use std::f64::consts::{FRAC_PI_4, PI};
use std::time::Instant;

use hand_pose::{FingerStates, GestureFrame, HandFeatures, Joint, EXTENSION_MARGIN};

use crate::gesture::{GestureEvent, GestureType};
use crate::history::HistoryBuffer;

// ════════════════════════════════════════════════════════════════════════════
// Thresholds
// ════════════════════════════════════════════════════════════════════════════

/// Distance thresholds, in normalized image units.
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    /// Palm travel over the dynamic window needed for a swipe.
    pub swipe_distance: f64,
    /// Palms closer than this (both open) make a clap.
    pub clap_distance:  f64,
    /// Thumb tip ↔ index tip for a pinch.
    pub pinch_distance: f64,
    /// Thumb tip ↔ index tip for an OK sign.
    pub ok_distance:    f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            swipe_distance: 0.15,
            clap_distance:  0.10,
            pinch_distance: 0.04,
            ok_distance:    0.03,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Detection
// ════════════════════════════════════════════════════════════════════════════

/// A detector hit, borrowing the hand that produced it.
#[derive(Clone, Copy, Debug)]
pub struct Detection<'a> {
    pub kind:       GestureType,
    pub confidence: f64,
    pub hand:       &'a HandFeatures,
}

impl<'a> Detection<'a> {
    fn of(kind: GestureType, hand: &'a HandFeatures) -> Self {
        Detection { kind, confidence: hand.confidence, hand }
    }

    pub fn into_event(self, timestamp: Instant) -> GestureEvent {
        GestureEvent::new(self.kind, self.confidence, timestamp, self.hand.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Static poses
// ════════════════════════════════════════════════════════════════════════════

type FingerRule = fn(&FingerStates) -> bool;

/// Ordered pose rules; the first match wins.
const STATIC_RULES: [(GestureType, FingerRule); 7] = [
    (GestureType::Fist,           |f| f.extended_count() == 0),
    (GestureType::OpenHand,       |f| f.extended_count() == 5),
    (GestureType::PeaceSign,      |f| f.index && f.middle && !f.ring && !f.little),
    (GestureType::PointingFinger, |f| f.index && !f.middle && !f.ring && !f.little),
    (GestureType::ThumbsUp,       |f| f.thumb && !f.index && !f.middle && !f.ring && !f.little),
    (GestureType::ThreeFingers,   |f| f.index && f.middle && f.ring && !f.little),
    (GestureType::FourFingers,    |f| !f.thumb && f.index && f.middle && f.ring && f.little),
];

/// Name a finger configuration, if any rule matches.
pub fn classify_static(fingers: &FingerStates) -> Option<GestureType> {
    STATIC_RULES.iter()
        .find(|(_, rule)| rule(fingers))
        .map(|(kind, _)| *kind)
}

/// True when each of the last `frames` frames has a first hand and all of
/// them share one extended-finger count.
pub fn is_stable(history: &HistoryBuffer, frames: usize) -> bool {
    if frames == 0 || history.len() < frames { return false; }
    let counts = history.first_hand_counts(frames);
    counts.len() == frames && counts.windows(2).all(|w| w[0] == w[1])
}

/// Classify the latest frame's first hand, provided the pose is stable.
pub fn detect_static(history: &HistoryBuffer, stability_frames: usize) -> Option<Detection<'_>> {
    if !is_stable(history, stability_frames) { return None; }
    let hand = history.latest()?.first_hand()?;
    classify_static(&hand.fingers).map(|kind| Detection::of(kind, hand))
}

// ════════════════════════════════════════════════════════════════════════════
// Motion
// ════════════════════════════════════════════════════════════════════════════

/// Bucket a displacement angle into a swipe direction.
///
/// Right within ±π/4 of 0, left within π/4 of +π, up in (π/4, 3π/4),
/// down otherwise. `atan2` reports leftward motion with any downward drift
/// near −π, so that lands in down.
pub fn swipe_direction(dx: f64, dy: f64) -> GestureType {
    let dir = dy.atan2(dx);
    if dir.abs() < FRAC_PI_4 {
        GestureType::SwipeRight
    } else if (dir - PI).abs() < FRAC_PI_4 {
        GestureType::SwipeLeft
    } else if dir > FRAC_PI_4 && dir < 3.0 * FRAC_PI_4 {
        GestureType::SwipeUp
    } else {
        GestureType::SwipeDown
    }
}

/// Palm displacement of the first hand from the first to the last frame.
pub fn detect_swipe<'a>(frames: &[&'a GestureFrame], min_distance: f64) -> Option<Detection<'a>> {
    let first = frames.first()?.first_hand()?;
    let last  = frames.last()?.first_hand()?;

    let dx = last.palm_center.x - first.palm_center.x;
    let dy = last.palm_center.y - first.palm_center.y;
    if (dx * dx + dy * dy).sqrt() <= min_distance { return None; }

    Some(Detection::of(swipe_direction(dx, dy), last))
}

/// At least one local extremum in the first hand's palm x.
pub fn detect_wave<'a>(frames: &[&'a GestureFrame]) -> Option<Detection<'a>> {
    let xs: Vec<f64> = frames.iter()
        .filter_map(|f| f.first_hand().map(|h| h.palm_center.x))
        .collect();
    if xs.len() < frames.len().max(3) { return None; }

    let oscillations = xs.windows(3)
        .filter(|w| (w[1] > w[0] && w[1] > w[2]) || (w[1] < w[0] && w[1] < w[2]))
        .count();
    if oscillations == 0 { return None; }

    let last = frames.last()?.first_hand()?;
    Some(Detection::of(GestureType::Wave, last))
}

// ════════════════════════════════════════════════════════════════════════════
// Two hands
// ════════════════════════════════════════════════════════════════════════════

/// Both palms open and close together. Confidence is the weaker hand's.
pub fn detect_two_hand(frame: &GestureFrame, clap_distance: f64) -> Option<Detection<'_>> {
    let [a, b] = frame.hands.as_slice() else { return None };

    let close = a.palm_center.distance(b.palm_center) < clap_distance;
    if close && a.extended_count() == 5 && b.extended_count() == 5 {
        return Some(Detection {
            kind:       GestureType::TwoHandClap,
            confidence: a.confidence.min(b.confidence),
            hand:       a,
        });
    }
    None
}

// ════════════════════════════════════════════════════════════════════════════
// Sequences
// ════════════════════════════════════════════════════════════════════════════

/// The finger-count pattern for peace → fist → peace.
pub const PEACE_FIST_PEACE: [usize; 6] = [2, 2, 0, 0, 2, 2];

/// Exact match of the first hand's finger counts over the last
/// `pattern.len()` frames.
pub fn detect_sequence<'a>(history: &'a HistoryBuffer, pattern: &[usize]) -> Option<Detection<'a>> {
    if pattern.is_empty() || history.len() < pattern.len() { return None; }
    if history.first_hand_counts(pattern.len()) != pattern { return None; }

    let hand = history.latest()?.first_hand()?;
    Some(Detection::of(GestureType::SequencePeaceFistPeace, hand))
}

// ════════════════════════════════════════════════════════════════════════════
// Advanced patterns
// ════════════════════════════════════════════════════════════════════════════

/// Open hand (≥4 fingers) closing to a fist between the last two frames,
/// or the reverse.
pub fn detect_grab_release(history: &HistoryBuffer) -> Option<Detection<'_>> {
    let before = history.previous()?.first_hand()?.extended_count();
    let hand   = history.latest()?.first_hand()?;
    let now    = hand.extended_count();

    match (before, now) {
        (b, 0) if b >= 4 => Some(Detection::of(GestureType::Grab, hand)),
        (0, n) if n >= 4 => Some(Detection::of(GestureType::Release, hand)),
        _ => None,
    }
}

fn thumb_index_gap(hand: &HandFeatures) -> Option<f64> {
    let thumb = hand.landmark(Joint::ThumbTip)?;
    let index = hand.landmark(Joint::IndexTip)?;
    Some(thumb.distance(index))
}

/// Thumb and index tips touching with the middle finger raised.
/// Needs retained landmarks.
pub fn detect_ok_sign(frame: &GestureFrame, ok_distance: f64) -> Option<Detection<'_>> {
    let hand = frame.first_hand()?;
    let gap  = thumb_index_gap(hand)?;
    let middle_raised = hand.landmark(Joint::MiddleTip)?.y
        > hand.landmark(Joint::MiddlePip)?.y + EXTENSION_MARGIN;

    (gap < ok_distance && middle_raised).then(|| Detection::of(GestureType::OkSign, hand))
}

/// Thumb and index tips close. Needs retained landmarks.
pub fn detect_pinch(frame: &GestureFrame, pinch_distance: f64) -> Option<Detection<'_>> {
    let hand = frame.first_hand()?;
    let gap  = thumb_index_gap(hand)?;
    (gap < pinch_distance).then(|| Detection::of(GestureType::Pinch, hand))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::synthetic::{hand, Pose};
    use hand_pose::{FeatureExtractor, LandmarkFrame, Point2};
    use std::time::Duration;

    fn frame(t: Instant, hands: &[(Pose, f64, f64)], keep: bool) -> GestureFrame {
        let obs = hands.iter().map(|(p, x, y)| hand(*p, Point2::new(*x, *y), 0.9)).collect();
        FeatureExtractor::new(keep).extract_frame(&LandmarkFrame::new(t, obs))
    }

    fn history_of(poses: &[(Pose, f64, f64)]) -> HistoryBuffer {
        let t0 = Instant::now();
        let mut h = HistoryBuffer::default();
        for (i, p) in poses.iter().enumerate() {
            h.push(frame(t0 + Duration::from_millis(i as u64 * 33), &[*p], true));
        }
        h
    }

    #[test]
    fn static_rules_first_match_wins() {
        assert_eq!(classify_static(&Pose::Fist.fingers()),         Some(GestureType::Fist));
        assert_eq!(classify_static(&Pose::Open.fingers()),         Some(GestureType::OpenHand));
        assert_eq!(classify_static(&Pose::Peace.fingers()),        Some(GestureType::PeaceSign));
        assert_eq!(classify_static(&Pose::Point.fingers()),        Some(GestureType::PointingFinger));
        assert_eq!(classify_static(&Pose::ThumbsUp.fingers()),     Some(GestureType::ThumbsUp));
        assert_eq!(classify_static(&Pose::ThreeFingers.fingers()), Some(GestureType::ThreeFingers));
        assert_eq!(classify_static(&Pose::FourFingers.fingers()),  Some(GestureType::FourFingers));
        assert_eq!(classify_static(&Pose::Shaka.fingers()),        None);
        // Thumb + index + middle: peace rule ignores the thumb.
        let f = FingerStates::new(true, true, true, false, false);
        assert_eq!(classify_static(&f), Some(GestureType::PeaceSign));
    }

    #[test]
    fn stability_needs_identical_counts() {
        let h = history_of(&[(Pose::Fist, 0.5, 0.5), (Pose::Fist, 0.5, 0.5)]);
        assert!(!is_stable(&h, 3));

        let h = history_of(&[(Pose::Fist, 0.5, 0.5); 3]);
        assert!(is_stable(&h, 3));
        assert_eq!(detect_static(&h, 3).map(|d| d.kind), Some(GestureType::Fist));

        let h = history_of(&[(Pose::Fist, 0.5, 0.5), (Pose::Fist, 0.5, 0.5), (Pose::Point, 0.5, 0.5)]);
        assert!(!is_stable(&h, 3));
    }

    #[test]
    fn swipe_directions() {
        assert_eq!(swipe_direction( 0.2,  0.0),  GestureType::SwipeRight);
        assert_eq!(swipe_direction(-0.2,  0.0),  GestureType::SwipeLeft);
        assert_eq!(swipe_direction(-0.2,  0.04), GestureType::SwipeLeft);
        assert_eq!(swipe_direction(-0.2, -0.04), GestureType::SwipeDown);
        assert_eq!(swipe_direction( 0.0,  0.2),  GestureType::SwipeUp);
        assert_eq!(swipe_direction( 0.0, -0.2),  GestureType::SwipeDown);
    }

    #[test]
    fn swipe_right_over_window() {
        let h = history_of(&[
            (Pose::Shaka, 0.30, 0.5),
            (Pose::Shaka, 0.37, 0.5),
            (Pose::Shaka, 0.44, 0.5),
            (Pose::Shaka, 0.50, 0.5),
        ]);
        let frames: Vec<_> = h.recent(4).collect();
        let d = detect_swipe(&frames, 0.15).unwrap();
        assert_eq!(d.kind, GestureType::SwipeRight);
        assert!((d.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn short_travel_is_not_a_swipe() {
        let h = history_of(&[(Pose::Shaka, 0.40, 0.5), (Pose::Shaka, 0.50, 0.5)]);
        let frames: Vec<_> = h.recent(4).collect();
        assert!(detect_swipe(&frames, 0.15).is_none());
    }

    #[test]
    fn wave_needs_an_extremum() {
        let h = history_of(&[
            (Pose::Open, 0.40, 0.5),
            (Pose::Open, 0.50, 0.5),
            (Pose::Open, 0.40, 0.5),
            (Pose::Open, 0.50, 0.5),
        ]);
        let frames: Vec<_> = h.recent(4).collect();
        assert_eq!(detect_wave(&frames).map(|d| d.kind), Some(GestureType::Wave));

        let h = history_of(&[
            (Pose::Open, 0.40, 0.5),
            (Pose::Open, 0.45, 0.5),
            (Pose::Open, 0.50, 0.5),
            (Pose::Open, 0.55, 0.5),
        ]);
        let frames: Vec<_> = h.recent(4).collect();
        assert!(detect_wave(&frames).is_none());
    }

    #[test]
    fn clap_needs_two_open_hands_close_together() {
        let t = Instant::now();
        let f = frame(t, &[(Pose::Open, 0.475, 0.5), (Pose::Open, 0.525, 0.5)], false);
        let d = detect_two_hand(&f, 0.1).unwrap();
        assert_eq!(d.kind, GestureType::TwoHandClap);

        let apart = frame(t, &[(Pose::Open, 0.3, 0.5), (Pose::Open, 0.7, 0.5)], false);
        assert!(detect_two_hand(&apart, 0.1).is_none());

        let fist = frame(t, &[(Pose::Open, 0.475, 0.5), (Pose::Fist, 0.525, 0.5)], false);
        assert!(detect_two_hand(&fist, 0.1).is_none());
    }

    #[test]
    fn peace_fist_peace_sequence() {
        let seq: Vec<_> = [Pose::Peace, Pose::Peace, Pose::Fist, Pose::Fist, Pose::Peace, Pose::Peace]
            .iter().map(|p| (*p, 0.5, 0.5)).collect();
        let h = history_of(&seq);
        assert_eq!(
            detect_sequence(&h, &PEACE_FIST_PEACE).map(|d| d.kind),
            Some(GestureType::SequencePeaceFistPeace)
        );

        let h = history_of(&seq[..5]);
        assert!(detect_sequence(&h, &PEACE_FIST_PEACE).is_none());
    }

    #[test]
    fn grab_and_release() {
        let h = history_of(&[(Pose::Open, 0.5, 0.5), (Pose::Fist, 0.5, 0.5)]);
        assert_eq!(detect_grab_release(&h).map(|d| d.kind), Some(GestureType::Grab));
        let h = history_of(&[(Pose::Fist, 0.5, 0.5), (Pose::FourFingers, 0.5, 0.5)]);
        assert_eq!(detect_grab_release(&h).map(|d| d.kind), Some(GestureType::Release));
        let h = history_of(&[(Pose::Peace, 0.5, 0.5), (Pose::Fist, 0.5, 0.5)]);
        assert!(detect_grab_release(&h).is_none());
    }

    #[test]
    fn ok_sign_and_pinch_need_landmarks() {
        let t = Instant::now();
        let th = Thresholds::default();

        let ok = frame(t, &[(Pose::OkSign, 0.5, 0.5)], true);
        assert_eq!(detect_ok_sign(&ok, th.ok_distance).map(|d| d.kind), Some(GestureType::OkSign));
        assert!(detect_pinch(&ok, th.pinch_distance).is_some());

        let pinch = frame(t, &[(Pose::Pinch, 0.5, 0.5)], true);
        assert!(detect_ok_sign(&pinch, th.ok_distance).is_none());
        assert_eq!(detect_pinch(&pinch, th.pinch_distance).map(|d| d.kind), Some(GestureType::Pinch));

        let lean = frame(t, &[(Pose::OkSign, 0.5, 0.5)], false);
        assert!(detect_ok_sign(&lean, th.ok_distance).is_none());
        assert!(detect_pinch(&lean, th.pinch_distance).is_none());
    }
}
