//! Landmark sources: anything that can deliver [`LandmarkFrame`]s over a
//! channel. Consumers don't need to know whether frames came from hardware
//! or a script.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use hand_pose::synthetic::{hand, Pose};
use hand_pose::{LandmarkFrame, Point2};

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait LandmarkSource: Send + 'static {
    /// Deliver frames until done or the receiver hangs up.
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>);
}

/// Spawn a source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<LandmarkFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSource — synthetic hands (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Replays a list of synthetic frames at a fixed interval.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    frames:     Vec<Vec<(Pose, Point2)>>,
    interval:   Duration,
    confidence: f64,
    /// Sleep between frames so timestamps track the wall clock.
    realtime:   bool,
}

impl Default for ScriptedSource {
    fn default() -> Self { ScriptedSource::new(Duration::from_millis(33)) }
}

impl ScriptedSource {
    pub fn new(interval: Duration) -> Self {
        ScriptedSource { frames: Vec::new(), interval, confidence: 0.9, realtime: true }
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// `frames` frames with no hand.
    pub fn gap(mut self, frames: usize) -> Self {
        self.frames.extend((0..frames).map(|_| Vec::new()));
        self
    }

    /// One hand holding `pose` at `at`.
    pub fn hold(mut self, pose: Pose, at: Point2, frames: usize) -> Self {
        self.frames.extend((0..frames).map(|_| vec![(pose, at)]));
        self
    }

    /// One hand moving linearly from `from` to `to` over `frames` frames.
    pub fn sweep(mut self, pose: Pose, from: Point2, to: Point2, frames: usize) -> Self {
        let steps = frames.saturating_sub(1).max(1) as f64;
        self.frames.extend((0..frames).map(|i| {
            let t = i as f64 / steps;
            let p = Point2::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            vec![(pose, p)]
        }));
        self
    }

    /// Palm x alternates through `xs`.
    pub fn wave(mut self, pose: Pose, y: f64, xs: &[f64]) -> Self {
        self.frames.extend(xs.iter().map(|x| vec![(pose, Point2::new(*x, y))]));
        self
    }

    /// Two hands, both holding `pose`.
    pub fn pair(mut self, pose: Pose, left: Point2, right: Point2, frames: usize) -> Self {
        self.frames.extend((0..frames).map(|_| vec![(pose, left), (pose, right)]));
        self
    }

    pub fn len(&self)      -> usize { self.frames.len() }
    pub fn is_empty(&self) -> bool  { self.frames.is_empty() }

    /// A short session touching each detector family.
    pub fn demo() -> Self {
        let centre = Point2::new(0.5, 0.5);
        ScriptedSource::default()
            .gap(5)
            .hold(Pose::Fist, centre, 6)
            .gap(5)
            .hold(Pose::Shaka, Point2::new(0.36, 0.5), 1)
            .sweep(Pose::Shaka, Point2::new(0.36, 0.5), Point2::new(0.64, 0.5), 5)
            .gap(20)
            .hold(Pose::Peace, centre, 2)
            .hold(Pose::Fist, centre, 2)
            .hold(Pose::Peace, centre, 2)
            .gap(20)
            .pair(Pose::Open, Point2::new(0.475, 0.5), Point2::new(0.525, 0.5), 3)
            .gap(5)
            .hold(Pose::Shaka, Point2::new(0.40, 0.5), 1)
            .wave(Pose::Shaka, 0.5, &[0.40, 0.50, 0.40, 0.50, 0.40])
            .gap(20)
            .hold(Pose::ThumbsUp, centre, 6)
            .gap(5)
    }

    /// Materialize the frames with timestamps starting at `start`.
    pub fn frames_from(&self, start: Instant) -> Vec<LandmarkFrame> {
        self.frames.iter().enumerate().map(|(i, hands)| {
            let t = start + self.interval * i as u32;
            let obs = hands.iter().map(|(p, at)| hand(*p, *at, self.confidence)).collect();
            LandmarkFrame::new(t, obs)
        }).collect()
    }
}

impl LandmarkSource for ScriptedSource {
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>) {
        info!("scripted source: {} frames", self.frames.len());
        let start = Instant::now();
        for frame in self.frames_from(start) {
            if self.realtime {
                let wait = frame.timestamp.saturating_duration_since(Instant::now());
                if !wait.is_zero() { thread::sleep(wait); }
            }
            if tx.send(frame).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks from a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Each tracking frame's hands are projected onto the controller's x/y plane
/// (y is height above the device, so up stays up) and normalized over the
/// interaction box below.
#[cfg(feature = "leap")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LeapSource;

#[cfg(feature = "leap")]
mod leap {
    use super::*;
    use hand_pose::{HandObservation, Joint, MAX_HANDS};
    use leaprs::*;
    use log::{trace, warn};

    // Interaction box, in millimetres.
    const HALF_WIDTH: f32 = 200.0;
    const HEIGHT:     f32 = 400.0;
    /// LeapC only reports hands it is tracking.
    const TRACKED_CONFIDENCE: f64 = 0.9;

    const FINGERS: [[Joint; 4]; 4] = [
        [Joint::IndexMcp,  Joint::IndexPip,  Joint::IndexDip,  Joint::IndexTip],
        [Joint::MiddleMcp, Joint::MiddlePip, Joint::MiddleDip, Joint::MiddleTip],
        [Joint::RingMcp,   Joint::RingPip,   Joint::RingDip,   Joint::RingTip],
        [Joint::LittleMcp, Joint::LittlePip, Joint::LittleDip, Joint::LittleTip],
    ];

    fn project(x: f32, y: f32) -> Point2 {
        let nx = ((x + HALF_WIDTH) / (2.0 * HALF_WIDTH)).clamp(0.0, 1.0);
        let ny = (y / HEIGHT).clamp(0.0, 1.0);
        Point2::new(nx as f64, ny as f64)
    }

    impl LandmarkSource for LeapSource {
        fn run(self: Box<Self>, tx: Sender<LandmarkFrame>) {
            let mut connection = match Connection::create(ConnectionConfig::default()) {
                Ok(c)  => c,
                Err(e) => { warn!("LeapC connection failed: {e:?}"); return; }
            };
            if let Err(e) = connection.open() {
                warn!("LeapMotion device unavailable: {e:?}");
                return;
            }
            info!("LeapMotion source running");

            loop {
                let msg = match connection.poll(100) {
                    Ok(m)  => m,
                    Err(_) => continue,
                };
                let Event::Tracking(frame) = msg.event() else { continue };

                let mut hands = Vec::with_capacity(MAX_HANDS);
                for h in frame.hands().into_iter().take(MAX_HANDS) {
                    let digits: Vec<_> = h.digits().into_iter().collect();
                    if digits.len() < 5 { continue; }

                    let mut obs = HandObservation::new(TRACKED_CONFIDENCE);
                    let mut put = |joint: Joint, x: f32, y: f32| obs.set_joint(joint, project(x, y), 1.0);

                    // Base of the middle metacarpal stands in for the wrist.
                    let w = digits[2].metacarpal().prev_joint();
                    put(Joint::Wrist, w.x, w.y);

                    // The thumb's metacarpal is zero-length in LeapC.
                    let thumb = &digits[0];
                    let (cmc, mp) = (thumb.proximal().prev_joint(), thumb.intermediate().prev_joint());
                    let (ip, tip) = (thumb.distal().prev_joint(), thumb.distal().next_joint());
                    put(Joint::ThumbCmc, cmc.x, cmc.y);
                    put(Joint::ThumbMp,  mp.x,  mp.y);
                    put(Joint::ThumbIp,  ip.x,  ip.y);
                    put(Joint::ThumbTip, tip.x, tip.y);

                    for (digit, [mcp, pip, dip, tip]) in digits[1..].iter().zip(FINGERS) {
                        let a = digit.proximal().prev_joint();
                        let b = digit.intermediate().prev_joint();
                        let c = digit.distal().prev_joint();
                        let d = digit.distal().next_joint();
                        put(mcp, a.x, a.y);
                        put(pip, b.x, b.y);
                        put(dip, c.x, c.y);
                        put(tip, d.x, d.y);
                    }
                    hands.push(obs);
                }

                trace!("leap frame: {} hand(s)", hands.len());
                if tx.send(LandmarkFrame::new(Instant::now(), hands)).is_err() {
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
