//! The gesture vocabulary and the event record detectors emit.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use hand_pose::HandFeatures;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// GestureType
// ════════════════════════════════════════════════════════════════════════════

/// Every gesture the classifier can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureType {
    // Static single-hand
    Fist,
    OpenHand,
    PointingFinger,
    ThumbsUp,
    PeaceSign,
    ThreeFingers,
    FourFingers,
    OkSign,
    // Dynamic
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    Wave,
    // Two-hand
    TwoHandClap,
    TwoHandHeart,
    // Sequential
    SequencePeaceFistPeace,
    // Advanced
    Pinch,
    Grab,
    Release,
}

impl GestureType {
    pub const ALL: [GestureType; 19] = [
        GestureType::Fist,
        GestureType::OpenHand,
        GestureType::PointingFinger,
        GestureType::ThumbsUp,
        GestureType::PeaceSign,
        GestureType::ThreeFingers,
        GestureType::FourFingers,
        GestureType::OkSign,
        GestureType::SwipeLeft,
        GestureType::SwipeRight,
        GestureType::SwipeUp,
        GestureType::SwipeDown,
        GestureType::Wave,
        GestureType::TwoHandClap,
        GestureType::TwoHandHeart,
        GestureType::SequencePeaceFistPeace,
        GestureType::Pinch,
        GestureType::Grab,
        GestureType::Release,
    ];

    /// Stable identifier used in configuration files.
    pub fn id(self) -> &'static str {
        match self {
            GestureType::Fist                   => "fist",
            GestureType::OpenHand               => "openHand",
            GestureType::PointingFinger         => "pointingFinger",
            GestureType::ThumbsUp               => "thumbsUp",
            GestureType::PeaceSign              => "peaceSign",
            GestureType::ThreeFingers           => "threeFingers",
            GestureType::FourFingers            => "fourFingers",
            GestureType::OkSign                 => "okSign",
            GestureType::SwipeLeft              => "swipeLeft",
            GestureType::SwipeRight             => "swipeRight",
            GestureType::SwipeUp                => "swipeUp",
            GestureType::SwipeDown              => "swipeDown",
            GestureType::Wave                   => "wave",
            GestureType::TwoHandClap            => "twoHandClap",
            GestureType::TwoHandHeart           => "twoHandHeart",
            GestureType::SequencePeaceFistPeace => "sequencePeaceFistPeace",
            GestureType::Pinch                  => "pinchGesture",
            GestureType::Grab                   => "grabGesture",
            GestureType::Release                => "releaseGesture",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            GestureType::Fist                   => "Fist",
            GestureType::OpenHand               => "Open Hand",
            GestureType::PointingFinger         => "Pointing Finger",
            GestureType::ThumbsUp               => "Thumbs Up",
            GestureType::PeaceSign              => "Peace Sign",
            GestureType::ThreeFingers           => "Three Fingers",
            GestureType::FourFingers            => "Four Fingers",
            GestureType::OkSign                 => "OK Sign",
            GestureType::SwipeLeft              => "Swipe Left",
            GestureType::SwipeRight             => "Swipe Right",
            GestureType::SwipeUp                => "Swipe Up",
            GestureType::SwipeDown              => "Swipe Down",
            GestureType::Wave                   => "Wave",
            GestureType::TwoHandClap            => "Two Hand Clap",
            GestureType::TwoHandHeart           => "Two Hand Heart",
            GestureType::SequencePeaceFistPeace => "Peace-Fist-Peace Sequence",
            GestureType::Pinch                  => "Pinch",
            GestureType::Grab                   => "Grab",
            GestureType::Release                => "Release",
        }
    }

    /// The detector tier that produces this gesture.
    pub fn tier(self) -> Tier {
        use GestureType::*;
        match self {
            Fist | OpenHand | PointingFinger | ThumbsUp | PeaceSign
            | ThreeFingers | FourFingers => Tier::Static,
            SwipeLeft | SwipeRight | SwipeUp | SwipeDown | Wave => Tier::Dynamic,
            TwoHandClap | TwoHandHeart => Tier::TwoHand,
            SequencePeaceFistPeace => Tier::Sequential,
            OkSign | Pinch | Grab | Release => Tier::Advanced,
        }
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown gesture id `{0}`")]
pub struct UnknownGesture(pub String);

impl FromStr for GestureType {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureType::ALL.iter()
            .copied()
            .find(|g| g.id() == s)
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

/// Detector families, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Static,
    Dynamic,
    TwoHand,
    Sequential,
    Advanced,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureEvent
// ════════════════════════════════════════════════════════════════════════════

/// One detected occurrence of a gesture. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureEvent {
    pub kind:       GestureType,
    pub confidence: f64,
    pub timestamp:  Instant,
    /// The hand that carried the gesture.
    pub hand:       HandFeatures,
}

impl GestureEvent {
    pub fn new(kind: GestureType, confidence: f64, timestamp: Instant, hand: HandFeatures) -> Self {
        GestureEvent { kind, confidence, timestamp, hand }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_back() {
        for g in GestureType::ALL {
            assert_eq!(g.id().parse::<GestureType>(), Ok(g));
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        let err = "moonwalk".parse::<GestureType>().unwrap_err();
        assert_eq!(err, UnknownGesture("moonwalk".into()));
    }

    #[test]
    fn tiers() {
        assert_eq!(GestureType::Fist.tier(), Tier::Static);
        assert_eq!(GestureType::Wave.tier(), Tier::Dynamic);
        assert_eq!(GestureType::TwoHandClap.tier(), Tier::TwoHand);
        assert_eq!(GestureType::SequencePeaceFistPeace.tier(), Tier::Sequential);
        assert_eq!(GestureType::OkSign.tier(), Tier::Advanced);
    }

    #[test]
    fn display_uses_human_name() {
        assert_eq!(GestureType::SequencePeaceFistPeace.to_string(), "Peace-Fist-Peace Sequence");
    }
}
