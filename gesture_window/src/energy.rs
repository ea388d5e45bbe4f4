//! Energy modes: which detector tiers are worth their CPU cost.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Trade detection richness for CPU/battery.
///
/// Only `HighPerformance` runs the advanced tier (and keeps raw landmarks
/// for it). `EnergySaver` behaves like `Balanced` here; callers may also
/// throttle their capture rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnergyMode {
    HighPerformance,
    #[default]
    Balanced,
    EnergySaver,
}

impl EnergyMode {
    pub fn advanced_patterns(self) -> bool {
        matches!(self, EnergyMode::HighPerformance)
    }

    /// Configuration-file tag.
    pub fn tag(self) -> &'static str {
        match self {
            EnergyMode::HighPerformance => "high_performance",
            EnergyMode::Balanced        => "balanced",
            EnergyMode::EnergySaver     => "energy_saver",
        }
    }
}

impl fmt::Display for EnergyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown energy mode `{0}`")]
pub struct UnknownEnergyMode(pub String);

impl FromStr for EnergyMode {
    type Err = UnknownEnergyMode;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high_performance" => Ok(EnergyMode::HighPerformance),
            "balanced"         => Ok(EnergyMode::Balanced),
            "energy_saver"     => Ok(EnergyMode::EnergySaver),
            _                  => Err(UnknownEnergyMode(s.to_string())),
        }
    }
}
