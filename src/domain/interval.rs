use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::utils::TimeUtils;

/// Candle interval granularities the scanner operates on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Default,
)]
pub enum TimeInterval {
    M15,
    #[default]
    H1,
    H4,
    D1,
}

impl TimeInterval {
    /// The shorthand the Binance API expects, e.g. `15m`.
    pub fn bn_name(&self) -> &'static str {
        match self {
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::M15 => TimeUtils::MS_IN_15_MIN,
            Self::H1 => TimeUtils::MS_IN_H,
            Self::H4 => TimeUtils::MS_IN_4_H,
            Self::D1 => TimeUtils::MS_IN_D,
        }
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.bn_name())
    }
}

impl FromStr for TimeInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter()
            .find(|interval| interval.bn_name() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::iter().map(|i| i.bn_name()).collect();
                format!(
                    "unsupported interval '{}' (supported: {})",
                    s,
                    supported.join(", ")
                )
            })
    }
}
