use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Aggressiveness of a standard pass pipeline.
///
/// The standard pipelines take two independent axes of the same type: how hard
/// to optimize for speed and how hard to optimize for size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptLevel {
    /// No optimization.
    None,
    /// Light optimization, keeps compile time down.
    Less,
    /// The standard level, comparable to `-O2`.
    #[default]
    Default,
    /// Maximum optimization.
    Aggressive,
}

impl OptLevel {
    /// The native constant for this level.
    pub fn to_native(self) -> u32 {
        match self {
            OptLevel::None => 0,
            OptLevel::Less => 1,
            OptLevel::Default => 2,
            OptLevel::Aggressive => 3,
        }
    }

    /// Maps a native constant back to a level.
    ///
    /// The native constant space is closed and versioned, so a value outside
    /// it is an invariant violation and panics.
    pub fn from_native(raw: u32) -> OptLevel {
        match raw {
            0 => OptLevel::None,
            1 => OptLevel::Less,
            2 => OptLevel::Default,
            3 => OptLevel::Aggressive,
            other => panic!("unrecognized native optimization level: {other}"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Less => "less",
            OptLevel::Default => "default",
            OptLevel::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a textual tuning level does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown optimization level {0:?}, expected none/less/default/aggressive or O0..O3")]
pub struct ParseLevelError(pub String);

impl FromStr for OptLevel {
    type Err = ParseLevelError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "none" | "O0" => Ok(OptLevel::None),
            "less" | "O1" => Ok(OptLevel::Less),
            "default" | "O2" => Ok(OptLevel::Default),
            "aggressive" | "O3" => Ok(OptLevel::Aggressive),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}
