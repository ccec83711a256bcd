use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// How a sequence varies between its instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TInterpolation {
    /// The value is held constant from each instant up to, but not
    /// including, the next.
    Stepwise,
    /// The value varies continuously between instants. Only valid for
    /// continuous base types.
    Linear,
}

impl FromStr for TInterpolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(TInterpolation::Linear),
            "stepwise" | "step" => Ok(TInterpolation::Stepwise),
            other => Err(Error::invalid(format!("unknown interpolation: {other}"))),
        }
    }
}

impl fmt::Display for TInterpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
