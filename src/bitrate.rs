use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

static BITRATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>[kKmM])?$")
        .expect("BUG: Failed to compile bitrate regex")
});

/// Source bitrate assumed when the input cannot be probed.
pub const FALLBACK_SOURCE_BITRATE: Bitrate = Bitrate::from_kbps_literal(2000);
/// Share of the source video bitrate kept by percentage encodes.
pub const DEFAULT_TARGET_PERCENT: f64 = 40.0;
/// Audio bitrate used by percentage encodes unless overridden.
pub const DEFAULT_PERCENT_AUDIO_BITRATE: Bitrate = Bitrate::from_kbps_literal(64);

/// A target bitrate as understood by ffmpeg's `-b:v` / `-b:a` options.
///
/// Parsed from strings such as `"5650k"`, `"2.5M"` or `"96000"` and stored
/// in bits per second. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bitrate {
    bps: u64,
}

impl Bitrate {
    /// Creates a bitrate from a value in kilobits per second.
    pub fn from_kbps(kbps: u64) -> Result<Self, Error> {
        Self::from_bps(kbps.saturating_mul(1000))
    }

    // kbps must be non-zero; used for literal tables only
    pub(crate) const fn from_kbps_literal(kbps: u64) -> Self {
        Self { bps: kbps * 1000 }
    }

    /// Creates a bitrate from a value in bits per second.
    pub fn from_bps(bps: u64) -> Result<Self, Error> {
        if bps == 0 {
            return Err(Error::InvalidBitrate {
                value: bps.to_string(),
                reason: "bitrate must be greater than zero".to_string(),
            });
        }
        Ok(Self { bps })
    }

    pub fn bits_per_second(&self) -> u64 {
        self.bps
    }

    /// Whole kilobits per second, rounded down.
    pub fn kbps(&self) -> u64 {
        self.bps / 1000
    }

    /// Keeps `percent` % of `source`, rounded down to a whole kbps.
    ///
    /// `percent` must be in `(0, 100]`.
    pub fn percent_of(source: Bitrate, percent: f64) -> Result<Self, Error> {
        if !(percent > 0.0 && percent <= 100.0) {
            return Err(Error::InvalidBitrate {
                value: format!("{percent}%"),
                reason: "percentage must be in the range (0, 100]".to_string(),
            });
        }
        let kbps = (source.bps as f64 / 1000.0 * percent / 100.0).floor() as u64;
        Self::from_kbps(kbps)
    }
}

/// Target video bitrate keeping `percent` % of `source`, or of
/// [`FALLBACK_SOURCE_BITRATE`] when the source bitrate is unknown.
pub fn target_bitrate(source: Option<Bitrate>, percent: f64) -> Result<Bitrate, Error> {
    Bitrate::percent_of(source.unwrap_or(FALLBACK_SOURCE_BITRATE), percent)
}

impl FromStr for Bitrate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::InvalidBitrate {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = BITRATE_RE
            .captures(s.trim())
            .ok_or_else(|| invalid("expected a number with an optional k/m suffix"))?;

        let value = caps["value"]
            .parse::<f64>()
            .map_err(|e| invalid(&e.to_string()))?;
        let multiplier = match caps.name("unit").map(|m| m.as_str()) {
            Some("k") | Some("K") => 1_000.0,
            Some("m") | Some("M") => 1_000_000.0,
            _ => 1.0,
        };

        let bps = (value * multiplier).round() as u64;
        if bps == 0 {
            return Err(invalid("bitrate must be greater than zero"));
        }
        Ok(Self { bps })
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bps % 1000 == 0 {
            write!(f, "{}k", self.bps / 1000)
        } else {
            write!(f, "{}", self.bps)
        }
    }
}
