//! Sample format and quality enumerations
//!
//! Both enumerations carry the numeric codes exposed to callers that configure
//! the resampler with raw integers (config files, foreign callers). Codes are
//! validated once, when the resampler is built.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// PCM sample encoding on the byte interface.
///
/// All formats are interleaved and little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SampleFormat {
    /// 32-bit floating point PCM
    #[serde(rename = "f32", alias = "float32")]
    Float32,
    /// 64-bit floating point PCM
    #[serde(rename = "f64", alias = "float64")]
    Float64,
    /// 32-bit signed linear PCM
    #[serde(rename = "i32", alias = "int32")]
    Int32,
    /// 16-bit signed linear PCM
    #[serde(rename = "i16", alias = "int16")]
    Int16,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Float32,
        SampleFormat::Float64,
        SampleFormat::Int32,
        SampleFormat::Int16,
    ];

    /// Numeric code of this format.
    pub fn code(self) -> i32 {
        match self {
            SampleFormat::Float32 => 0,
            SampleFormat::Float64 => 1,
            SampleFormat::Int32 => 2,
            SampleFormat::Int16 => 3,
        }
    }

    /// Bytes per sample per channel.
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::Float64 => 8,
            SampleFormat::Float32 | SampleFormat::Int32 => 4,
            SampleFormat::Int16 => 2,
        }
    }

    /// Short name, as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::Float32 => "f32",
            SampleFormat::Float64 => "f64",
            SampleFormat::Int32 => "i32",
            SampleFormat::Int16 => "i16",
        }
    }
}

impl TryFrom<i32> for SampleFormat {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.code() == code)
            .ok_or(Error::InvalidFormat(code))
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "f32" | "float32" => Ok(SampleFormat::Float32),
            "f64" | "float64" => Ok(SampleFormat::Float64),
            "i32" | "int32" => Ok(SampleFormat::Int32),
            "i16" | "int16" => Ok(SampleFormat::Int16),
            other => Err(Error::Config(format!("unknown sample format '{}'", other))),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conversion quality.
///
/// Levels form an ordered scale with gaps; only the listed levels are valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    /// Cubic polynomial interpolation, no anti-aliasing
    Quick,
    /// Short sinc filter with a wide rolloff
    Low,
    /// Medium sinc filter
    Medium,
    /// Long sinc filter
    #[default]
    High,
    /// Longest sinc filter with cubic interpolation
    #[serde(alias = "veryhigh")]
    VeryHigh,
}

impl Quality {
    pub const ALL: [Quality; 5] = [
        Quality::Quick,
        Quality::Low,
        Quality::Medium,
        Quality::High,
        Quality::VeryHigh,
    ];

    /// Numeric level of this quality setting.
    pub fn level(self) -> i32 {
        match self {
            Quality::Quick => 0,
            Quality::Low => 1,
            Quality::Medium => 2,
            Quality::High => 4,
            Quality::VeryHigh => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Quick => "quick",
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::VeryHigh => "very-high",
        }
    }
}

impl TryFrom<i32> for Quality {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|quality| quality.level() == level)
            .ok_or(Error::InvalidQuality(level))
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quick" => Ok(Quality::Quick),
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            "very-high" | "veryhigh" => Ok(Quality::VeryHigh),
            other => Err(Error::Config(format!("unknown quality '{}'", other))),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
