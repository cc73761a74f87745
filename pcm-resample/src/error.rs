//! Error types for pcm-resample
//!
//! Defines the adapter's error taxonomy using thiserror for clear error propagation.
//!
//! Construction errors (`InvalidSink` .. `InvalidQuality`) are final: the caller has
//! to build a new resampler with valid parameters. `IncompleteFrame` and
//! `InsufficientInput` are per-call and recoverable by buffering more input.

use thiserror::Error;

/// Main error type for pcm-resample
#[derive(Error, Debug)]
pub enum Error {
    /// No output sink was supplied
    #[error("output sink is missing")]
    InvalidSink,

    /// Input or output sampling rate is not a positive number
    #[error("invalid input or output sampling rate")]
    InvalidRate,

    /// Channel count is zero
    #[error("invalid channel count")]
    InvalidChannelCount,

    /// Sample format code outside the supported set
    #[error("invalid sample format: {0}")]
    InvalidFormat(i32),

    /// Quality level outside the supported set
    #[error("invalid quality level: {0}")]
    InvalidQuality(i32),

    /// Operation attempted after `close`
    #[error("resampler is closed")]
    AdapterClosed,

    /// Input shorter than a single frame
    #[error("incomplete input frame data")]
    IncompleteFrame,

    /// Input too short to produce a single output frame
    #[error("not enough input to generate output")]
    InsufficientInput,

    /// Failure reported by the conversion engine
    #[error("conversion engine error: {0}")]
    Engine(String),

    /// The output sink rejected converted data.
    ///
    /// `consumed` is the number of input bytes that may still be considered
    /// delivered, derived from what the sink accepted.
    #[error("output sink error after {consumed} input bytes: {source}")]
    Sink {
        consumed: usize,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file loading or parsing errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Input bytes consumed by the call that produced this error.
    pub fn consumed(&self) -> usize {
        match self {
            Error::Sink { consumed, .. } => *consumed,
            _ => 0,
        }
    }

    /// True for per-call input errors the caller can recover from by
    /// supplying more data.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::IncompleteFrame | Error::InsufficientInput)
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;

        match err {
            Error::Sink { source, .. } => source,
            e @ (Error::IncompleteFrame | Error::InsufficientInput) => {
                std::io::Error::new(ErrorKind::InvalidInput, e)
            }
            e @ Error::AdapterClosed => std::io::Error::new(ErrorKind::BrokenPipe, e),
            e => std::io::Error::new(ErrorKind::Other, e),
        }
    }
}

/// Convenience Result type using pcm-resample Error
pub type Result<T> = std::result::Result<T, Error>;
