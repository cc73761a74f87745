//! # PCM Resample Library (pcm-resample)
//!
//! Streaming sample rate conversion for raw PCM byte streams.
//!
//! **Purpose:** Wrap a block-based conversion engine in a writer-style adapter
//! that handles frame alignment, end-of-stream draining and consumed-byte
//! accounting, and forwards converted audio to any `std::io::Write` sink.
//!
//! **Architecture:** rubato conversion kernels behind the `ConversionEngine`
//! trait, driven by the `Resampler` adapter.
//!
//! ```no_run
//! use pcm_resample::{Quality, Resampler, SampleFormat};
//!
//! # fn main() -> pcm_resample::Result<()> {
//! let mut resampler = Resampler::builder()
//!     .sink(Vec::new())
//!     .input_rate(44_100.0)
//!     .output_rate(16_000.0)
//!     .channels(2)
//!     .format(SampleFormat::Int16)
//!     .quality(Quality::High)
//!     .stream_mode(true)
//!     .build()?;
//!
//! let pcm = vec![0u8; 4 * 4410];
//! let consumed = resampler.write(&pcm)?;
//! assert_eq!(consumed, pcm.len());
//! resampler.close()?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;

pub use audio::{
    ConversionEngine, EngineOptions, EngineSpec, LifecycleState, Processed, Quality, Resampler,
    ResamplerBuilder, RubatoEngine, SampleFormat,
};
pub use config::{LoggingConfig, ResamplerConfig, TomlConfig};
pub use error::{Error, Result};
