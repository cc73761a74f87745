//! Audio subsystem
//!
//! Sample format definitions, the PCM byte codec, the conversion engine and the
//! streaming adapter built on top of it.

pub mod engine;
pub mod pcm;
pub mod resampler;
pub mod types;

pub use engine::{ConversionEngine, EngineOptions, EngineSpec, Processed, RubatoEngine};
pub use resampler::{LifecycleState, Resampler, ResamplerBuilder, FLUSH_CAPACITY_FRAMES};
pub use types::{Quality, SampleFormat};
