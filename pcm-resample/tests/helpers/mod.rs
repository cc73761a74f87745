//! Test helper modules for pcm-resample integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedEngine: conversion engine with scripted responses and a call log
//! - Sinks: shared, limited and failing `io::Write` destinations
//! - Signal generators for PCM test data

#![allow(dead_code)]

pub mod scripted_engine;
pub mod signal;
pub mod sinks;

pub use scripted_engine::{EngineLog, ScriptedEngine, Step};
pub use signal::{sine_i16, silence};
pub use sinks::{FailingSink, LimitedSink, SharedSink};
