//! Streaming resampling adapter
//!
//! [`Resampler`] accepts raw interleaved PCM bytes, converts them through a
//! [`ConversionEngine`] and writes the converted bytes to a sink. The value it
//! returns from [`Resampler::write`] counts *input* bytes consumed, which is what
//! a producer needs to know how much of its buffer it may consider delivered.
//!
//! # Modes
//!
//! - **Stream mode**: successive writes form one continuous stream. The engine
//!   keeps its filter latency between calls; `close` or `reset` drains it.
//! - **Single-shot mode**: every write is a complete conversion. The engine is
//!   told the input is final, its tail is delivered with the same write, and it
//!   is cleared afterwards so the next write starts a fresh conversion.
//!
//! # Fragments
//!
//! Only whole frames are converted. A trailing partial frame is left out of the
//! consumed count so the caller can prepend it to its next write.

use super::engine::{ConversionEngine, EngineOptions, EngineSpec, RubatoEngine};
use super::types::{Quality, SampleFormat};
use crate::config::ResamplerConfig;
use crate::error::{Error, Result};
use std::io::{self, Write};
use tracing::{debug, trace, warn};

/// Output frames requested per engine call while draining
pub const FLUSH_CAPACITY_FRAMES: usize = 65_536;

/// Lifecycle of a resampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Open,
    Closed,
}

/// Builder validating resampler parameters before any engine is created.
///
/// Format and quality may be given as enums or as raw numeric codes; raw codes
/// are checked in [`build`](ResamplerBuilder::build).
pub struct ResamplerBuilder<W> {
    sink: Option<W>,
    input_rate: f64,
    output_rate: f64,
    channels: usize,
    format: i32,
    quality: i32,
    stream_mode: bool,
    options: EngineOptions,
}

impl<W> Default for ResamplerBuilder<W> {
    fn default() -> Self {
        Self {
            sink: None,
            input_rate: 0.0,
            output_rate: 0.0,
            channels: 1,
            format: SampleFormat::Int16.code(),
            quality: Quality::default().level(),
            stream_mode: false,
            options: EngineOptions::default(),
        }
    }
}

impl<W: Write> ResamplerBuilder<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a configuration section. The sink still has to
    /// be supplied.
    pub fn from_config(config: &ResamplerConfig) -> Self {
        Self::new()
            .input_rate(config.input_rate)
            .output_rate(config.output_rate)
            .channels(config.channels)
            .format(config.format)
            .quality(config.quality)
            .stream_mode(config.stream)
            .engine_options(EngineOptions {
                chunk_frames: config.chunk_frames,
            })
    }

    pub fn sink(mut self, sink: W) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn input_rate(mut self, rate: f64) -> Self {
        self.input_rate = rate;
        self
    }

    pub fn output_rate(mut self, rate: f64) -> Self {
        self.output_rate = rate;
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn format(mut self, format: SampleFormat) -> Self {
        self.format = format.code();
        self
    }

    /// Set the format by numeric code (see [`SampleFormat::code`]).
    pub fn format_code(mut self, code: i32) -> Self {
        self.format = code;
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality.level();
        self
    }

    /// Set the quality by numeric level (see [`Quality::level`]).
    pub fn quality_level(mut self, level: i32) -> Self {
        self.quality = level;
        self
    }

    pub fn stream_mode(mut self, stream_mode: bool) -> Self {
        self.stream_mode = stream_mode;
        self
    }

    pub fn engine_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate and create a resampler backed by [`RubatoEngine`].
    pub fn build(self) -> Result<Resampler<W, RubatoEngine>> {
        let options = self.options;
        self.build_with(|spec| RubatoEngine::new(spec, options))
    }

    /// Validate and create a resampler whose engine comes from `factory`.
    ///
    /// `factory` runs only when every parameter is valid.
    pub fn build_with<E, F>(self, factory: F) -> Result<Resampler<W, E>>
    where
        E: ConversionEngine,
        F: FnOnce(&EngineSpec) -> Result<E>,
    {
        let sink = self.sink.ok_or(Error::InvalidSink)?;

        let rate_ok = |rate: f64| rate.is_finite() && rate > 0.0;
        if !rate_ok(self.input_rate) || !rate_ok(self.output_rate) {
            return Err(Error::InvalidRate);
        }
        if self.channels == 0 {
            return Err(Error::InvalidChannelCount);
        }
        let quality = Quality::try_from(self.quality)?;
        let format = SampleFormat::try_from(self.format)?;

        let spec = EngineSpec {
            input_rate: self.input_rate,
            output_rate: self.output_rate,
            channels: self.channels,
            format,
            quality,
        };
        let engine = factory(&spec)?;

        debug!(
            "Resampler open: {}Hz -> {}Hz, {} channels, {}, quality {}, stream mode {}",
            spec.input_rate, spec.output_rate, spec.channels, format, quality, self.stream_mode
        );

        Ok(Resampler {
            engine: Some(engine),
            sink,
            frame_size: spec.frame_size(),
            spec,
            stream_mode: self.stream_mode,
            credit: 0.0,
        })
    }
}

/// Streaming resampling adapter.
///
/// Not meant for concurrent use; every operation takes `&mut self`.
pub struct Resampler<W, E = RubatoEngine> {
    /// `None` once closed
    engine: Option<E>,
    sink: W,
    spec: EngineSpec,
    frame_size: usize,
    stream_mode: bool,
    /// Stream-mode output frames owed for input already read, fractions included
    credit: f64,
}

impl<W: Write> Resampler<W, RubatoEngine> {
    pub fn builder() -> ResamplerBuilder<W> {
        ResamplerBuilder::new()
    }

    /// Create a resampler writing to `sink` with parameters from `config`.
    pub fn new(sink: W, config: &ResamplerConfig) -> Result<Self> {
        ResamplerBuilder::from_config(config).sink(sink).build()
    }
}

impl<W: Write, E: ConversionEngine> Resampler<W, E> {
    /// Convert whole frames from `buf` and write the result to the sink.
    ///
    /// Returns the number of input bytes consumed. On a sink failure the
    /// returned [`Error::Sink`] carries the consumed count instead.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(Error::AdapterClosed)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let frames_in = buf.len() / self.frame_size;
        if frames_in == 0 {
            return Err(Error::IncompleteFrame);
        }
        let valid = frames_in * self.frame_size;
        if valid < buf.len() {
            trace!("Leaving {} byte fragment of a frame unconsumed", buf.len() - valid);
        }

        let frames_out = (frames_in as f64 * self.spec.ratio()).floor() as usize;
        if frames_out == 0 {
            return Err(Error::InsufficientInput);
        }

        let (output, frames_read) = if self.stream_mode {
            let ratio = self.spec.ratio();
            let capacity = (self.credit + frames_in as f64 * ratio).floor() as usize;
            let processed = engine.process(Some(&buf[..valid]), frames_in, capacity, false)?;
            self.credit += processed.frames_read as f64 * ratio - processed.frames_written as f64;
            (processed.output, processed.frames_read)
        } else {
            let converted = convert_final(engine, &buf[..valid], frames_in, frames_out);
            engine.clear();
            converted?
        };

        let (accepted, sink_error) = write_to_sink(&mut self.sink, &output);
        let consumed = self.consumed_bytes(valid, frames_in, frames_read, accepted, output.len());

        trace!(
            "Converted {} frames ({} read), wrote {}/{} bytes, consumed {} bytes",
            frames_in,
            frames_read,
            accepted,
            output.len(),
            consumed
        );

        match sink_error {
            Some(source) => {
                warn!("Sink rejected converted data after {} bytes: {}", accepted, source);
                Err(Error::Sink { consumed, source })
            }
            None => Ok(consumed),
        }
    }

    /// Drain the current stream into the current sink (stream mode only),
    /// then switch to `sink` and start a fresh conversion.
    ///
    /// A drain failure is returned, but the sink is replaced and the engine
    /// cleared regardless.
    pub fn reset(&mut self, sink: W) -> Result<()> {
        if self.engine.is_none() {
            return Err(Error::AdapterClosed);
        }

        let drained = if self.stream_mode { self.drain() } else { Ok(0) };
        self.sink = sink;
        self.credit = 0.0;
        if let Some(engine) = self.engine.as_mut() {
            engine.clear();
        }

        debug!("Resampler reset");
        drained.map(|_| ())
    }

    /// Drain the current stream (stream mode only) and release the engine.
    ///
    /// The engine is released even when draining fails. Every call after the
    /// first fails with [`Error::AdapterClosed`].
    pub fn close(&mut self) -> Result<()> {
        if self.engine.is_none() {
            return Err(Error::AdapterClosed);
        }

        let drained = if self.stream_mode { self.drain() } else { Ok(0) };
        drop(self.engine.take());

        match &drained {
            Ok(bytes) => debug!("Resampler closed, {} bytes drained", bytes),
            Err(e) => warn!("Resampler closed, drain failed: {}", e),
        }
        drained.map(|_| ())
    }

    pub fn state(&self) -> LifecycleState {
        if self.engine.is_some() {
            LifecycleState::Open
        } else {
            LifecycleState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == LifecycleState::Open
    }

    /// Conversion parameters this resampler was built with.
    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn stream_mode(&self) -> bool {
        self.stream_mode
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Unwrap the sink. The engine, if still open, is dropped without draining.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Move everything the engine still holds to the sink.
    ///
    /// Loops until the engine has nothing left so long tails are not cut at
    /// the per-call capacity. Returns the number of bytes delivered.
    fn drain(&mut self) -> Result<usize> {
        let engine = self.engine.as_mut().ok_or(Error::AdapterClosed)?;
        let mut delivered = 0;

        loop {
            let processed = engine.process(None, 0, FLUSH_CAPACITY_FRAMES, true)?;
            if processed.frames_written == 0 {
                break;
            }
            let (accepted, sink_error) = write_to_sink(&mut self.sink, &processed.output);
            delivered += accepted;
            if let Some(source) = sink_error {
                return Err(Error::Sink {
                    consumed: 0,
                    source,
                });
            }
        }

        self.sink
            .flush()
            .map_err(|source| Error::Sink { consumed: 0, source })?;

        trace!("Drained {} bytes", delivered);
        Ok(delivered)
    }

    /// Input bytes that may be reported as consumed.
    ///
    /// When the engine read everything and the sink took everything, the whole
    /// submitted length counts, whatever the output size. Otherwise the bytes
    /// the sink accepted are scaled back to the input rate, rounded down to
    /// whole frames and capped at what the engine actually read.
    fn consumed_bytes(
        &self,
        submitted: usize,
        frames_in: usize,
        frames_read: usize,
        accepted: usize,
        produced: usize,
    ) -> usize {
        if frames_read >= frames_in && accepted == produced {
            return submitted;
        }

        if frames_read < frames_in {
            warn!(
                "Engine read {} of {} submitted frames",
                frames_read, frames_in
            );
        }

        let scaled = (accepted as f64 / self.spec.ratio()).floor() as usize;
        let whole_frames = scaled / self.frame_size * self.frame_size;
        whole_frames.min(frames_read.min(frames_in) * self.frame_size)
    }
}

impl<W: Write, E: ConversionEngine> Write for Resampler<W, E> {
    /// Follows the `io::Write` contract: when some input was consumed before
    /// the sink failed, the consumed count is returned as a short write.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match Resampler::write(self, buf) {
            Ok(consumed) => Ok(consumed),
            Err(Error::Sink { consumed, .. }) if consumed > 0 => Ok(consumed),
            Err(e) => Err(e.into()),
        }
    }

    /// Flushes the sink only. Buffered engine output is drained by `close`.
    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Convert a complete single-shot input: the submitted frames, the latency
/// tail, and anything that did not fit the first call's capacity.
fn convert_final<E: ConversionEngine>(
    engine: &mut E,
    input: &[u8],
    frames_in: usize,
    frames_out: usize,
) -> Result<(Vec<u8>, usize)> {
    let processed = engine.process(Some(input), frames_in, frames_out, true)?;
    let frames_read = processed.frames_read;
    let mut output = processed.output;

    loop {
        let rest = engine.process(None, 0, FLUSH_CAPACITY_FRAMES, true)?;
        if rest.frames_written == 0 {
            break;
        }
        output.extend_from_slice(&rest.output);
    }

    Ok((output, frames_read))
}

/// Write `data` to `sink` as one logical write, tracking how much was accepted.
fn write_to_sink<W: Write>(sink: &mut W, data: &[u8]) -> (usize, Option<io::Error>) {
    let mut accepted = 0;
    while accepted < data.len() {
        match sink.write(&data[accepted..]) {
            Ok(0) => {
                return (
                    accepted,
                    Some(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no more data",
                    )),
                )
            }
            Ok(n) => accepted += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (accepted, Some(e)),
        }
    }
    (accepted, None)
}
