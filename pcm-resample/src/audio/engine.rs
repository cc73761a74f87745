//! Conversion engine boundary and the rubato-backed engine
//!
//! The adapter in [`super::resampler`] only talks to [`ConversionEngine`]. The
//! production implementation, [`RubatoEngine`], wraps a fixed-input rubato
//! resampler and adds the stream bookkeeping rubato leaves to the caller:
//! accumulating input into whole chunks, discarding the filter's start-up delay,
//! and draining the latency tail at end of stream.

use super::pcm;
use super::types::{Quality, SampleFormat};
use crate::error::{Error, Result};
use rubato::{
    FastFixedIn, PolynomialDegree, Resampler as RubatoResampler, SincFixedIn,
    SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Default number of input frames handed to the kernel per block
pub const DEFAULT_CHUNK_FRAMES: usize = 1024;

/// Fixed conversion parameters an engine is created for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSpec {
    pub input_rate: f64,
    pub output_rate: f64,
    pub channels: usize,
    pub format: SampleFormat,
    pub quality: Quality,
}

impl EngineSpec {
    /// Output rate divided by input rate.
    pub fn ratio(&self) -> f64 {
        self.output_rate / self.input_rate
    }

    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.channels * self.format.sample_size()
    }
}

/// Construction-time engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Input frames per kernel block. Larger blocks convert faster but hold
    /// more audio back until the stream is flushed.
    pub chunk_frames: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

/// Result of one engine call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Converted interleaved PCM, `frames_written` whole frames
    pub output: Vec<u8>,
    /// Input frames taken from the submitted buffer
    pub frames_read: usize,
    /// Output frames contained in `output`
    pub frames_written: usize,
}

/// Block-based sample rate converter.
///
/// Engines keep internal state between calls. Dropping an engine releases it.
pub trait ConversionEngine {
    /// Convert `frames_in` frames from `input` and return at most `capacity`
    /// output frames.
    ///
    /// `input` may be `None` only when `frames_in` is zero. With `last` set
    /// the engine treats the stream as complete and moves its latency tail to
    /// the output side; no further input is accepted until [`clear`].
    /// Output that does not fit `capacity` stays buffered for later calls.
    ///
    /// [`clear`]: ConversionEngine::clear
    fn process(
        &mut self,
        input: Option<&[u8]>,
        frames_in: usize,
        capacity: usize,
        last: bool,
    ) -> Result<Processed>;

    /// Discard all buffered state, keeping the configuration.
    fn clear(&mut self);
}

/// The two rubato kernels used across the quality scale
enum Kernel {
    Fast(FastFixedIn<f64>),
    Sinc(SincFixedIn<f64>),
}

impl Kernel {
    fn new(spec: &EngineSpec, chunk_frames: usize) -> Result<Self> {
        let ratio = spec.ratio();
        let channels = spec.channels;

        let sinc = |sinc_len: usize,
                    f_cutoff: f32,
                    interpolation: SincInterpolationType,
                    oversampling_factor: usize,
                    window: WindowFunction| {
            let params = SincInterpolationParameters {
                sinc_len,
                f_cutoff,
                interpolation,
                oversampling_factor,
                window,
            };
            SincFixedIn::<f64>::new(ratio, 1.0, params, chunk_frames, channels)
                .map(Kernel::Sinc)
                .map_err(|e| Error::Engine(format!("failed to create sinc resampler: {}", e)))
        };

        match spec.quality {
            Quality::Quick => {
                FastFixedIn::<f64>::new(ratio, 1.0, PolynomialDegree::Cubic, chunk_frames, channels)
                    .map(Kernel::Fast)
                    .map_err(|e| Error::Engine(format!("failed to create resampler: {}", e)))
            }
            Quality::Low => sinc(64, 0.90, SincInterpolationType::Linear, 64, WindowFunction::Hann2),
            Quality::Medium => sinc(
                128,
                0.925,
                SincInterpolationType::Linear,
                128,
                WindowFunction::Blackman2,
            ),
            Quality::High => sinc(
                256,
                0.95,
                SincInterpolationType::Linear,
                256,
                WindowFunction::BlackmanHarris2,
            ),
            Quality::VeryHigh => sinc(
                512,
                0.97,
                SincInterpolationType::Cubic,
                256,
                WindowFunction::BlackmanHarris2,
            ),
        }
    }

    fn input_frames_next(&self) -> usize {
        match self {
            Kernel::Fast(r) => r.input_frames_next(),
            Kernel::Sinc(r) => r.input_frames_next(),
        }
    }

    fn output_delay(&self) -> usize {
        match self {
            Kernel::Fast(r) => r.output_delay(),
            Kernel::Sinc(r) => r.output_delay(),
        }
    }

    fn process(&mut self, wave_in: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let result = match self {
            Kernel::Fast(r) => r.process(wave_in, None),
            Kernel::Sinc(r) => r.process(wave_in, None),
        };
        result.map_err(|e| Error::Engine(format!("resampling failed: {}", e)))
    }

    /// Process a short final block, or a block of silence when `wave_in` is `None`.
    fn process_partial(&mut self, wave_in: Option<&[Vec<f64>]>) -> Result<Vec<Vec<f64>>> {
        let result = match self {
            Kernel::Fast(r) => r.process_partial(wave_in, None),
            Kernel::Sinc(r) => r.process_partial(wave_in, None),
        };
        result.map_err(|e| Error::Engine(format!("resampling failed: {}", e)))
    }

    fn reset(&mut self) {
        match self {
            Kernel::Fast(r) => r.reset(),
            Kernel::Sinc(r) => r.reset(),
        }
    }
}

/// Streaming engine backed by rubato.
///
/// Input is decoded into planar `f64` and handed to the kernel in blocks of
/// `chunk_frames`. Converted frames wait in `queued` until a caller asks for
/// them, so a call may return fewer frames than the kernel produced.
pub struct RubatoEngine {
    spec: EngineSpec,
    kernel: Kernel,

    /// Planar input not yet handed to the kernel
    pending: Vec<Vec<f64>>,

    /// Interleaved converted samples not yet returned
    queued: VecDeque<f64>,

    /// Start-up delay frames still to discard
    skip_frames: usize,

    /// Real input frames accepted since the last clear
    frames_accepted: u64,

    /// Output frames queued since the last clear (after delay compensation)
    frames_produced: u64,

    /// End of stream signalled
    finished: bool,
}

impl RubatoEngine {
    /// Create an engine for `spec`.
    pub fn new(spec: &EngineSpec, options: EngineOptions) -> Result<Self> {
        let chunk_frames = options.chunk_frames.max(1);
        let kernel = Kernel::new(spec, chunk_frames)?;
        let skip_frames = kernel.output_delay();

        debug!(
            "Created {} engine: {}Hz -> {}Hz, {} channels, {}, {} frame blocks, {} frames delay",
            spec.quality, spec.input_rate, spec.output_rate, spec.channels, spec.format,
            chunk_frames, skip_frames
        );

        Ok(Self {
            spec: *spec,
            kernel,
            pending: vec![Vec::with_capacity(chunk_frames); spec.channels],
            queued: VecDeque::new(),
            skip_frames,
            frames_accepted: 0,
            frames_produced: 0,
            finished: false,
        })
    }

    /// Converted frames waiting to be returned.
    pub fn queued_frames(&self) -> usize {
        self.queued.len() / self.spec.channels
    }

    /// Output frames a complete stream of the accepted input should yield.
    fn expected_frames(&self) -> u64 {
        (self.frames_accepted as f64 * self.spec.ratio()).round() as u64
    }

    fn pending_frames(&self) -> usize {
        self.pending.first().map_or(0, Vec::len)
    }

    /// Hand every complete block of pending input to the kernel.
    fn convert_full_blocks(&mut self) -> Result<()> {
        loop {
            let needed = self.kernel.input_frames_next();
            if self.pending_frames() < needed {
                return Ok(());
            }
            let block: Vec<Vec<f64>> = self
                .pending
                .iter_mut()
                .map(|channel| channel.drain(..needed).collect())
                .collect();
            let converted = self.kernel.process(&block)?;
            self.enqueue(converted);
        }
    }

    /// Push the remaining input and the filter's latency tail through the kernel.
    fn drain_tail(&mut self) -> Result<()> {
        if self.pending_frames() > 0 {
            let rest: Vec<Vec<f64>> = self.pending.iter_mut().map(std::mem::take).collect();
            let converted = self.kernel.process_partial(Some(rest.as_slice()))?;
            self.enqueue(converted);
        }

        let expected = self.expected_frames();
        let block = self.kernel.input_frames_next().max(1);
        let delay_in_input = (self.kernel.output_delay() as f64 / self.spec.ratio()).ceil() as usize;
        let mut silent_blocks = delay_in_input / block + 2;

        while self.frames_produced < expected && silent_blocks > 0 {
            silent_blocks -= 1;
            let converted = self.kernel.process_partial(None)?;
            self.enqueue(converted);
        }

        // Zero padding converts to frames past the end of the real signal
        if self.frames_produced > expected {
            let excess = (self.frames_produced - expected) as usize;
            let removable = excess.min(self.queued_frames());
            let keep = self.queued.len() - removable * self.spec.channels;
            self.queued.truncate(keep);
            self.frames_produced -= removable as u64;
        }

        trace!(
            "Drained tail: {} frames expected, {} produced",
            expected,
            self.frames_produced
        );
        Ok(())
    }

    /// Interleave kernel output into the queue, discarding start-up delay.
    fn enqueue(&mut self, planar: Vec<Vec<f64>>) {
        let frames = planar.first().map_or(0, Vec::len);
        let skip = self.skip_frames.min(frames);
        self.skip_frames -= skip;

        for frame_idx in skip..frames {
            for channel in &planar {
                self.queued.push_back(channel[frame_idx]);
            }
        }
        self.frames_produced += (frames - skip) as u64;
    }
}

impl ConversionEngine for RubatoEngine {
    fn process(
        &mut self,
        input: Option<&[u8]>,
        frames_in: usize,
        capacity: usize,
        last: bool,
    ) -> Result<Processed> {
        let frame_size = self.spec.frame_size();

        if frames_in > 0 {
            if self.finished {
                return Err(Error::Engine("input submitted after end of stream".to_string()));
            }
            let bytes = input
                .ok_or_else(|| Error::Engine("input frames announced without data".to_string()))?;
            let len = frames_in * frame_size;
            if bytes.len() < len {
                return Err(Error::Engine(format!(
                    "input holds {} bytes, {} frames need {}",
                    bytes.len(),
                    frames_in,
                    len
                )));
            }

            pcm::decode_into_planar(&bytes[..len], self.spec.format, &mut self.pending);
            self.frames_accepted += frames_in as u64;
            self.convert_full_blocks()?;
        }

        if last && !self.finished {
            self.drain_tail()?;
            self.finished = true;
        }

        let frames_written = capacity.min(self.queued_frames());
        let mut output = Vec::with_capacity(frames_written * frame_size);
        pcm::encode_interleaved(
            self.queued.drain(..frames_written * self.spec.channels),
            self.spec.format,
            &mut output,
        );

        Ok(Processed {
            output,
            frames_read: frames_in,
            frames_written,
        })
    }

    fn clear(&mut self) {
        self.kernel.reset();
        for channel in &mut self.pending {
            channel.clear();
        }
        self.queued.clear();
        self.skip_frames = self.kernel.output_delay();
        self.frames_accepted = 0;
        self.frames_produced = 0;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(input_rate: f64, output_rate: f64, channels: usize, quality: Quality) -> EngineSpec {
        EngineSpec {
            input_rate,
            output_rate,
            channels,
            format: SampleFormat::Int16,
            quality,
        }
    }

    fn silence(frames: usize, channels: usize) -> Vec<u8> {
        vec![0u8; frames * channels * 2]
    }

    #[test]
    fn test_unity_ratio_preserves_frame_count() {
        let spec = spec(8000.0, 8000.0, 1, Quality::Medium);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();
        let input = silence(5000, 1);

        let first = engine.process(Some(&input), 5000, 5000, false).unwrap();
        assert_eq!(first.frames_read, 5000);
        let tail = engine.process(None, 0, 65_536, true).unwrap();

        assert_eq!(first.frames_written + tail.frames_written, 5000);
        assert_eq!(tail.output.len(), tail.frames_written * 2);
    }

    #[test]
    fn test_downsample_halves_frame_count() {
        let spec = spec(16_000.0, 8000.0, 2, Quality::High);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();
        let input = silence(4000, 2);

        let processed = engine.process(Some(&input), 4000, 65_536, true).unwrap();

        assert_eq!(processed.frames_written, 2000);
        assert_eq!(processed.output.len(), 2000 * 4);
    }

    #[test]
    fn test_capacity_limits_output_and_keeps_rest() {
        let spec = spec(8000.0, 8000.0, 1, Quality::Quick);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();
        let input = silence(3000, 1);

        let processed = engine.process(Some(&input), 3000, 10, true).unwrap();
        assert_eq!(processed.frames_written, 10);
        assert_eq!(engine.queued_frames(), 2990);

        let rest = engine.process(None, 0, 65_536, true).unwrap();
        assert_eq!(rest.frames_written, 2990);
    }

    #[test]
    fn test_input_after_end_of_stream_rejected() {
        let spec = spec(8000.0, 8000.0, 1, Quality::Low);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();
        let input = silence(100, 1);

        engine.process(Some(&input), 100, 100, true).unwrap();
        let result = engine.process(Some(&input), 100, 100, false);
        assert!(matches!(result, Err(Error::Engine(_))));
    }

    #[test]
    fn test_clear_restarts_stream() {
        let spec = spec(8000.0, 8000.0, 1, Quality::VeryHigh);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();
        let input = silence(100, 1);

        engine.process(Some(&input), 100, 100, true).unwrap();
        engine.clear();
        assert_eq!(engine.queued_frames(), 0);

        let processed = engine.process(Some(&input), 100, 100, true).unwrap();
        assert_eq!(processed.frames_written, 100);
    }

    #[test]
    fn test_short_input_buffer_rejected() {
        let spec = spec(8000.0, 8000.0, 2, Quality::Medium);
        let mut engine = RubatoEngine::new(&spec, EngineOptions::default()).unwrap();

        let result = engine.process(Some(&[0u8; 4]), 2, 2, false);
        assert!(matches!(result, Err(Error::Engine(_))));
    }
}
