//! Whole-buffer conversion driver
//!
//! Feeds a PCM buffer through a [`Resampler`] either in one write or in
//! fixed-size slices, carrying partial frames and too-short remainders into the
//! next slice, then closes the resampler.

use crate::audio::engine::ConversionEngine;
use crate::audio::resampler::Resampler;
use crate::error::{Error, Result};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Sink wrapper counting the bytes it accepts.
#[derive(Debug)]
pub struct CountingSink<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Outcome of a whole-buffer conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Bytes offered
    pub input_bytes: usize,
    /// Bytes the resampler reported consumed
    pub consumed_bytes: usize,
    /// Bytes left over at the end (partial frame or too little for one output frame)
    pub leftover_bytes: usize,
    /// Number of resampler writes issued
    pub writes: usize,
}

/// Convert `data` and close the resampler.
///
/// With `chunk_bytes` the buffer is written in slices of that size, which
/// only makes sense for a stream-mode resampler; without it, `data` goes out
/// in a single write.
pub fn convert_all<W, E>(
    resampler: &mut Resampler<W, E>,
    data: &[u8],
    chunk_bytes: Option<usize>,
) -> Result<ConvertStats>
where
    W: Write,
    E: ConversionEngine,
{
    let mut stats = ConvertStats {
        input_bytes: data.len(),
        ..Default::default()
    };

    match chunk_bytes {
        None => {
            let consumed = write_once(resampler, data, &mut stats)?;
            stats.leftover_bytes = data.len() - consumed;
        }
        Some(chunk) => {
            let chunk = chunk.max(1);
            let mut carry: Vec<u8> = Vec::new();
            for slice in data.chunks(chunk) {
                carry.extend_from_slice(slice);
                let consumed = write_once(resampler, &carry, &mut stats)?;
                carry.drain(..consumed);
            }
            stats.leftover_bytes = carry.len();
        }
    }

    if stats.leftover_bytes > 0 {
        warn!("{} trailing input bytes could not be converted", stats.leftover_bytes);
    }

    resampler.close()?;
    debug!(
        "Converted {} of {} bytes in {} writes",
        stats.consumed_bytes, stats.input_bytes, stats.writes
    );
    Ok(stats)
}

/// One resampler write; recoverable input errors consume nothing.
fn write_once<W, E>(
    resampler: &mut Resampler<W, E>,
    buf: &[u8],
    stats: &mut ConvertStats,
) -> Result<usize>
where
    W: Write,
    E: ConversionEngine,
{
    if buf.is_empty() {
        return Ok(0);
    }
    stats.writes += 1;
    match resampler.write(buf) {
        Ok(consumed) => {
            stats.consumed_bytes += consumed;
            Ok(consumed)
        }
        Err(e) if e.is_recoverable() => Ok(0),
        Err(e @ Error::Sink { .. }) => {
            stats.consumed_bytes += e.consumed();
            Err(e)
        }
        Err(e) => Err(e),
    }
}
