//! PCM byte codec
//!
//! Converts between the little-endian interleaved byte interface and the
//! planar `f64` buffers the conversion kernels operate on.

use super::types::SampleFormat;

const I16_SCALE: f64 = 32_768.0;
const I32_SCALE: f64 = 2_147_483_648.0;

/// Decode interleaved PCM bytes and append them to planar channel buffers.
///
/// Input:  [L0, R0, L1, R1, ...] as bytes
/// Output: [[.., L0, L1, ...], [.., R0, R1, ...]]
///
/// `bytes` must hold whole frames; a trailing fragment is ignored.
pub fn decode_into_planar(bytes: &[u8], format: SampleFormat, planar: &mut [Vec<f64>]) {
    let channels = planar.len();
    if channels == 0 {
        return;
    }
    let sample_size = format.sample_size();
    let frame_size = sample_size * channels;

    for frame in bytes.chunks_exact(frame_size) {
        for (ch_idx, sample) in frame.chunks_exact(sample_size).enumerate() {
            planar[ch_idx].push(decode_sample(sample, format));
        }
    }
}

/// Encode interleaved samples and append them to `out`.
///
/// Integer formats are rounded and saturated to their range.
pub fn encode_interleaved<I>(samples: I, format: SampleFormat, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = f64>,
{
    for sample in samples {
        match format {
            SampleFormat::Float32 => out.extend_from_slice(&(sample as f32).to_le_bytes()),
            SampleFormat::Float64 => out.extend_from_slice(&sample.to_le_bytes()),
            SampleFormat::Int32 => {
                let value = (sample * I32_SCALE)
                    .round()
                    .clamp(i32::MIN as f64, i32::MAX as f64) as i32;
                out.extend_from_slice(&value.to_le_bytes());
            }
            SampleFormat::Int16 => {
                let value = (sample * I16_SCALE)
                    .round()
                    .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
}

fn decode_sample(bytes: &[u8], format: SampleFormat) -> f64 {
    match format {
        SampleFormat::Float32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        SampleFormat::Float64 => f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
        SampleFormat::Int32 => {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64 / I32_SCALE
        }
        SampleFormat::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64 / I16_SCALE,
    }
}
