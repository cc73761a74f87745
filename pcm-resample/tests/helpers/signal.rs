//! PCM test signal generation

/// Interleaved 16-bit sine, same signal on every channel, at half scale.
pub fn sine_i16(frames: usize, channels: usize, sample_rate: f64, frequency: f64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames * channels * 2);
    for i in 0..frames {
        let t = i as f64 / sample_rate;
        let value = ((2.0 * std::f64::consts::PI * frequency * t).sin() * 16_384.0) as i16;
        for _ in 0..channels {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    bytes
}

/// `frames` frames of digital silence for any frame size.
pub fn silence(frames: usize, frame_size: usize) -> Vec<u8> {
    vec![0u8; frames * frame_size]
}
