//! Input file handling for the command-line tool

use crate::error::{Error, Result};
use std::path::Path;

/// Size of the canonical RIFF/WAVE header skipped in front of `.wav` input
pub const WAV_HEADER_LEN: usize = 44;

/// True when `path` has a `.wav` extension (any case).
pub fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Raw PCM payload of an input file: everything after the WAV header for
/// `.wav` files, the whole file otherwise.
pub fn pcm_payload<'a>(path: &Path, data: &'a [u8]) -> Result<&'a [u8]> {
    if !is_wav(path) {
        return Ok(data);
    }
    if data.len() < WAV_HEADER_LEN {
        return Err(Error::Config(format!(
            "{} is shorter than a WAV header ({} bytes)",
            path.display(),
            data.len()
        )));
    }
    Ok(&data[WAV_HEADER_LEN..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_extension_detection() {
        assert!(is_wav(Path::new("piano.wav")));
        assert!(is_wav(Path::new("dir/PIANO.WAV")));
        assert!(!is_wav(Path::new("piano.raw")));
        assert!(!is_wav(Path::new("wav")));
    }

    #[test]
    fn test_header_skipped_for_wav_only() {
        let data: Vec<u8> = (0..50).collect();
        assert_eq!(pcm_payload(Path::new("a.wav"), &data).unwrap(), &data[44..]);
        assert_eq!(pcm_payload(Path::new("a.pcm"), &data).unwrap(), &data[..]);
    }

    #[test]
    fn test_truncated_wav_rejected() {
        let data = [0u8; 10];
        assert!(pcm_payload(Path::new("short.wav"), &data).is_err());
    }
}
