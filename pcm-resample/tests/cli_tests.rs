//! Command-Line Tool Tests
//!
//! Runs the `pcm-resample` binary on generated WAV and RAW files.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Write a 16-bit WAV file with a sine on every channel.
fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let value = ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV");
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pcm-resample"))
        .args(args)
        .env_remove("PCM_RESAMPLE_CONFIG")
        .env_remove("PCM_RESAMPLE_INPUT_RATE")
        .env_remove("PCM_RESAMPLE_OUTPUT_RATE")
        .output()
        .expect("Failed to run pcm-resample")
}

fn paths(dir: &TempDir, input: &str) -> (PathBuf, PathBuf) {
    (dir.path().join(input), dir.path().join("out.raw"))
}

#[test]
fn test_wav_downsample_single_shot() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "piano-16k-16-2.wav");
    write_wav(&input, 16_000, 2, 16_000);

    let result = run(&[
        "--input-rate",
        "16000",
        "--output-rate",
        "8000",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    let written = std::fs::metadata(&output).unwrap().len();
    assert_eq!(written, 8000 * 4, "Header skipped, one second at 8kHz stereo");
}

#[test]
fn test_wav_upsample_stream_mode() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "tone.WAV");
    write_wav(&input, 8000, 2, 8000);

    let result = run(&[
        "-i",
        "8000",
        "-o",
        "16000",
        "--stream",
        "--chunk-bytes",
        "1001",
        "--quality",
        "medium",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    let written = std::fs::metadata(&output).unwrap().len() as i64;
    assert!((written - 16_000 * 4).abs() <= 8, "{} bytes", written);
}

/// **Given:** a RAW mono float file and a configuration file
/// **When:** the tool runs with `--config`
/// **Then:** rates and format come from the file
#[test]
fn test_raw_input_with_config_file() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "input.f32");
    let config = dir.path().join("resample.toml");

    let samples: Vec<u8> = (0..4410)
        .flat_map(|i| ((i as f32 * 0.05).sin() * 0.5).to_le_bytes())
        .collect();
    std::fs::write(&input, &samples).unwrap();
    std::fs::write(
        &config,
        "[resampler]\ninput_rate = 44100\noutput_rate = 22050\nchannels = 1\nformat = \"f32\"\n",
    )
    .unwrap();

    let result = run(&[
        "--config",
        config.to_str().unwrap(),
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);

    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 2205 * 4);
}

#[test]
fn test_missing_output_rate_fails_and_removes_output() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "in.raw");
    std::fs::write(&input, vec![0u8; 400]).unwrap();

    let result = run(&["--input-rate", "16000", input.to_str().unwrap(), output.to_str().unwrap()]);

    assert!(!result.status.success());
    assert!(!output.exists(), "Failed conversion should not leave an output file");
}

#[test]
fn test_invalid_format_name_rejected() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "in.raw");
    std::fs::write(&input, vec![0u8; 400]).unwrap();

    let result = run(&[
        "--format",
        "u8",
        "-i",
        "16000",
        "-o",
        "8000",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let (input, output) = paths(&dir, "absent.raw");

    let result = run(&["-i", "16000", "-o", "8000", input.to_str().unwrap(), output.to_str().unwrap()]);

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Failed to read"));
}

#[test]
fn test_version_includes_build_info() {
    let result = run(&["--version"]);

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains("built"));
}
