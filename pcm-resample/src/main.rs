//! pcm-resample - command-line entry point
//!
//! Resamples a WAV or RAW PCM file to the requested sampling rate and writes
//! RAW PCM output. For `.wav` input the 44-byte header is skipped.
//!
//! Example: pcm-resample --input-rate 16000 --output-rate 8000 piano-16k-16-2.wav 8k.raw

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pcm_resample::config::{ResamplerConfig, TomlConfig};
use pcm_resample::pipeline::{convert_all, ConvertStats, CountingSink};
use pcm_resample::{input, Quality, Resampler, SampleFormat};

const VERSION_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("BUILD_PROFILE"),
    ")"
);

/// Default slice size for stream-mode conversion
const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// Command-line arguments for pcm-resample
#[derive(Parser, Debug)]
#[command(name = "pcm-resample")]
#[command(about = "Resample RAW or WAV PCM audio")]
#[command(version = VERSION_INFO)]
struct Args {
    /// Input file (RAW PCM, or WAV with a 44-byte header)
    input: PathBuf,

    /// Output file (RAW PCM)
    output: PathBuf,

    /// TOML configuration file
    #[arg(long, env = "PCM_RESAMPLE_CONFIG")]
    config: Option<PathBuf>,

    /// PCM format: i16, i32, f32 or f64
    #[arg(short, long)]
    format: Option<SampleFormat>,

    /// Number of channels
    #[arg(short, long)]
    channels: Option<usize>,

    /// Input sample rate in Hz
    #[arg(short, long, env = "PCM_RESAMPLE_INPUT_RATE")]
    input_rate: Option<f64>,

    /// Output sample rate in Hz
    #[arg(short, long, env = "PCM_RESAMPLE_OUTPUT_RATE")]
    output_rate: Option<f64>,

    /// Quality: quick, low, medium, high or very-high
    #[arg(short, long)]
    quality: Option<Quality>,

    /// Feed the input in slices through one continuous stream
    #[arg(long)]
    stream: bool,

    /// Slice size in bytes for --stream
    #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
    chunk_bytes: usize,

    /// Log level (overrides the configuration file; RUST_LOG wins over both)
    #[arg(long, env = "PCM_RESAMPLE_LOG")]
    log_level: Option<String>,
}

impl Args {
    /// Command-line values take priority over the configuration file.
    fn apply_overrides(&self, config: &mut ResamplerConfig) {
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(rate) = self.input_rate {
            config.input_rate = rate;
        }
        if let Some(rate) = self.output_rate {
            config.output_rate = rate;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if self.stream {
            config.stream = true;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_ref())
        .context("Failed to load configuration")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pcm_resample={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    args.apply_overrides(&mut config.resampler);

    run(&args, &config.resampler)
}

fn run(args: &Args, config: &ResamplerConfig) -> Result<()> {
    let data = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let pcm = input::pcm_payload(&args.input, &data)?;

    info!(
        "Resampling {} ({} bytes): {}Hz -> {}Hz, {} channels, {}, quality {}",
        args.input.display(),
        pcm.len(),
        config.input_rate,
        config.output_rate,
        config.channels,
        config.format,
        config.quality
    );

    let output = create_output(&args.output)?;
    let result = resample_into(output, pcm, config, args.chunk_bytes);
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(&args.output) {
            warn!("Failed to remove {}: {}", args.output.display(), e);
        }
    }
    let (written, stats) = result?;

    info!(
        "Wrote {} bytes to {} ({} of {} input bytes consumed)",
        written,
        args.output.display(),
        stats.consumed_bytes,
        stats.input_bytes
    );
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn resample_into(
    output: BufWriter<File>,
    pcm: &[u8],
    config: &ResamplerConfig,
    chunk_bytes: usize,
) -> Result<(u64, ConvertStats)> {
    let mut resampler = Resampler::new(CountingSink::new(output), config)
        .context("Failed to create resampler")?;

    let chunk_bytes = config.stream.then_some(chunk_bytes);
    let stats = convert_all(&mut resampler, pcm, chunk_bytes).context("Resampling failed")?;

    resampler
        .get_mut()
        .flush()
        .context("Failed to flush output")?;
    Ok((resampler.get_ref().written(), stats))
}
