use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

mod batch;
mod bitrate;
mod config;
mod error;
mod job;
mod probe;

pub use batch::{Batch, BatchReport, FailurePolicy, JobOutcome, Rung, default_rungs};
pub use bitrate::{
    Bitrate, DEFAULT_PERCENT_AUDIO_BITRATE, DEFAULT_TARGET_PERCENT, FALLBACK_SOURCE_BITRATE,
    target_bitrate,
};
pub use config::{EncoderConfig, FFMPEG_BINARY_ENV, FFPROBE_BINARY_ENV};
pub use error::{Error, Result};
pub use job::{DEFAULT_AUDIO_CODEC, DEFAULT_PRESET, DEFAULT_VIDEO_CODEC, JobBuilder};
pub use probe::{FormatInfo, Ffprobe, ProbeReport, StreamInfo};

/// Validates that the given path points to a runnable ffmpeg executable.
/// Runs `ffmpeg -version` and returns the first line of its output.
async fn validate_executable(path: &Path) -> Result<String> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .await
        .map_err(|e| Error::InvalidExecutable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::InvalidExecutable {
            path: path.to_path_buf(),
            reason: format!(
                "'-version' command failed with exit code: {:?}",
                output.status.code()
            ),
        });
    }

    let version_string = String::from_utf8(output.stdout)
        .map_err(|e| Error::InvalidExecutable {
            path: path.to_path_buf(),
            reason: format!("Failed to parse version output as UTF-8: {}", e),
        })?
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if version_string.is_empty() {
        return Err(Error::InvalidExecutable {
            path: path.to_path_buf(),
            reason: "ffmpeg -version returned empty output".to_string(),
        });
    }

    Ok(version_string)
}

/// Represents the ffmpeg executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    executable_path: PathBuf,
    version: String,
}

impl Ffmpeg {
    /// Discovers ffmpeg via `FFMPEG_BINARY` or the system PATH.
    pub async fn new() -> Result<Self> {
        Self::with_config(&EncoderConfig::from_env()).await
    }

    /// Discovers ffmpeg using an explicit configuration.
    ///
    /// Fails with `ExecutableNotFound` before anything is run when no
    /// candidate exists.
    pub async fn with_config(config: &EncoderConfig) -> Result<Self> {
        let path_var = std::env::var_os("PATH");
        let executable_path = config.resolve_ffmpeg(path_var.as_deref())?;
        Self::new_with_path(executable_path).await
    }

    /// Creates a new Ffmpeg instance with a specific executable path.
    ///
    /// The path must name an existing file; `PATH` is not consulted.
    pub async fn new_with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let executable_path = path.into();
        if !executable_path.is_file() {
            return Err(Error::ExecutableNotFound {
                name: executable_path.display().to_string(),
                searched_paths: vec![executable_path],
            });
        }
        let version = validate_executable(&executable_path).await?;
        debug!(path = %executable_path.display(), %version, "Found ffmpeg");
        Ok(Self {
            executable_path,
            version,
        })
    }

    /// Returns the first line of `ffmpeg -version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    /// Starts building a new encoding job.
    pub fn job(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> JobBuilder {
        JobBuilder::new(self.executable_path.clone(), input, output)
    }

    /// Encodes `input` into `output` with the given target bitrates and the
    /// default codecs and preset, waiting for ffmpeg to finish.
    pub async fn compress(
        &self,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        video_bitrate: Bitrate,
        audio_bitrate: Bitrate,
    ) -> Result<PathBuf> {
        self.job(input, output)
            .video_bitrate(video_bitrate)
            .audio_bitrate(audio_bitrate)
            .run()
            .await
    }

    /// Encodes `input` at `percent` % of its probed video bitrate.
    ///
    /// Without an `ffprobe`, or when probing fails, the source is assumed to
    /// run at [`FALLBACK_SOURCE_BITRATE`].
    pub async fn compress_percent(
        &self,
        ffprobe: Option<&Ffprobe>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        percent: f64,
        audio_bitrate: Bitrate,
    ) -> Result<PathBuf> {
        let input = input.into();
        let source = match ffprobe {
            Some(ffprobe) => ffprobe.source_bitrate(&input).await,
            None => None,
        };
        match source {
            Some(b) => info!("Source video bitrate: {}", b),
            None => info!("Source bitrate unknown, assuming {}", FALLBACK_SOURCE_BITRATE),
        }

        let target = target_bitrate(source, percent)?;
        info!("Target video bitrate ({}%): {}", percent, target);
        self.compress(input, output, target, audio_bitrate).await
    }

    /// Builds a batch with one job per rung, writing each rung's file into
    /// `out_dir`.
    pub fn ladder(
        &self,
        input: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        rungs: &[Rung],
    ) -> Batch {
        let input = input.as_ref();
        let out_dir = out_dir.as_ref();
        rungs.iter().fold(Batch::new(), |batch, rung| {
            batch.job(
                self.job(input, out_dir.join(&rung.file_name))
                    .video_bitrate(rung.video_bitrate)
                    .audio_bitrate(rung.audio_bitrate),
            )
        })
    }
}
