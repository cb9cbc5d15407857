use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::bitrate::Bitrate;
use crate::error::Error;

/// Video codec used unless overridden.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Audio codec used unless overridden.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Encoder speed/quality preset used unless overridden.
pub const DEFAULT_PRESET: &str = "medium";

/// A fluent builder for a single ffmpeg encoding job.
///
/// One builder describes one output file. The output is always
/// overwritten if it already exists.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    // The path to the ffmpeg executable, copied from the Ffmpeg instance
    ffmpeg_path: PathBuf,
    input: PathBuf,
    output: PathBuf,

    // "last call wins" for every option
    video_bitrate: Option<Bitrate>,
    audio_bitrate: Option<Bitrate>,
    video_codec: String,
    audio_codec: String,
    preset: String,
}

impl JobBuilder {
    /// Creates a new `JobBuilder` instance.
    ///
    /// This is typically called via `Ffmpeg::job()`.
    pub fn new(
        ffmpeg_path: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        JobBuilder {
            ffmpeg_path: ffmpeg_path.into(),
            input: input.into(),
            output: output.into(),
            video_bitrate: None,
            audio_bitrate: None,
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
        }
    }

    /// Sets the target video bitrate (`-b:v`).
    pub fn video_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.video_bitrate = Some(bitrate);
        self
    }

    /// Sets the target audio bitrate (`-b:a`).
    pub fn audio_bitrate(mut self, bitrate: Bitrate) -> Self {
        self.audio_bitrate = Some(bitrate);
        self
    }

    /// Overrides the video codec.
    ///
    /// e.g., `"libx265"`, `"libsvtav1"`
    pub fn video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self
    }

    /// Overrides the audio codec.
    ///
    /// e.g., `"libopus"`, `"ac3"`
    pub fn audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self
    }

    /// Sets the encoder preset.
    ///
    /// e.g., `"veryfast"`, `"slow"`
    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn create_process(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Runs ffmpeg and waits for it to exit, returning the raw `ExitStatus`.
    ///
    /// The exit status is not interpreted. The `stdout` and `stderr` of the
    /// child process are inherited by the parent.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if the process could not be spawned.
    pub async fn status(&self) -> Result<ExitStatus, Error> {
        debug!(
            program = %self.ffmpeg_path.display(),
            args = ?self.build_args(),
            "Spawning ffmpeg"
        );
        self.create_process().status().await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ExecutableNotFound {
                    name: self.ffmpeg_path.display().to_string(),
                    searched_paths: vec![self.ffmpeg_path.clone()],
                }
            } else {
                Error::ProcessSpawnFailed { source: e }
            }
        })
    }

    /// Runs the job to completion and returns the output path on success.
    ///
    /// Fails with `InputNotFound` without spawning anything when the input
    /// is not an existing, readable file, and with `EncodingFailed` when
    /// ffmpeg exits with a non-zero code. A failed job's partial output is
    /// left as is.
    /// On success a confirmation line naming the output is printed to stdout.
    pub async fn run(self) -> Result<PathBuf, Error> {
        if !self.input.is_file() || tokio::fs::File::open(&self.input).await.is_err() {
            return Err(Error::InputNotFound { path: self.input });
        }

        info!(
            input = %self.input.display(),
            output = %self.output.display(),
            video_bitrate = ?self.video_bitrate.map(|b| b.to_string()),
            audio_bitrate = ?self.audio_bitrate.map(|b| b.to_string()),
            "Starting encode"
        );

        let status = self.status().await?;
        if !status.success() {
            return Err(Error::EncodingFailed {
                output: self.output,
                exit_code: status.code(),
            });
        }

        info!(output = %self.output.display(), "Encode finished");
        println!("Done! Compressed file saved as: {}", self.output.display());
        Ok(self.output)
    }

    /// Builds the final list of command-line arguments based on the configured options.
    ///
    /// Paths are passed through untouched, so names that are not valid
    /// UTF-8 reach ffmpeg byte for byte.
    pub fn build_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-y".into()];

        args.extend(["-i".into(), self.input.clone().into_os_string()]);

        args.extend(["-c:v".into(), self.video_codec.clone().into()]);
        if let Some(b) = &self.video_bitrate {
            args.extend(["-b:v".into(), b.to_string().into()]);
        }

        args.extend(["-c:a".into(), self.audio_codec.clone().into()]);
        if let Some(b) = &self.audio_bitrate {
            args.extend(["-b:a".into(), b.to_string().into()]);
        }

        args.extend(["-preset".into(), self.preset.clone().into()]);

        args.push(self.output.clone().into_os_string());
        args
    }
}
