use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::bitrate::Bitrate;
use crate::config::EncoderConfig;
use crate::error::Error;

/// Media information reported by `ffprobe -print_format json`.
///
/// Only the fields this crate needs are captured.
#[derive(Debug, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
    pub format: Option<FormatInfo>,
}

/// A single stream of the probed file.
#[derive(Debug, Deserialize)]
pub struct StreamInfo {
    /// `"video"`, `"audio"`, `"subtitle"`, ...
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    /// Bits per second, as the decimal string ffprobe prints.
    pub bit_rate: Option<String>,
}

/// Container-level information.
#[derive(Debug, Deserialize)]
pub struct FormatInfo {
    pub format_name: Option<String>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
}

fn parse_bitrate(raw: Option<&String>) -> Option<Bitrate> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .and_then(|bps| Bitrate::from_bps(bps).ok())
}

impl ProbeReport {
    /// Parses the JSON document printed by ffprobe.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn first_stream(&self, kind: &str) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    }

    /// Bitrate of the first video stream.
    ///
    /// Some containers (webm, mkv) do not report per-stream bitrates; the
    /// container bitrate is used then, as long as there is a video stream.
    pub fn video_bitrate(&self) -> Option<Bitrate> {
        let stream = self.first_stream("video")?;
        parse_bitrate(stream.bit_rate.as_ref()).or_else(|| {
            self.format
                .as_ref()
                .and_then(|f| parse_bitrate(f.bit_rate.as_ref()))
        })
    }

    /// Bitrate of the first audio stream.
    pub fn audio_bitrate(&self) -> Option<Bitrate> {
        parse_bitrate(self.first_stream("audio")?.bit_rate.as_ref())
    }

    pub fn duration(&self) -> Option<Duration> {
        let secs = self.format.as_ref()?.duration.as_ref()?.trim().parse::<f64>().ok()?;
        Duration::try_from_secs_f64(secs).ok()
    }
}

/// Represents the ffprobe executable.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    executable_path: PathBuf,
}

impl Ffprobe {
    /// Locates ffprobe using `FFPROBE_BINARY` and the system `PATH`.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(&EncoderConfig::from_env())
    }

    /// Locates ffprobe using an explicit configuration.
    pub fn with_config(config: &EncoderConfig) -> Result<Self, Error> {
        let path_var = std::env::var_os("PATH");
        let executable_path = config.resolve_ffprobe(path_var.as_deref())?;
        Self::new_with_path(executable_path)
    }

    /// Uses a specific ffprobe executable.
    ///
    /// The path must name an existing file; `PATH` is not consulted.
    pub fn new_with_path(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let executable_path = path.into();
        if !executable_path.is_file() {
            return Err(Error::ExecutableNotFound {
                name: executable_path.display().to_string(),
                searched_paths: vec![executable_path],
            });
        }
        Ok(Self { executable_path })
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    /// Probes a media file.
    ///
    /// # Errors
    ///
    /// `ProbeFailed` if ffprobe cannot be spawned, exits non-zero, or
    /// prints something that is not the expected JSON.
    pub async fn probe(&self, path: impl AsRef<Path>) -> Result<ProbeReport, Error> {
        let path = path.as_ref();
        let failed = |reason: String| Error::ProbeFailed {
            path: path.to_path_buf(),
            reason,
        };

        debug!(
            program = %self.executable_path.display(),
            file = %path.display(),
            "Running ffprobe"
        );
        let output = Command::new(&self.executable_path)
            .args(["-v", "error", "-print_format", "json"])
            .args(["-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !output.status.success() {
            return Err(failed(format!(
                "ffprobe exited with code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        ProbeReport::from_json(&json).map_err(|e| failed(format!("invalid ffprobe output: {e}")))
    }

    /// Video bitrate of `path`, or `None` when it cannot be determined.
    ///
    /// Probe failures are logged and swallowed.
    pub async fn source_bitrate(&self, path: impl AsRef<Path>) -> Option<Bitrate> {
        match self.probe(path.as_ref()).await {
            Ok(report) => {
                let bitrate = report.video_bitrate();
                if bitrate.is_none() {
                    warn!("No video bitrate reported for {}", path.as_ref().display());
                }
                bitrate
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4_REPORT: &str = r#"{
        "streams": [
            { "index": 0, "codec_name": "h264", "codec_type": "video", "bit_rate": "11302000" },
            { "index": 1, "codec_name": "aac", "codec_type": "audio", "bit_rate": "192000" }
        ],
        "format": {
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "10.010000",
            "bit_rate": "11500000"
        }
    }"#;

    const WEBM_REPORT: &str = r#"{
        "streams": [
            { "index": 0, "codec_name": "opus", "codec_type": "audio" },
            { "index": 1, "codec_name": "vp9", "codec_type": "video" }
        ],
        "format": { "format_name": "matroska,webm", "duration": "N/A", "bit_rate": "2400000" }
    }"#;

    #[test]
    fn test_stream_bitrates() {
        let report = ProbeReport::from_json(MP4_REPORT).unwrap();
        assert_eq!(report.video_bitrate().unwrap().kbps(), 11302);
        assert_eq!(report.audio_bitrate().unwrap().to_string(), "192k");
        let duration = report.duration().unwrap();
        assert!((duration.as_secs_f64() - 10.01).abs() < 1e-6);
    }

    #[test]
    fn test_falls_back_to_container_bitrate() {
        let report = ProbeReport::from_json(WEBM_REPORT).unwrap();
        assert_eq!(report.video_bitrate().unwrap().kbps(), 2400);
        assert!(report.audio_bitrate().is_none());
        assert!(report.duration().is_none());
    }

    #[test]
    fn test_no_video_stream() {
        let json = r#"{ "streams": [], "format": { "bit_rate": "128000" } }"#;
        let report = ProbeReport::from_json(json).unwrap();
        assert!(report.video_bitrate().is_none());
    }

    #[test]
    fn test_empty_document() {
        let report = ProbeReport::from_json("{}").unwrap();
        assert!(report.streams.is_empty());
        assert!(report.format.is_none());
    }

    #[test]
    fn test_new_with_path_requires_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Ffprobe::new_with_path(tmp.path().join("ffprobe")).unwrap_err();
        assert!(matches!(err, Error::ExecutableNotFound { .. }), "{err:?}");
    }
}
