use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{name} executable not found. Searched paths: {searched_paths:?}")]
    ExecutableNotFound {
        name: String,
        searched_paths: Vec<PathBuf>,
    },
    #[error("Invalid executable at '{path}': {reason}")]
    InvalidExecutable { path: PathBuf, reason: String },
    #[error("Input file not found or unreadable: '{path}'")]
    InputNotFound { path: PathBuf },
    #[error("Failed to spawn ffmpeg process: {source}")]
    ProcessSpawnFailed { source: std::io::Error },
    #[error("Encoding of '{output}' failed with exit code: {exit_code:?}")]
    EncodingFailed {
        output: PathBuf,
        exit_code: Option<i32>,
    },
    #[error("{failed} of {total} jobs failed")]
    BatchFailed { failed: usize, total: usize },
    #[error("Invalid bitrate '{value}': {reason}")]
    InvalidBitrate { value: String, reason: String },
    #[error("Failed to probe '{path}': {reason}")]
    ProbeFailed { path: PathBuf, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
