use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Environment variable naming the ffmpeg executable explicitly.
pub const FFMPEG_BINARY_ENV: &str = "FFMPEG_BINARY";
/// Environment variable naming the ffprobe executable explicitly.
pub const FFPROBE_BINARY_ENV: &str = "FFPROBE_BINARY";

pub(crate) const FFMPEG: &str = "ffmpeg";
pub(crate) const FFPROBE: &str = "ffprobe";

/// Where to find the `ffmpeg` and `ffprobe` executables.
///
/// The configuration is only ever read; building one never touches the
/// process environment. Each executable is resolved in this order:
///
/// 1. an explicit path (`ffmpeg_path` / `ffprobe_path`),
/// 2. `<bin_dir>/<name>`,
/// 3. the directories listed in `PATH`.
#[derive(Debug, Clone, Default)]
pub struct EncoderConfig {
    bin_dir: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the explicit paths from `FFMPEG_BINARY` and `FFPROBE_BINARY`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            bin_dir: None,
            ffmpeg: non_empty(FFMPEG_BINARY_ENV),
            ffprobe: non_empty(FFPROBE_BINARY_ENV),
        }
    }

    /// Sets the install directory searched before `PATH`.
    pub fn bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(dir.into());
        self
    }

    /// Pins the ffmpeg executable.
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = Some(path.into());
        self
    }

    /// Pins the ffprobe executable.
    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe = Some(path.into());
        self
    }

    /// Resolves the ffmpeg executable against the given `PATH` value.
    pub fn resolve_ffmpeg(&self, path_env: Option<&OsStr>) -> Result<PathBuf, Error> {
        resolve(self.ffmpeg.as_deref(), FFMPEG, self.bin_dir.as_deref(), path_env)
    }

    /// Resolves the ffprobe executable against the given `PATH` value.
    pub fn resolve_ffprobe(&self, path_env: Option<&OsStr>) -> Result<PathBuf, Error> {
        resolve(self.ffprobe.as_deref(), FFPROBE, self.bin_dir.as_deref(), path_env)
    }
}

fn resolve(
    explicit: Option<&Path>,
    name: &str,
    bin_dir: Option<&Path>,
    path_env: Option<&OsStr>,
) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let mut dirs: Vec<PathBuf> = bin_dir.map(Path::to_path_buf).into_iter().collect();
    if let Some(path_env) = path_env {
        dirs.extend(env::split_paths(path_env));
    }
    find_executable_in_dirs(name, dirs)
}

/// Platform file name of an executable, e.g. `ffmpeg.exe` on Windows.
pub(crate) fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Searches the given directories, in order, for the named executable.
fn find_executable_in_dirs(name: &str, dirs: Vec<PathBuf>) -> Result<PathBuf, Error> {
    let file_name = executable_name(name);
    for dir in &dirs {
        let executable_path = dir.join(&file_name);
        if executable_path.is_file() {
            return Ok(executable_path);
        }
    }

    Err(Error::ExecutableNotFound {
        name: name.to_string(),
        searched_paths: dirs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(executable_name(name));
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_explicit_path_wins() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), FFMPEG);

        let config = EncoderConfig::new()
            .bin_dir(tmp.path())
            .ffmpeg_path("/opt/custom/ffmpeg");

        let resolved = config.resolve_ffmpeg(None).unwrap();
        assert_eq!(resolved, PathBuf::from("/opt/custom/ffmpeg"));
    }

    #[test]
    fn test_bin_dir_searched_before_path() {
        let bin_dir = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        let expected = touch(bin_dir.path(), FFMPEG);
        touch(on_path.path(), FFMPEG);

        let path_env = env::join_paths([on_path.path()]).unwrap();
        let config = EncoderConfig::new().bin_dir(bin_dir.path());

        assert_eq!(config.resolve_ffmpeg(Some(&path_env)).unwrap(), expected);
    }

    #[test]
    fn test_found_on_path() {
        let empty = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        let expected = touch(on_path.path(), FFPROBE);

        let path_env: OsString = env::join_paths([empty.path(), on_path.path()]).unwrap();
        let resolved = EncoderConfig::new().resolve_ffprobe(Some(&path_env)).unwrap();

        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_not_found_lists_searched_paths() {
        let bin_dir = tempfile::tempdir().unwrap();
        let on_path = tempfile::tempdir().unwrap();
        let path_env = env::join_paths([on_path.path()]).unwrap();

        let err = EncoderConfig::new()
            .bin_dir(bin_dir.path())
            .resolve_ffmpeg(Some(&path_env))
            .unwrap_err();

        match err {
            Error::ExecutableNotFound {
                name,
                searched_paths,
            } => {
                assert_eq!(name, "ffmpeg");
                assert_eq!(
                    searched_paths,
                    vec![bin_dir.path().to_path_buf(), on_path.path().to_path_buf()]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
