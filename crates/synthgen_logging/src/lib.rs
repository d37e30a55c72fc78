//! Logging setup for synthgen binaries: `tracing` to a size-capped log file and to stderr.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "synthgen=info,synthgen_db=info";

/// When the live log file is archived and how many archives survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// Archives kept next to the live file; 0 truncates the live file instead
    pub keep: usize,
    /// Size at which the live file is archived
    pub max_bytes: u64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            keep: 4,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct LogConfig<'a> {
    /// Stem of the log file name
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only
    pub verbose: bool,
    /// Log directory; `<synthgen home>/logs` when unset
    pub dir: Option<PathBuf>,
    pub rotation: Rotation,
}

/// Install the global subscriber. Returns the path of the live log file.
pub fn init_logging(config: LogConfig<'_>) -> Result<PathBuf> {
    let dir = config
        .dir
        .unwrap_or_else(|| synthgen_home().join("logs"));
    let log_file = LogFile::open(&dir, config.app_name, config.rotation)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
    let live_path = log_file.live_path();

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(live_path)
}

/// `$SYNTHGEN_HOME`, or `~/.synthgen` (`./.synthgen` without a home directory).
pub fn synthgen_home() -> PathBuf {
    if let Ok(home) = std::env::var("SYNTHGEN_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".synthgen")
}

/// `<dir>/<app>.log`, archived as `<app>.log.1` (newest) up to `<app>.log.<keep>`.
struct LogFile {
    dir: PathBuf,
    app_name: String,
    rotation: Rotation,
    file: Option<File>,
    written: u64,
}

impl LogFile {
    fn open(dir: &Path, app_name: &str, rotation: Rotation) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            rotation,
            file: None,
            written: 0,
        };
        let file = append_to(&log.live_path())?;
        log.written = file.metadata()?.len();
        log.file = Some(file);

        // Leftover from an earlier run that already hit the cap.
        if log.written > 0 && log.written >= rotation.max_bytes {
            log.roll()?;
        }
        Ok(log)
    }

    fn live_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.app_name))
    }

    fn archive_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{n}", self.app_name))
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let live = self.live_path();
        let file = match self.rotation.keep {
            0 => OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&live)?,
            keep => {
                remove_if_present(&self.archive_path(keep))?;
                for n in (1..keep).rev() {
                    let from = self.archive_path(n);
                    if from.exists() {
                        fs::rename(from, self.archive_path(n + 1))?;
                    }
                }
                fs::rename(&live, self.archive_path(1))?;
                append_to(&live)?
            }
        };

        self.file = Some(file);
        self.written = 0;
        Ok(())
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.rotation.max_bytes {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is closed"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rotation(keep: usize, max_bytes: u64) -> Rotation {
        Rotation { keep, max_bytes }
    }

    #[test]
    fn test_archives_shift_and_oldest_drops() {
        let tmp = TempDir::new().unwrap();
        let mut log = LogFile::open(tmp.path(), "synthgen", rotation(2, 16)).unwrap();

        for chunk in [b"aaaaaaaaaa", b"bbbbbbbbbb", b"cccccccccc", b"dddddddddd"] {
            log.write_all(chunk).unwrap();
        }
        log.flush().unwrap();

        let read = |name: &str| fs::read(tmp.path().join(name)).unwrap();
        assert_eq!(read("synthgen.log"), b"dddddddddd");
        assert_eq!(read("synthgen.log.1"), b"cccccccccc");
        assert_eq!(read("synthgen.log.2"), b"bbbbbbbbbb");
        assert!(!tmp.path().join("synthgen.log.3").exists());
    }

    #[test]
    fn test_keep_zero_truncates_in_place() {
        let tmp = TempDir::new().unwrap();
        let mut log = LogFile::open(tmp.path(), "synthgen", rotation(0, 16)).unwrap();

        log.write_all(b"first-line").unwrap();
        log.write_all(b"second-one").unwrap();
        log.flush().unwrap();

        assert_eq!(fs::read(tmp.path().join("synthgen.log")).unwrap(), b"second-one");
        assert!(!tmp.path().join("synthgen.log.1").exists());
    }

    #[test]
    fn test_oversized_leftover_is_archived_on_open() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("synthgen.log"), vec![b'x'; 32]).unwrap();

        let log = LogFile::open(tmp.path(), "synthgen", rotation(3, 16)).unwrap();
        assert_eq!(log.written, 0);
        assert_eq!(fs::read(tmp.path().join("synthgen.log.1")).unwrap().len(), 32);
        assert_eq!(fs::read(tmp.path().join("synthgen.log")).unwrap().len(), 0);
    }

    #[test]
    fn test_small_leftover_is_appended_to() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("synthgen.log"), b"old\n").unwrap();

        let mut log = LogFile::open(tmp.path(), "synthgen", Rotation::default()).unwrap();
        log.write_all(b"new\n").unwrap();
        log.flush().unwrap();

        assert_eq!(fs::read(tmp.path().join("synthgen.log")).unwrap(), b"old\nnew\n");
    }
}
