//! Shared logging setup for tagsync binaries.
//!
//! Diagnostics always go to stderr so that stdout stays reserved for reports
//! (and for `--json` payloads). A size-rotated log file can be added on top.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_CONSOLE_FILTER: &str = "warn";
const VERBOSE_CONSOLE_FILTER: &str = "tagsync=debug,warn";
const DEFAULT_FILE_FILTER: &str = "tagsync=info,warn";
const MAX_LOG_FILES: usize = 3;
const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Logging configuration shared by tagsync binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Directory for the rotated log file. `None` disables file logging.
    pub log_dir: Option<&'a Path>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides both filters when set.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_CONSOLE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER))
    };

    let file_layer = match config.log_dir {
        Some(dir) => {
            let writer = SharedLogWriter::new(dir.to_path_buf(), config.app_name)
                .context("Failed to initialize log file writer")?;
            let file_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER));
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Append-only log file that rolls over to `<name>.log.N` once it exceeds
/// `max_size` bytes. At most `max_files` files (current included) are kept.
struct RotatingLogFile {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    written: u64,
}

impl RotatingLogFile {
    fn open(dir: PathBuf, app_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let mut log = Self {
            dir,
            base_name: sanitize_name(app_name),
            max_files: max_files.max(1),
            max_size,
            file: None,
            written: 0,
        };
        log.reopen()?;
        if log.written > log.max_size {
            log.rotate()?;
        }
        Ok(log)
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base_name))
    }

    fn generation_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base_name, generation))
    }

    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        let oldest = self.max_files - 1;
        if oldest == 0 {
            // Single-file mode: truncate in place.
            fs::write(self.current_path(), b"")?;
            return self.reopen();
        }

        let expired = self.generation_path(oldest);
        if expired.exists() {
            fs::remove_file(&expired)?;
        }
        for generation in (1..oldest).rev() {
            let from = self.generation_path(generation);
            if from.exists() {
                fs::rename(&from, self.generation_path(generation + 1))?;
            }
        }
        let current = self.current_path();
        if current.exists() {
            fs::rename(&current, self.generation_path(1))?;
        }

        self.reopen()
    }
}

impl Write for RotatingLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
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

#[derive(Clone)]
struct SharedLogWriter {
    inner: Arc<Mutex<RotatingLogFile>>,
}

impl SharedLogWriter {
    fn new(dir: PathBuf, app_name: &str) -> Result<Self> {
        let display = dir.display().to_string();
        let log = RotatingLogFile::open(dir, app_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file in {}", display))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(log)),
        })
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogWriter {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
