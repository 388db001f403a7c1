use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

/// Log files larger than this are shrunk to their most recent half on startup.
pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Append-only log sink that reopens its file when it is deleted while the
/// process runs.
struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: open_append(path)?,
        })
    }

    fn reopen_if_missing(&mut self) -> io::Result<()> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            self.file = open_append(&self.path)?;
        }
        Ok(())
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.reopen_if_missing()?;
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Keep at most the last `limit / 2` bytes of a log larger than `limit`,
/// starting on a line boundary. Returns whether the file was rewritten.
fn shrink_log(path: &Path, limit: u64) -> io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    if size <= limit {
        return Ok(false);
    }

    let contents = fs::read(path)?;
    let keep = usize::try_from(limit / 2).unwrap_or(usize::MAX);
    let tail_start = contents.len().saturating_sub(keep);
    let keep_from = contents[tail_start..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(contents.len(), |pos| tail_start + pos + 1);
    fs::write(path, &contents[keep_from..])?;
    Ok(true)
}

/// `--debug` wins over an explicit level; unknown level names fall back to
/// `info`.
pub fn resolve_level(debug: bool, level: Option<&str>) -> LevelFilter {
    if debug {
        return LevelFilter::Debug;
    }
    level
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) {
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("updraft")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(path) = log_file {
        if let Err(error) = shrink_log(path, MAX_LOG_SIZE) {
            eprintln!("Failed to shrink log file {}: {error}", path.display());
        }
        match LogFile::open(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(error) => eprintln!("Failed to open log file {}: {error}", path.display()),
        }
    }

    let _ = CombinedLogger::init(loggers);

    if let Some(path) = log_file {
        log::debug!("Logging to {}", path.display());
    }
}
