//! ActionLogger - production sink for sync events
//!
//! Every recorded action becomes one line, `"<Label>: <path>"`, appended to
//! the action log file and then echoed to standard output. The file is
//! opened once, in append mode, and flushed after each line so the log
//! survives a crash mid-pass. All write errors are non-fatal, including a
//! closed stdout: they are reported via `tracing::warn!` and never reach
//! the synchronizer.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use treemirror_core::{
    domain::{SyncAction, SyncEvent},
    ports::sync_log::ISyncLog,
};

/// Destination of the per-line echo (stdout in production)
type Echo = Mutex<Box<dyn Write + Send>>;

/// Writes sync events to an append-only log file and echoes them to stdout.
pub struct ActionLogger {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
    echo: Option<Echo>,
}

impl ActionLogger {
    /// Opens (or creates) the log file at `path` for appending.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create log directory {}", parent.display())
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open action log {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Action log opened");

        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
            echo: Some(Mutex::new(Box::new(io::stdout()))),
        })
    }

    /// Disables the stdout copy of each line; the file still receives it.
    pub fn without_stdout(mut self) -> Self {
        self.echo = None;
        self
    }

    /// Sends the echo copy of each line to `writer` instead of stdout.
    pub fn with_echo(mut self, writer: impl Write + Send + 'static) -> Self {
        self.echo = Some(Mutex::new(Box::new(writer)));
        self
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> io::Result<()> {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(file, "{line}")?;
        file.flush()
    }

    fn echo(echo: &Echo, line: &str) -> io::Result<()> {
        let mut out = match echo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{line}")?;
        out.flush()
    }
}

impl ISyncLog for ActionLogger {
    fn record(&self, action: SyncAction, path: &Path) {
        let line = SyncEvent::new(action, path).to_string();

        // File first: a broken stdout must not cost the persistent record
        if let Err(e) = self.append(&line) {
            tracing::warn!(
                error = %e,
                log_file = %self.path.display(),
                "Failed to write action log entry"
            );
        }

        if let Some(echo) = &self.echo {
            if let Err(e) = Self::echo(echo, &line) {
                tracing::warn!(error = %e, "Failed to echo action to stdout");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/logs/actions.log");

        let logger = ActionLogger::open(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(logger.path(), path.as_path());
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = TempDir::new().unwrap();
        assert!(ActionLogger::open(dir.path()).is_err());
    }

    #[test]
    fn test_record_writes_one_line_per_action() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let logger = ActionLogger::open(&path).unwrap().without_stdout();

        logger.record(SyncAction::CreateDirectory, Path::new("/replica/docs"));
        logger.record(SyncAction::CreateFile, Path::new("/replica/docs/a.txt"));
        logger.record(SyncAction::DeleteFile, Path::new("/replica/old.txt"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Created directory: /replica/docs",
                "Created: /replica/docs/a.txt",
                "Deleted: /replica/old.txt",
            ]
        );
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_lines_are_visible_before_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let logger = ActionLogger::open(&path).unwrap().without_stdout();

        logger.record(SyncAction::UpdateFile, Path::new("/replica/x"));

        // Flushed per line, so readable while the logger is alive
        assert_eq!(fs::read_to_string(&path).unwrap(), "Updated: /replica/x\n");
        drop(logger);
    }

    /// Writer that fails like stdout on a closed pipe
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    /// Writer whose output the test can read back
    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failing_echo_still_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let logger = ActionLogger::open(&path).unwrap().with_echo(BrokenPipe);

        logger.record(SyncAction::CreateFile, Path::new("/replica/f1.txt"));
        logger.record(SyncAction::CreateFile, Path::new("/replica/f2.txt"));

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Created: /replica/f1.txt\nCreated: /replica/f2.txt\n"
        );
    }

    #[test]
    fn test_echo_receives_same_line_as_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let out = SharedBuf::default();
        let logger = ActionLogger::open(&path)
            .unwrap()
            .with_echo(out.clone());

        logger.record(SyncAction::DeleteDirectory, Path::new("/replica/old"));

        let echoed = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(echoed, "Deleted directory: /replica/old\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), echoed);
    }

    #[test]
    fn test_reopen_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");

        {
            let logger = ActionLogger::open(&path).unwrap().without_stdout();
            logger.record(SyncAction::CreateEmptyFile, Path::new("/r/empty"));
        }
        {
            let logger = ActionLogger::open(&path).unwrap().without_stdout();
            logger.record(SyncAction::DeleteDirectory, Path::new("/r/gone"));
        }

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Created empty file: /r/empty\nDeleted directory: /r/gone\n"
        );
    }
}
