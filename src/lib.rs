//! # eventlog
//!
//! eventlog is an in-process logging engine that never makes the caller wait
//! for the disk. Each call builds a record and pushes it onto a lock-free
//! queue. A background writer drains the queue into dated files, rotating
//! the active file once it passes a size threshold, and a second background
//! worker deletes files older than the retention window.
//!
//! Files are organized by year and month:
//!
//! ```text
//! Logs/2025/April/billing_20250401.log     active file for today
//! Logs/2025/April/billing_20250401.log1    first rotation of the day
//! Logs/2025/April/billing_20250401.log2    second rotation of the day
//! ```
//!
//! Each record is one line:
//!
//! ```text
//! [2025-04-01 19:55:02.127] [Error] [Billing] [Invoice.send] Upload failed | Exception: timed out
//! ```
//!
//! Logging is best effort. Write, rotation and cleanup failures are dropped
//! silently, and records still queued when the process dies are lost. Only
//! construction can fail.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eventlog::{LoggerConfiguration, RotationSize};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logger = LoggerConfiguration::new("billing")
//!         .log_directory("./logs")
//!         .max_file_size(RotationSize::MB(10))
//!         .delete_old_logs(true)
//!         .retention_days(14)
//!         .enable_info(true)
//!         .build()?;
//!
//!     logger.info("service started");
//!     eventlog::warning!(logger, category: "Billing", "invoice {} is overdue", 1042);
//!
//!     let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
//!     eventlog::error!(logger, error: &err, "upload failed");
//!
//!     // Writes out everything still queued, waiting at most five seconds.
//!     logger.shutdown();
//!     Ok(())
//! }
//! ```
use {
    chrono::Local,
    crossbeam_queue::SegQueue,
    std::{
        error::Error,
        fs,
        path::{Path, PathBuf},
        sync::Arc,
        thread::{self, JoinHandle},
        time::{Duration, Instant, SystemTime},
    },
};

pub mod cleanup;
mod config;
pub mod layout;
#[cfg(feature = "layer")]
mod layer;
mod macros;
mod record;
mod signal;
mod writer;

pub use {
    cleanup::{cleanup_old_logs, CleanupReport},
    config::{is_development_environment, LoggerConfiguration, RotationSize, ENVIRONMENT_VARIABLES},
    layout::LogLayout,
    record::{render_error, Caller, LogLevel, LogRecord, DEFAULT_CATEGORY},
};

#[cfg(feature = "layer")]
pub use layer::EventLogLayer;

use {
    cleanup::Cleaner,
    config::Settings,
    signal::Cancellation,
    writer::Writer,
};

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors that can occur when using the logging engine.
///
/// Only [`LoggerService::new`] and the explicit maintenance calls return
/// these; failures inside the background workers are dropped.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("Failed to read directory '{0}': {1}")]
    ReadDirectoryFailed(PathBuf, String),
    #[error("Failed to get next file path for '{0}'")]
    GetNextFilePathError(PathBuf),
    #[error("Failed to rename file from '{from}' to '{to}': {error}")]
    RenameFileError { from: PathBuf, to: PathBuf, error: String },
    #[error("Failed to remove '{path}': {error}")]
    RemoveFileError { path: PathBuf, error: String },
    #[error("Failed to spawn worker thread '{0}': {1}")]
    SpawnWorkerFailed(String, String),
    #[error("File IO error: {0}")]
    FileIOError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// The logging facade.
///
/// Cheap to call from any number of threads: a call checks whether its level
/// is enabled, builds a [`LogRecord`] and pushes it onto an unbounded queue.
/// It never touches the filesystem and never blocks on the writer.
///
/// Share it behind an [`Arc`] when several owners need it. Dropping the last
/// owner, or calling [`shutdown`](LoggerService::shutdown), stops both
/// workers after the writer has drained the queue, waiting at most the
/// configured shutdown timeout.
pub struct LoggerService {
    queue: Arc<SegQueue<LogRecord>>,
    cancellation: Arc<Cancellation>,
    settings: Settings,
    layout: LogLayout,
    workers: Vec<JoinHandle<()>>,
}

impl LoggerService {
    /// Validate the configuration, create today's log directory and start
    /// the writer and cleanup workers.
    pub fn new(configuration: &LoggerConfiguration) -> Result<Self, LoggerError> {
        let settings = configuration.resolve()?;
        let layout = LogLayout::new(&settings.log_root, settings.app_name.clone());

        let directory = layout.directory_for(&Local::now());
        fs::create_dir_all(&directory)
            .map_err(|err| LoggerError::CreateDirectoryFailed(directory.clone(), err.to_string()))?;

        let queue = Arc::new(SegQueue::new());
        let cancellation = Arc::new(Cancellation::default());
        let writer = Writer::new(Arc::clone(&queue), Arc::clone(&cancellation), &settings);
        let cleaner = Cleaner::new(Arc::clone(&cancellation), &settings);

        let mut service = LoggerService {
            queue,
            cancellation,
            settings,
            layout,
            workers: Vec::with_capacity(2),
        };
        // A failed spawn drops `service`, which stops whatever already runs.
        service.spawn_worker("eventlog-writer", move || writer.run())?;
        service.spawn_worker("eventlog-cleanup", move || cleaner.run())?;

        tracing::debug!(
            app = %service.settings.app_name,
            root = %service.settings.log_root.display(),
            "log service started"
        );
        Ok(service)
    }

    fn spawn_worker<F>(&mut self, name: &str, work: F) -> Result<(), LoggerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(work)
            .map_err(|err| LoggerError::SpawnWorkerFailed(name.to_string(), err.to_string()))?;
        self.workers.push(handle);
        Ok(())
    }

    /// Whether records of `level` are persisted. Fixed at construction.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.settings.levels.is_enabled(level)
    }

    /// Queue a record.
    ///
    /// Returns immediately without building anything when `level` is
    /// disabled. `category` defaults to [`DEFAULT_CATEGORY`]. The caller
    /// segment is only rendered when both of its names are non-empty.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<&dyn Error>,
        category: Option<&str>,
        caller: Option<Caller>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        self.submit(level, message.into(), error.map(render_error), category, caller);
    }

    /// Queue a record whose error detail is already rendered. The level must
    /// have been checked by the caller.
    pub(crate) fn submit(
        &self,
        level: LogLevel,
        message: String,
        error_detail: Option<String>,
        category: Option<&str>,
        caller: Option<Caller>,
    ) {
        let record = LogRecord::new(level, message)
            .with_category(category)
            .with_error_detail(error_detail)
            .with_caller(caller);
        self.queue.push(record);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None, None, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None, None, None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, None, None, None);
    }

    pub fn error(&self, message: impl Into<String>, error: Option<&dyn Error>) {
        self.log(LogLevel::Error, message, error, None, None);
    }

    pub fn critical(&self, message: impl Into<String>, error: Option<&dyn Error>) {
        self.log(LogLevel::Critical, message, error, None, None);
    }

    /// Number of records waiting for the writer.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The resolved root of the log tree.
    pub fn log_root(&self) -> &Path {
        self.layout.root()
    }

    /// The file records written right now would be appended to.
    pub fn active_log_path(&self) -> PathBuf {
        self.layout.active_path_for(&Local::now())
    }

    /// Run a cleanup pass immediately with the configured retention window,
    /// independent of the cleanup schedule. Does nothing when deletion of
    /// old logs is disabled.
    pub fn cleanup_now(&self) -> Result<CleanupReport, LoggerError> {
        if !self.settings.delete_old_logs {
            return Ok(CleanupReport::default());
        }
        let cutoff = cleanup::retention_cutoff(SystemTime::now(), self.settings.retention);
        cleanup_old_logs(self.layout.root(), cutoff)
    }

    /// Stop both workers, letting the writer flush the queue first.
    ///
    /// Waits at most the configured shutdown timeout. A worker that has not
    /// finished by then is left to finish on its own.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancellation.cancel();

        // No deadline when the timeout is too large to represent.
        let deadline = Instant::now().checked_add(self.settings.shutdown_timeout);
        while self.workers.iter().any(|worker| !worker.is_finished())
            && deadline.map_or(true, |deadline| Instant::now() < deadline)
        {
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        for worker in self.workers.drain(..) {
            if worker.is_finished() {
                if worker.join().is_err() {
                    tracing::debug!("log worker panicked");
                }
            } else {
                tracing::debug!(worker = ?worker.thread().name(), "log worker did not stop in time");
            }
        }
    }
}

impl Drop for LoggerService {
    fn drop(&mut self) {
        self.stop();
    }
}

impl LoggerConfiguration {
    /// Build a [`LoggerService`] from this configuration.
    pub fn build(&self) -> Result<LoggerService, LoggerError> {
        LoggerService::new(self)
    }
}
