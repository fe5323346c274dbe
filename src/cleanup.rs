//! Retention enforcement for the log tree.
//!
//! A background worker wakes up periodically and, when a pass is due, deletes
//! every log file older than the retention window and then prunes the
//! directories those deletions left empty.

use {
    crate::{config::Settings, layout, signal::Cancellation, LoggerError},
    regex::Regex,
    std::{
        fs,
        path::{Path, PathBuf},
        sync::Arc,
        time::{Duration, Instant, SystemTime},
    },
};

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub directories_removed: usize,
}

/// Delete log files under `root` created before `cutoff`, then remove any
/// directory below `root` that is left without files.
///
/// Only names matching the log file pattern (`*.log`, `*.log<N>`) are
/// considered. Where the platform does not report a creation time, the
/// modification time is used instead. `root` itself is never removed.
///
/// The first failure aborts the pass; whatever was deleted before it stays
/// deleted.
pub fn cleanup_old_logs(root: &Path, cutoff: SystemTime) -> Result<CleanupReport, LoggerError> {
    let mut report = CleanupReport::default();
    if !root.is_dir() {
        return Ok(report);
    }
    let pattern = layout::log_file_pattern()?;
    remove_expired_files(root, &pattern, cutoff, &mut report)?;
    report.directories_removed = remove_empty_directories(root)?;
    Ok(report)
}

/// The instant before which files fall outside a retention window.
pub(crate) fn retention_cutoff(now: SystemTime, retention: Duration) -> SystemTime {
    now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH)
}

fn read_entries(directory: &Path) -> Result<Vec<fs::DirEntry>, LoggerError> {
    fs::read_dir(directory)
        .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
        .map_err(|err| LoggerError::ReadDirectoryFailed(directory.to_path_buf(), err.to_string()))
}

fn remove_expired_files(
    directory: &Path,
    pattern: &Regex,
    cutoff: SystemTime,
    report: &mut CleanupReport,
) -> Result<(), LoggerError> {
    for entry in read_entries(directory)? {
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            remove_expired_files(&path, pattern, cutoff, report)?;
            continue;
        }
        if !file_type.is_file() || !entry.file_name().to_str().is_some_and(|name| pattern.is_match(name)) {
            continue;
        }

        let metadata = entry.metadata()?;
        let created = metadata.created().or_else(|_| metadata.modified())?;
        if created < cutoff {
            fs::remove_file(&path).map_err(|err| LoggerError::RemoveFileError {
                path: path.clone(),
                error: err.to_string(),
            })?;
            report.files_removed += 1;
        }
    }
    Ok(())
}

/// Remove empty directories below `directory`, deepest first. Returns how
/// many were removed.
fn remove_empty_directories(directory: &Path) -> Result<usize, LoggerError> {
    let mut removed = 0;
    for entry in read_entries(directory)? {
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        removed += remove_empty_directories(&path)?;
        if read_entries(&path)?.is_empty() {
            fs::remove_dir(&path).map_err(|err| LoggerError::RemoveFileError {
                path: path.clone(),
                error: err.to_string(),
            })?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// The retention worker.
pub(crate) struct Cleaner {
    cancellation: Arc<Cancellation>,
    log_root: PathBuf,
    delete_old_logs: bool,
    retention: Duration,
    cleanup_interval: Duration,
    check_interval: Duration,
}

impl Cleaner {
    pub(crate) fn new(cancellation: Arc<Cancellation>, settings: &Settings) -> Self {
        Cleaner {
            cancellation,
            log_root: settings.log_root.clone(),
            delete_old_logs: settings.delete_old_logs,
            retention: settings.retention,
            cleanup_interval: settings.cleanup_interval,
            check_interval: settings.cleanup_check_interval,
        }
    }

    /// Wake up every check interval until cancelled and run a pass whenever
    /// the cleanup interval has elapsed since the previous one. The first
    /// pass is due one cleanup interval after start.
    pub(crate) fn run(self) {
        let mut last_cleanup = Instant::now();
        while !self.cancellation.wait_timeout(self.check_interval) {
            if self.delete_old_logs && last_cleanup.elapsed() >= self.cleanup_interval {
                match cleanup_old_logs(&self.log_root, retention_cutoff(SystemTime::now(), self.retention)) {
                    Ok(report) => tracing::debug!(
                        files_removed = report.files_removed,
                        directories_removed = report.directories_removed,
                        "log cleanup pass finished"
                    ),
                    Err(err) => tracing::debug!(error = %err, "log cleanup pass aborted"),
                }
                last_cleanup = Instant::now();
            }
        }
        tracing::trace!("log cleaner stopped");
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::thread, tempfile::TempDir};

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "line\n").unwrap();
    }

    fn future() -> SystemTime {
        SystemTime::now() + Duration::from_secs(24 * 60 * 60)
    }

    #[test]
    fn test_cleanup_nonexistent_root() {
        let report = cleanup_old_logs(Path::new("/nonexistent/path/for/testing"), future()).unwrap();
        assert_eq!(report, CleanupReport::default());
    }

    #[test]
    fn test_cleanup_removes_expired_logs_and_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2025/March/App_20250331.log"));
        touch(&root.join("2025/March/App_20250331.log1"));
        touch(&root.join("2025/April/App_20250401.log"));

        let report = cleanup_old_logs(root, future()).unwrap();

        assert_eq!(report.files_removed, 3);
        assert_eq!(report.directories_removed, 3);
        assert!(root.exists());
        assert!(!root.join("2025").exists());
    }

    #[test]
    fn test_cleanup_keeps_recent_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let log_file = root.join("2025/April/App_20250401.log");
        touch(&log_file);

        let cutoff = retention_cutoff(SystemTime::now(), Duration::from_secs(7 * 24 * 60 * 60));
        let report = cleanup_old_logs(root, cutoff).unwrap();

        assert_eq!(report, CleanupReport::default());
        assert!(log_file.exists());
    }

    #[test]
    fn test_cleanup_ignores_non_log_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let notes = root.join("2025/April/notes.txt");
        let archive = root.join("2025/April/App_20250401.log.gz");
        touch(&notes);
        touch(&archive);

        let report = cleanup_old_logs(root, future()).unwrap();

        assert_eq!(report, CleanupReport::default());
        assert!(notes.exists());
        assert!(archive.exists());
    }

    #[test]
    fn test_cleanup_prunes_preexisting_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2024/December")).unwrap();
        touch(&root.join("2025/April/notes.txt"));

        let report = cleanup_old_logs(root, future()).unwrap();

        assert_eq!(report.directories_removed, 2);
        assert!(!root.join("2024").exists());
        assert!(root.join("2025/April").exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2025/March/App_20250331.log"));
        touch(&root.join("2025/April/keep.txt"));

        let cutoff = future();
        let first = cleanup_old_logs(root, cutoff).unwrap();
        let second = cleanup_old_logs(root, cutoff).unwrap();

        assert_eq!(first.files_removed, 1);
        assert_eq!(first.directories_removed, 1);
        assert_eq!(second, CleanupReport::default());
        assert!(root.join("2025/April/keep.txt").exists());
    }

    #[test]
    fn test_retention_cutoff_is_retention_before_now() {
        let now = SystemTime::now();
        let week = Duration::from_secs(7 * 24 * 60 * 60);
        assert_eq!(retention_cutoff(now, week), now - week);
        assert_eq!(retention_cutoff(now, Duration::ZERO), now);
    }

    fn cleaner(root: &Path, delete_old_logs: bool) -> (Cleaner, Arc<Cancellation>) {
        let cancellation = Arc::new(Cancellation::default());
        let cleaner = Cleaner {
            cancellation: Arc::clone(&cancellation),
            log_root: root.to_path_buf(),
            delete_old_logs,
            retention: Duration::ZERO,
            cleanup_interval: Duration::ZERO,
            check_interval: Duration::from_millis(10),
        };
        (cleaner, cancellation)
    }

    #[test]
    fn test_cleaner_runs_due_pass() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let old = root.join("2025/March/App_20250331.log");
        touch(&old);
        thread::sleep(Duration::from_millis(20));

        let (cleaner, cancellation) = cleaner(root, true);
        let worker = thread::spawn(move || cleaner.run());
        let deadline = Instant::now() + Duration::from_secs(5);
        while root.join("2025").exists() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        cancellation.cancel();
        worker.join().unwrap();

        assert!(!old.exists());
        assert!(!root.join("2025").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_cleaner_does_nothing_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let old = root.join("2025/March/App_20250331.log");
        touch(&old);
        thread::sleep(Duration::from_millis(20));

        let (cleaner, cancellation) = cleaner(root, false);
        let worker = thread::spawn(move || cleaner.run());
        thread::sleep(Duration::from_millis(100));
        cancellation.cancel();
        worker.join().unwrap();

        assert!(old.exists());
    }
}
