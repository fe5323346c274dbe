use {
    crate::{
        config::Settings,
        layout::{self, LogLayout},
        record::LogRecord,
        signal::Cancellation,
        LoggerError,
    },
    chrono::Local,
    crossbeam_queue::SegQueue,
    std::{
        fs,
        io::Write as _,
        path::{Path, PathBuf},
        sync::Arc,
        time::Duration,
    },
};

/// The single consumer of the record queue and the only code that writes
/// log files.
pub(crate) struct Writer {
    queue: Arc<SegQueue<LogRecord>>,
    cancellation: Arc<Cancellation>,
    layout: LogLayout,
    max_file_size_bytes: u64,
    idle_poll_interval: Duration,
}

impl Writer {
    pub(crate) fn new(queue: Arc<SegQueue<LogRecord>>, cancellation: Arc<Cancellation>, settings: &Settings) -> Self {
        Writer {
            queue,
            cancellation,
            layout: LogLayout::new(&settings.log_root, settings.app_name.clone()),
            max_file_size_bytes: settings.max_file_size_bytes,
            idle_poll_interval: settings.idle_poll_interval,
        }
    }

    /// Drain the queue until cancelled, then write whatever is still queued.
    pub(crate) fn run(self) {
        while !self.cancellation.is_cancelled() {
            match self.queue.pop() {
                Some(record) => self.persist(&record),
                None => {
                    if self.cancellation.wait_timeout(self.idle_poll_interval) {
                        break;
                    }
                }
            }
        }

        let mut drained = 0usize;
        while let Some(record) = self.queue.pop() {
            self.persist(&record);
            drained += 1;
        }
        tracing::trace!(drained, "log writer stopped");
    }

    /// Write one record. Failures only cost this record.
    fn persist(&self, record: &LogRecord) {
        if let Err(err) = self.write_record(record) {
            tracing::debug!(error = %err, "dropping log record");
        }
    }

    fn write_record(&self, record: &LogRecord) -> Result<(), LoggerError> {
        let now = Local::now();
        let directory = self.layout.directory_for(&now);
        fs::create_dir_all(&directory)
            .map_err(|err| LoggerError::CreateDirectoryFailed(directory.clone(), err.to_string()))?;

        let log_path = self.layout.active_path_for(&now);
        if let Ok(metadata) = fs::metadata(&log_path) {
            if metadata.len() >= self.max_file_size_bytes {
                if let Err(err) = rotate(&log_path) {
                    tracing::debug!(error = %err, "log rotation failed, appending to the full file");
                }
            }
        }

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&log_path)
            .map_err(|err| LoggerError::CreateFileFailed(log_path.clone(), err.to_string()))?;
        writeln!(file, "{record}")?;
        Ok(())
    }
}

/// Rename the active file at `log_path` aside under the next unused rotation
/// number, leaving nothing at `log_path`.
/// # Arguments
/// * `log_path` - The path to the active log file.
/// # Returns
/// The path the file was moved to.
pub(crate) fn rotate(log_path: &Path) -> Result<PathBuf, LoggerError> {
    let directory = log_path
        .parent()
        .ok_or_else(|| LoggerError::GetNextFilePathError(log_path.to_path_buf()))?;
    let base_name = log_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| LoggerError::GetNextFilePathError(log_path.to_path_buf()))?;

    let next_index = next_rotation_index(directory, base_name)?;
    let rotated_path = directory.join(format!("{base_name}.{}{next_index}", layout::LOG_EXTENSION));
    fs::rename(log_path, &rotated_path).map_err(|err| LoggerError::RenameFileError {
        from: log_path.to_path_buf(),
        to: rotated_path.clone(),
        error: err.to_string(),
    })?;
    Ok(rotated_path)
}

/// Get the next rotation number for `base_name`.
/// This function will scan the directory for existing rotated files of the
/// same base name and return one more than the highest number found, or 1 if
/// there is none. Files of other days or applications are never considered,
/// even when they sit in the same directory.
fn next_rotation_index(directory: &Path, base_name: &str) -> Result<u64, LoggerError> {
    let pattern = layout::rotated_file_pattern(base_name)?;
    let mut max_index = 0;
    if let Ok(files) = fs::read_dir(directory) {
        for file in files.flatten() {
            if let Some(index) = file
                .file_name()
                .to_str()
                .and_then(|name| pattern.captures(name))
                .and_then(|captures| captures[1].parse::<u64>().ok())
            {
                max_index = max_index.max(index);
            }
        }
    }
    Ok(max_index + 1)
}

#[cfg(test)]
mod tests {
    use {super::*, tempfile::TempDir};

    fn write(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_rotate_first_file() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("App_20250401.log");
        write(&active, "first\n");

        let rotated = rotate(&active).unwrap();

        assert_eq!(rotated, temp_dir.path().join("App_20250401.log1"));
        assert!(!active.exists());
        assert_eq!(fs::read_to_string(rotated).unwrap(), "first\n");
    }

    #[test]
    fn test_rotate_uses_highest_existing_number() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("App_20250401.log");
        write(&active, "current\n");
        write(&temp_dir.path().join("App_20250401.log1"), "one\n");
        write(&temp_dir.path().join("App_20250401.log3"), "three\n");

        let rotated = rotate(&active).unwrap();

        assert_eq!(rotated, temp_dir.path().join("App_20250401.log4"));
        assert_eq!(fs::read_to_string(temp_dir.path().join("App_20250401.log3")).unwrap(), "three\n");
    }

    #[test]
    fn test_rotate_ignores_other_days_and_apps() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("App_20250401.log");
        write(&active, "current\n");
        write(&temp_dir.path().join("App_20250331.log9"), "yesterday\n");
        write(&temp_dir.path().join("Other_20250401.log5"), "other app\n");
        write(&temp_dir.path().join("App_20250401.logx"), "not a number\n");

        assert_eq!(rotate(&active).unwrap(), temp_dir.path().join("App_20250401.log1"));
    }

    #[test]
    fn test_repeated_rotation_never_reuses_a_number() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("App_20250401.log");
        for round in 1..=3 {
            write(&active, &format!("round {round}\n"));
            let rotated = rotate(&active).unwrap();
            assert_eq!(rotated, temp_dir.path().join(format!("App_20250401.log{round}")));
        }
        for round in 1..=3 {
            let contents = fs::read_to_string(temp_dir.path().join(format!("App_20250401.log{round}"))).unwrap();
            assert_eq!(contents, format!("round {round}\n"));
        }
    }

    #[test]
    fn test_rotate_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("App_20250401.log");
        assert!(matches!(rotate(&active), Err(LoggerError::RenameFileError { .. })));
    }

    #[test]
    fn test_failed_write_does_not_block_later_records() {
        let temp_dir = TempDir::new().unwrap();
        let settings = crate::LoggerConfiguration::new("App")
            .log_directory(temp_dir.path())
            .resolve()
            .unwrap();
        let writer = Writer::new(Arc::new(SegQueue::new()), Arc::new(Cancellation::default()), &settings);
        let active = writer.layout.active_path_for(&Local::now());
        fs::create_dir_all(&active).unwrap();

        let dropped = LogRecord::new(crate::LogLevel::Info, "dropped".to_string());
        assert!(writer.write_record(&dropped).is_err());
        writer.persist(&dropped);

        fs::remove_dir(&active).unwrap();
        writer.persist(&LogRecord::new(crate::LogLevel::Info, "kept".to_string()));

        let contents = fs::read_to_string(&active).unwrap();
        assert_eq!(contents.lines().count(), 1, "{contents}");
        assert!(contents.ends_with("] [Info] [Application] kept\n"), "{contents}");
    }
}
