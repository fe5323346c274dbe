//! Paths of the dated log tree.
//!
//! ```text
//! <root>/<YYYY>/<MonthName>/<app>_<YYYYMMDD>.log     active file
//! <root>/<YYYY>/<MonthName>/<app>_<YYYYMMDD>.log<N>  rotated files
//! ```
use {
    crate::LoggerError,
    chrono::{DateTime, TimeZone},
    regex::Regex,
    std::path::{Path, PathBuf},
};

/// Extension of the active log file. Rotated files append a number to it.
pub const LOG_EXTENSION: &str = "log";

/// Computes where records for a given instant are written.
#[derive(Debug, Clone)]
pub struct LogLayout {
    root: PathBuf,
    app_name: String,
}

impl LogLayout {
    pub fn new<P: AsRef<Path>>(root: P, app_name: impl Into<String>) -> Self {
        LogLayout {
            root: root.as_ref().to_path_buf(),
            app_name: app_name.into(),
        }
    }

    /// The root of the tree. Cleanup never removes it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The year/month directory for `now`, e.g. `<root>/2025/April`.
    pub fn directory_for<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        self.root
            .join(now.format("%Y").to_string())
            .join(now.format("%B").to_string())
    }

    /// The file name without extension for `now`, e.g. `App_20250401`.
    pub fn base_name_for<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("{}_{}", self.app_name, now.format("%Y%m%d"))
    }

    /// The active file for `now`.
    pub fn active_path_for<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        self.directory_for(now)
            .join(format!("{}.{LOG_EXTENSION}", self.base_name_for(now)))
    }
}

/// Matches any active or rotated log file name, regardless of application or
/// day: `*.log`, `*.log1`, `*.log27`, ...
pub(crate) fn log_file_pattern() -> Result<Regex, LoggerError> {
    Regex::new(&format!(r"^.+\.{LOG_EXTENSION}\d*$")).map_err(|err| LoggerError::InternalError(err.to_string()))
}

/// Matches the rotated files of one exact base name and captures the
/// rotation number: `App_20250401.log1`, `App_20250401.log2`, ...
pub(crate) fn rotated_file_pattern(base_name: &str) -> Result<Regex, LoggerError> {
    Regex::new(&format!(r"^{}\.{LOG_EXTENSION}(\d+)$", regex::escape(base_name)))
        .map_err(|err| LoggerError::InternalError(err.to_string()))
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::Utc};

    #[test]
    fn test_paths_for_day() {
        let layout = LogLayout::new("/var/log/app", "App");
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 19, 55, 2).unwrap();

        assert_eq!(layout.directory_for(&now), PathBuf::from("/var/log/app/2025/April"));
        assert_eq!(layout.base_name_for(&now), "App_20250401");
        assert_eq!(
            layout.active_path_for(&now),
            PathBuf::from("/var/log/app/2025/April/App_20250401.log")
        );
    }

    #[test]
    fn test_log_file_pattern() {
        let pattern = log_file_pattern().unwrap();
        assert!(pattern.is_match("App_20250401.log"));
        assert!(pattern.is_match("App_20250401.log12"));
        assert!(pattern.is_match("Other_20240101.log1"));
        assert!(!pattern.is_match("App_20250401.log.gz"));
        assert!(!pattern.is_match("notes.txt"));
        assert!(!pattern.is_match(".log"));
    }

    #[test]
    fn test_rotated_file_pattern_is_scoped_to_base_name() {
        let pattern = rotated_file_pattern("App_20250401").unwrap();
        let index = |name: &str| pattern.captures(name).map(|c| c[1].to_string());
        assert_eq!(index("App_20250401.log3"), Some("3".to_string()));
        assert_eq!(index("App_20250401.log"), None);
        assert_eq!(index("App_20250331.log9"), None);
        assert_eq!(index("XApp_20250401.log4"), None);
        assert_eq!(index("App_20250401.log2.bak"), None);
    }
}
