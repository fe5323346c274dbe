use {
    crate::{LogLevel, LoggerError},
    serde::{Deserialize, Deserializer},
    std::{
        path::{Path, PathBuf},
        sync::OnceLock,
        time::Duration,
    },
};

/// Environment variables consulted, in order, to decide whether the process
/// runs in a development environment. The first one that is set wins.
pub const ENVIRONMENT_VARIABLES: [&str; 2] = ["EVENTLOG_ENVIRONMENT", "APP_ENVIRONMENT"];

/// Defines size thresholds for rotating log files in various units.
///
/// When the active log file reaches the specified size, the next record
/// rotates it aside and starts a fresh file.
///
/// * `Bytes` - Direct byte count (e.g., 1048576 bytes)
/// * `KB` - Kilobytes (1 KB = 1024 bytes)
/// * `MB` - Megabytes (1 MB = 1024 KB)
/// * `GB` - Gigabytes (1 GB = 1024 MB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSize {
    /// Raw byte count
    Bytes(u64),
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl RotationSize {
    /// Get the threshold in bytes.
    pub fn bytes(&self) -> u64 {
        match self {
            RotationSize::Bytes(b) => *b,
            RotationSize::KB(kb) => kb.saturating_mul(1024),
            RotationSize::MB(mb) => mb.saturating_mul(1024 * 1024),
            RotationSize::GB(gb) => gb.saturating_mul(1024 * 1024 * 1024),
        }
    }
}

fn deserialize_megabytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RotationSize, D::Error> {
    u64::deserialize(deserializer).map(RotationSize::MB)
}

/// User supplied settings for a [`LoggerService`](crate::LoggerService).
///
/// The configuration is read once, when the service is constructed. Fields
/// can be set directly, through the consuming builder methods, or by
/// deserializing from any serde format:
///
/// ```
/// use eventlog::{LoggerConfiguration, RotationSize};
///
/// let config = LoggerConfiguration::new("billing")
///     .log_directory("/var/log/billing")
///     .max_file_size(RotationSize::MB(10))
///     .retention_days(14)
///     .delete_old_logs(true)
///     .enable_debug(false);
/// assert_eq!(config.retention_days, 14);
/// ```
///
/// The per-level flags are optional. An unset flag resolves to `true` for
/// `Warning`, `Error` and `Critical`, and for `Debug` and `Info` to whether
/// the process runs in a development environment (see
/// [`is_development_environment`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfiguration {
    /// Prefix of every log file name.
    pub app_name: String,
    /// Root of the dated directory tree. Relative paths are resolved against
    /// the directory of the running executable.
    pub log_directory: PathBuf,
    /// Size at which the active file is rotated. Deserialized from an integer
    /// number of megabytes under the key `max_file_size_mb`.
    #[serde(rename = "max_file_size_mb", deserialize_with = "deserialize_megabytes")]
    pub max_file_size: RotationSize,
    /// Whether the cleanup worker deletes expired files at all.
    pub delete_old_logs: bool,
    /// Files older than this many days are deleted by a cleanup pass.
    pub retention_days: u64,
    /// Minimum number of hours between two cleanup passes.
    pub cleanup_interval_hours: u64,
    pub enable_debug: Option<bool>,
    pub enable_info: Option<bool>,
    pub enable_warning: Option<bool>,
    pub enable_error: Option<bool>,
    pub enable_critical: Option<bool>,
    /// How long the writer idles when the queue is empty.
    #[serde(skip)]
    pub idle_poll_interval: Duration,
    /// How often the cleanup worker wakes up to check whether a pass is due.
    #[serde(skip)]
    pub cleanup_check_interval: Duration,
    /// Upper bound on how long shutdown waits for the workers.
    #[serde(skip)]
    pub shutdown_timeout: Duration,
}

impl Default for LoggerConfiguration {
    fn default() -> Self {
        LoggerConfiguration {
            app_name: "Application".to_string(),
            log_directory: PathBuf::from("Logs"),
            max_file_size: RotationSize::MB(5),
            delete_old_logs: false,
            retention_days: 7,
            cleanup_interval_hours: 24,
            enable_debug: None,
            enable_info: None,
            enable_warning: None,
            enable_error: None,
            enable_critical: None,
            idle_poll_interval: Duration::from_millis(100),
            cleanup_check_interval: Duration::from_secs(60 * 60),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl LoggerConfiguration {
    /// Create a configuration with default settings for the given application.
    pub fn new(app_name: impl Into<String>) -> Self {
        LoggerConfiguration {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Set the root directory of the log tree.
    pub fn log_directory(self, log_directory: impl Into<PathBuf>) -> Self {
        Self {
            log_directory: log_directory.into(),
            ..self
        }
    }

    /// Set the size at which the active file is rotated.
    pub fn max_file_size(self, max_file_size: RotationSize) -> Self {
        Self { max_file_size, ..self }
    }

    /// Enable or disable deletion of expired log files.
    pub fn delete_old_logs(self, delete_old_logs: bool) -> Self {
        Self { delete_old_logs, ..self }
    }

    /// Set the retention window in days.
    pub fn retention_days(self, retention_days: u64) -> Self {
        Self { retention_days, ..self }
    }

    /// Set the minimum number of hours between two cleanup passes.
    pub fn cleanup_interval_hours(self, cleanup_interval_hours: u64) -> Self {
        Self {
            cleanup_interval_hours,
            ..self
        }
    }

    pub fn enable_debug(self, enabled: bool) -> Self {
        Self {
            enable_debug: Some(enabled),
            ..self
        }
    }

    pub fn enable_info(self, enabled: bool) -> Self {
        Self {
            enable_info: Some(enabled),
            ..self
        }
    }

    pub fn enable_warning(self, enabled: bool) -> Self {
        Self {
            enable_warning: Some(enabled),
            ..self
        }
    }

    pub fn enable_error(self, enabled: bool) -> Self {
        Self {
            enable_error: Some(enabled),
            ..self
        }
    }

    pub fn enable_critical(self, enabled: bool) -> Self {
        Self {
            enable_critical: Some(enabled),
            ..self
        }
    }

    /// Set how long the writer idles when there is nothing to write.
    pub fn idle_poll_interval(self, idle_poll_interval: Duration) -> Self {
        Self {
            idle_poll_interval,
            ..self
        }
    }

    /// Set how often the cleanup worker checks whether a pass is due.
    pub fn cleanup_check_interval(self, cleanup_check_interval: Duration) -> Self {
        Self {
            cleanup_check_interval,
            ..self
        }
    }

    /// Set the upper bound on how long shutdown waits for the workers.
    pub fn shutdown_timeout(self, shutdown_timeout: Duration) -> Self {
        Self {
            shutdown_timeout,
            ..self
        }
    }

    /// Validate the configuration and resolve it against the process
    /// environment.
    pub(crate) fn resolve(&self) -> Result<Settings, LoggerError> {
        self.resolve_with(is_development_environment())
    }

    fn resolve_with(&self, development: bool) -> Result<Settings, LoggerError> {
        if self.app_name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration("app_name must not be empty".to_string()));
        }
        if self.app_name.contains(['/', '\\']) {
            return Err(LoggerError::InvalidConfiguration(format!(
                "app_name '{}' must not contain path separators",
                self.app_name
            )));
        }
        if self.max_file_size.bytes() == 0 {
            return Err(LoggerError::InvalidConfiguration(
                "max_file_size must be greater than zero".to_string(),
            ));
        }
        if self.retention_days == 0 {
            return Err(LoggerError::InvalidConfiguration(
                "retention_days must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval_hours == 0 {
            return Err(LoggerError::InvalidConfiguration(
                "cleanup_interval_hours must be greater than zero".to_string(),
            ));
        }

        Ok(Settings {
            app_name: self.app_name.clone(),
            log_root: resolve_log_directory(&self.log_directory),
            max_file_size_bytes: self.max_file_size.bytes(),
            delete_old_logs: self.delete_old_logs,
            retention: Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60)),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_hours.saturating_mul(60 * 60)),
            levels: LevelSwitches {
                debug: self.enable_debug.unwrap_or(development),
                info: self.enable_info.unwrap_or(development),
                warning: self.enable_warning.unwrap_or(true),
                error: self.enable_error.unwrap_or(true),
                critical: self.enable_critical.unwrap_or(true),
            },
            idle_poll_interval: self.idle_poll_interval,
            cleanup_check_interval: self.cleanup_check_interval,
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}

/// Effective per-level enablement, fixed for the lifetime of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LevelSwitches {
    debug: bool,
    info: bool,
    warning: bool,
    error: bool,
    critical: bool,
}

impl LevelSwitches {
    pub(crate) fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Info => self.info,
            LogLevel::Warning => self.warning,
            LogLevel::Error => self.error,
            LogLevel::Critical => self.critical,
        }
    }
}

/// A validated configuration with every default resolved.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) app_name: String,
    pub(crate) log_root: PathBuf,
    pub(crate) max_file_size_bytes: u64,
    pub(crate) delete_old_logs: bool,
    pub(crate) retention: Duration,
    pub(crate) cleanup_interval: Duration,
    pub(crate) levels: LevelSwitches,
    pub(crate) idle_poll_interval: Duration,
    pub(crate) cleanup_check_interval: Duration,
    pub(crate) shutdown_timeout: Duration,
}

/// Whether the process runs in a development environment.
///
/// Computed on first use from [`ENVIRONMENT_VARIABLES`] and cached for the
/// rest of the process; changing the variables afterwards has no effect.
pub fn is_development_environment() -> bool {
    static DEVELOPMENT: OnceLock<bool> = OnceLock::new();
    *DEVELOPMENT.get_or_init(|| {
        ENVIRONMENT_VARIABLES
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .is_some_and(|environment| is_development_name(&environment))
    })
}

fn is_development_name(environment: &str) -> bool {
    environment.trim().eq_ignore_ascii_case("development")
}

/// Resolve a relative log directory against the directory holding the
/// running executable, or the working directory when that is unknown.
fn resolve_log_directory(log_directory: &Path) -> PathBuf {
    if log_directory.is_absolute() {
        return log_directory.to_path_buf();
    }
    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(log_directory)
}
