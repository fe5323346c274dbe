use {
    chrono::{DateTime, Local},
    std::{error::Error, fmt},
};

/// The category assigned to records that do not name one.
pub const DEFAULT_CATEGORY: &str = "Application";

/// Severity of a log record.
///
/// Levels are only used to look up whether a record is enabled; there is no
/// threshold filtering, so enabling `Debug` does not imply anything about
/// `Info` and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// All levels, in ascending order.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// The name written into the level segment of a log line.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "Debug",
            LogLevel::Info => "Info",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort identity of the code that emitted a record.
///
/// Usually produced by the [`caller!`](crate::caller) macro, which derives
/// both names from the path of the enclosing function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// The type (for methods) or module (for free functions) of the caller.
    pub class_name: String,
    /// The function that emitted the record.
    pub method_name: String,
}

impl Caller {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Caller {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Split a fully qualified function path into class and method names.
    ///
    /// `app::service::Worker::run` yields `Worker` / `run`, a free function
    /// `app::service::run` yields `service` / `run`. Closure segments are
    /// skipped so a record emitted inside a closure is attributed to the
    /// function that owns it. Generic arguments are dropped (`Cache<_>::get`
    /// yields `Cache` / `get`) and trait implementations are attributed to
    /// the implementing type (`<app::Widget as core::fmt::Display>::fmt`
    /// yields `Widget` / `fmt`).
    pub fn from_function_path(path: &str) -> Self {
        let mut segments = split_path(path)
            .into_iter()
            .filter(|segment| !segment.is_empty() && *segment != "{{closure}}")
            .map(simple_name)
            .filter(|name| !name.is_empty())
            .rev();
        let method_name = segments.next().unwrap_or_default();
        let class_name = segments.next().unwrap_or_default();
        Caller::new(class_name, method_name)
    }

    fn is_complete(&self) -> bool {
        !self.class_name.is_empty() && !self.method_name.is_empty()
    }
}

/// Split a path on `::` separators that sit outside any `<...>` list.
fn split_path(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let (mut depth, mut start, mut index) = (0usize, 0usize, 0usize);
    while index < bytes.len() {
        match bytes[index] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(index + 1) == Some(&b':') => {
                segments.push(&path[start..index]);
                index += 2;
                start = index;
                continue;
            }
            _ => {}
        }
        index += 1;
    }
    segments.push(&path[start..]);
    segments
}

/// Byte offset of `pattern` at nesting depth zero.
fn find_top_level(text: &str, pattern: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, byte) in text.bytes().enumerate() {
        match byte {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && text.as_bytes()[index..].starts_with(pattern.as_bytes()) => {
                return Some(index)
            }
            _ => {}
        }
    }
    None
}

/// The bare name of one path segment: `<T as Trait>` resolves to `T`,
/// and generic argument lists are removed.
fn simple_name(segment: &str) -> &str {
    if let Some(inner) = segment.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        let self_type = find_top_level(inner, " as ").map_or(inner, |at| &inner[..at]);
        return split_path(self_type).last().copied().map_or("", simple_name);
    }
    segment.split('<').next().unwrap_or(segment).trim()
}

/// A single log record, immutable once handed to the queue.
#[derive(Debug, Clone)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    level: LogLevel,
    category: String,
    message: String,
    error_detail: Option<String>,
    caller: Option<Caller>,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    pub(crate) fn new(level: LogLevel, message: String) -> Self {
        Self::at(Local::now(), level, message)
    }

    pub(crate) fn at(timestamp: DateTime<Local>, level: LogLevel, message: String) -> Self {
        LogRecord {
            timestamp,
            level,
            category: DEFAULT_CATEGORY.to_string(),
            message,
            error_detail: None,
            caller: None,
        }
    }

    pub(crate) fn with_category(self, category: Option<&str>) -> Self {
        match category {
            Some(category) => LogRecord {
                category: category.to_string(),
                ..self
            },
            None => self,
        }
    }

    pub(crate) fn with_error_detail(self, error_detail: Option<String>) -> Self {
        LogRecord { error_detail, ..self }
    }

    pub(crate) fn with_caller(self, caller: Option<Caller>) -> Self {
        LogRecord { caller, ..self }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.class_name.as_str())
    }

    pub fn method_name(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.method_name.as_str())
    }
}

/// Renders the record as a single log line, without the line terminator.
///
/// `[2025-04-01 19:55:02.127] [Error] [Billing] [Invoice.send] Upload failed | Exception: timed out`
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] [{}]",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.category
        )?;
        if let Some(caller) = self.caller.as_ref().filter(|c| c.is_complete()) {
            write!(f, " [{}.{}]", caller.class_name, caller.method_name)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(detail) = self.error_detail.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " | Exception: {detail}")?;
        }
        Ok(())
    }
}

/// Render an error and its chain of sources as `outer: inner: root`.
pub fn render_error(error: &dyn Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone as _, std::io};

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 4, 1, 19, 55, 2).unwrap() + chrono::Duration::milliseconds(127)
    }

    #[test]
    fn test_render_minimal_record() {
        let record = LogRecord::at(fixed_time(), LogLevel::Info, "startup".to_string());
        assert_eq!(record.to_string(), "[2025-04-01 19:55:02.127] [Info] [Application] startup");
    }

    #[test]
    fn test_render_all_segments() {
        let record = LogRecord::at(fixed_time(), LogLevel::Error, "Upload failed".to_string())
            .with_category(Some("Billing"))
            .with_caller(Some(Caller::new("Invoice", "send")))
            .with_error_detail(Some("timed out".to_string()));
        assert_eq!(
            record.to_string(),
            "[2025-04-01 19:55:02.127] [Error] [Billing] [Invoice.send] Upload failed | Exception: timed out"
        );
    }

    #[test]
    fn test_render_omits_incomplete_caller() {
        let record = LogRecord::at(fixed_time(), LogLevel::Warning, "slow".to_string())
            .with_caller(Some(Caller::new("", "send")));
        assert_eq!(record.to_string(), "[2025-04-01 19:55:02.127] [Warning] [Application] slow");
    }

    #[test]
    fn test_render_omits_empty_error_detail() {
        let record = LogRecord::at(fixed_time(), LogLevel::Critical, "down".to_string())
            .with_error_detail(Some(String::new()));
        assert_eq!(record.to_string(), "[2025-04-01 19:55:02.127] [Critical] [Application] down");
    }

    #[test]
    fn test_caller_from_function_path() {
        assert_eq!(
            Caller::from_function_path("app::billing::Invoice::send"),
            Caller::new("Invoice", "send")
        );
        assert_eq!(
            Caller::from_function_path("app::billing::send::{{closure}}::{{closure}}"),
            Caller::new("billing", "send")
        );
        assert_eq!(Caller::from_function_path("main"), Caller::new("", "main"));
    }

    #[test]
    fn test_caller_from_trait_impl_path() {
        assert_eq!(
            Caller::from_function_path("<app::ui::Widget as core::fmt::Display>::fmt"),
            Caller::new("Widget", "fmt")
        );
        assert_eq!(
            Caller::from_function_path("<app::Gen<u8> as app::Run>::run::{{closure}}"),
            Caller::new("Gen", "run")
        );
        assert_eq!(
            Caller::from_function_path("<alloc::vec::Vec<app::Item<'_>> as app::Total>::total"),
            Caller::new("Vec", "total")
        );
    }

    #[test]
    fn test_caller_from_generic_impl_path() {
        assert_eq!(Caller::from_function_path("app::Gen<_>::go"), Caller::new("Gen", "go"));
        assert_eq!(
            Caller::from_function_path("app::cache::Cache<_, _>::get::{{closure}}"),
            Caller::new("Cache", "get")
        );
    }

    struct Widget;

    impl fmt::Display for Widget {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let caller = crate::caller!();
            write!(f, "{}.{}", caller.class_name, caller.method_name)
        }
    }

    struct Gen<T>(T);

    impl<T> Gen<T> {
        fn go(&self) -> Caller {
            crate::caller!()
        }
    }

    #[test]
    fn test_caller_macro_inside_impls() {
        assert_eq!(Widget.to_string(), "Widget.fmt");
        assert_eq!(Gen(1u8).go(), Caller::new("Gen", "go"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("failed to upload invoice")]
    struct UploadError(#[source] io::Error);

    #[test]
    fn test_render_error_chain() {
        let error = UploadError(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert_eq!(render_error(&error), "failed to upload invoice: timed out");
    }
}
