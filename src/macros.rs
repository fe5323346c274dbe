/// Capture the [`Caller`](crate::Caller) of the enclosing function.
///
/// The class name is the enclosing type for methods and the enclosing module
/// for free functions.
///
/// ```
/// mod billing {
///     pub fn send() -> eventlog::Caller {
///         eventlog::caller!()
///     }
/// }
///
/// let caller = billing::send();
/// assert_eq!(caller.class_name, "billing");
/// assert_eq!(caller.method_name, "send");
/// ```
#[macro_export]
macro_rules! caller {
    () => {{
        fn __eventlog_here() {}
        fn __eventlog_type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let path = __eventlog_type_name_of(__eventlog_here);
        $crate::Caller::from_function_path(path.strip_suffix("::__eventlog_here").unwrap_or(path))
    }};
}

/// Queue a record at the given level, tagged with the calling function.
///
/// The message takes `format!` arguments and is only formatted when the level
/// is enabled. A `category:` and an `error:` (a reference to anything
/// implementing [`std::error::Error`]) may precede it, in that order.
///
/// ```no_run
/// # let logger = eventlog::LoggerConfiguration::new("app").build().unwrap();
/// # let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// use eventlog::LogLevel;
///
/// eventlog::log!(logger, LogLevel::Info, "processed {} orders", 12);
/// eventlog::log!(logger, LogLevel::Warning, category: "Billing", "retrying");
/// eventlog::log!(logger, LogLevel::Error, category: "Billing", error: &err, "upload failed");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, category: $category:expr, error: $error:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(
                level,
                ::std::format!($($arg)+),
                ::core::option::Option::Some($error as &dyn ::std::error::Error),
                ::core::option::Option::Some($category),
                ::core::option::Option::Some($crate::caller!()),
            );
        }
    }};
    ($logger:expr, $level:expr, error: $error:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(
                level,
                ::std::format!($($arg)+),
                ::core::option::Option::Some($error as &dyn ::std::error::Error),
                ::core::option::Option::None,
                ::core::option::Option::Some($crate::caller!()),
            );
        }
    }};
    ($logger:expr, $level:expr, category: $category:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(
                level,
                ::std::format!($($arg)+),
                ::core::option::Option::None,
                ::core::option::Option::Some($category),
                ::core::option::Option::Some($crate::caller!()),
            );
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(
                level,
                ::std::format!($($arg)+),
                ::core::option::Option::None,
                ::core::option::Option::None,
                ::core::option::Option::Some($crate::caller!()),
            );
        }
    }};
}

/// Queue a `Debug` record. See [`log!`](crate::log).
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Queue an `Info` record. See [`log!`](crate::log).
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Queue a `Warning` record. See [`log!`](crate::log).
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Queue an `Error` record. See [`log!`](crate::log).
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Queue a `Critical` record. See [`log!`](crate::log).
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
