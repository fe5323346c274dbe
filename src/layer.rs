use {
    crate::{record::render_error, LogLevel, LoggerService},
    std::{error::Error, fmt, sync::Arc},
    tracing::{
        field::{Field, Visit},
        Event, Subscriber,
    },
    tracing_subscriber::layer::{Context, Layer},
};

/// A `tracing` layer that persists events through a [`LoggerService`].
///
/// The event target becomes the category, the `message` field the message,
/// and an `error` field the exception segment. Other fields are appended to
/// the message as `name=value`. `TRACE` events map to `Debug`; whether a
/// level is persisted is still decided by the service configuration.
///
/// ```no_run
/// use {
///     eventlog::{EventLogLayer, LoggerConfiguration},
///     std::sync::Arc,
///     tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt},
/// };
///
/// let logger = Arc::new(LoggerConfiguration::new("app").build().unwrap());
/// tracing_subscriber::registry()
///     .with(EventLogLayer::new(Arc::clone(&logger)))
///     .init();
///
/// tracing::warn!(target: "billing", invoice = 1042, "invoice overdue");
/// ```
pub struct EventLogLayer {
    logger: Arc<LoggerService>,
}

impl EventLogLayer {
    pub fn new(logger: Arc<LoggerService>) -> Self {
        EventLogLayer { logger }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl<S: Subscriber> Layer<S> for EventLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // The engine reports its own failures through tracing.
        if is_own_target(metadata.target()) {
            return;
        }
        let level = LogLevel::from(*metadata.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let error = visitor.error.take();
        self.logger
            .submit(level, visitor.message(), error, Some(metadata.target()), None);
    }
}

fn is_own_target(target: &str) -> bool {
    let crate_name = env!("CARGO_CRATE_NAME");
    target == crate_name
        || target
            .strip_prefix(crate_name)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<String>,
    error: Option<String>,
}

impl EventVisitor {
    fn message(self) -> String {
        let mut message = self.message;
        for field in self.fields {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&field);
        }
        message
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "error" => self.error = Some(value.to_string()),
            name => self.fields.push(format!("{name}={value}")),
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        match field.name() {
            "error" => self.error = Some(render_error(value)),
            name => self.fields.push(format!("{name}={}", render_error(value))),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "error" => self.error = Some(format!("{value:?}")),
            name => self.fields.push(format!("{name}={value:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_target() {
        assert!(is_own_target("eventlog"));
        assert!(is_own_target("eventlog::writer"));
        assert!(!is_own_target("eventlog_app"));
        assert!(!is_own_target("billing"));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::from(tracing::Level::TRACE), LogLevel::Debug);
        assert_eq!(LogLevel::from(tracing::Level::DEBUG), LogLevel::Debug);
        assert_eq!(LogLevel::from(tracing::Level::INFO), LogLevel::Info);
        assert_eq!(LogLevel::from(tracing::Level::WARN), LogLevel::Warning);
        assert_eq!(LogLevel::from(tracing::Level::ERROR), LogLevel::Error);
    }

    #[test]
    fn test_visitor_message_appends_fields() {
        let visitor = EventVisitor {
            message: "order placed".to_string(),
            fields: vec!["order=42".to_string(), "region=eu".to_string()],
            error: None,
        };
        assert_eq!(visitor.message(), "order placed order=42 region=eu");
    }
}
