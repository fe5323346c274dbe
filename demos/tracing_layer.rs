use {
    eventlog::{EventLogLayer, LoggerConfiguration, RotationSize},
    std::sync::Arc,
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = Arc::new(
        LoggerConfiguration::new("tracing")
            .log_directory("./logs")
            .max_file_size(RotationSize::MB(1))
            .enable_info(true)
            .build()?,
    );
    let guard = tracing_subscriber::registry()
        .with(EventLogLayer::new(Arc::clone(&logger)))
        .set_default();

    tracing::info!("This is an info message");
    tracing::warn!(target: "billing", invoice = 1042, "This is a warning message");
    tracing::error!("This is an error message");

    println!("Written to {}", logger.active_log_path().display());

    // Dropping the last owner drains the queue before the process exits.
    drop(guard);
    drop(logger);
    Ok(())
}
