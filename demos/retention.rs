use {
    eventlog::{cleanup_old_logs, LoggerConfiguration},
    std::time::{Duration, SystemTime},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = LoggerConfiguration::new("retention")
        .log_directory("./logs")
        .delete_old_logs(true)
        .retention_days(7) // Keep one week of logs
        .cleanup_interval_hours(24)
        .build()?;

    logger.warning("System startup, files older than a week are removed daily");
    let report = logger.cleanup_now()?;
    println!(
        "Scheduled retention removed {} files and {} directories",
        report.files_removed, report.directories_removed
    );

    // A one-off pass with a custom window, independent of any running service
    let cutoff = SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60);
    let report = cleanup_old_logs(logger.log_root(), cutoff)?;
    println!("Removed {} files older than 30 days", report.files_removed);

    logger.shutdown();
    Ok(())
}
