use {
    eventlog::{LoggerConfiguration, RotationSize},
    std::time::Instant,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let logger = LoggerConfiguration::new("sized")
        .log_directory("./logs")
        .max_file_size(RotationSize::KB(64)) // Rotate at 64KB
        .enable_info(true)
        .build()?;

    // Enough data to roll the active file over several times
    for i in 1..=5_000 {
        eventlog::info!(
            logger,
            category: "Load",
            "Log entry #{i}: This is a sample log message that will contribute to file size"
        );
    }
    let active = logger.active_log_path();
    logger.shutdown();

    println!("Done logging: {:?}", start.elapsed());
    if let Some(directory) = active.parent() {
        for file in std::fs::read_dir(directory)?.flatten() {
            println!("{:?} : {} Bytes", file.file_name(), file.metadata()?.len());
        }
    }
    Ok(())
}
