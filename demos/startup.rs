use eventlog::{LoggerConfiguration, RotationSize};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = LoggerConfiguration::new("startup")
        .log_directory("./logs")
        .max_file_size(RotationSize::KB(256))
        .enable_info(true)
        .build()?;

    logger.info("This is an info message");
    logger.warning("This is a warning message");
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    logger.error("This is an error message", Some(&err));

    println!("Writing to {}", logger.active_log_path().display());
    logger.shutdown();
    Ok(())
}
