use env_logger::{Builder, WriteStyle};
use log::error;
use sensortwin::config::AppConfig;

fn main() -> anyhow::Result<()> {
    // Load configuration first (without logging)
    let config = AppConfig::new().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        // Fall back to default configuration
        AppConfig::default()
    });

    // Initialise logger with a configured log level
    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    if let Err(e) = sensortwin::run(&config) {
        error!("Application error: {}", e);
        return Err(e);
    }
    Ok(())
}
