use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;

pub fn init() -> Result<()> {
    let directory = config::data_dir();
    std::fs::create_dir_all(directory.clone())?;
    let log_path = directory.join(config::LOG_FILE.clone());
    let log_file = std::fs::File::create(log_path)?;

    // RUST_LOG wins, then the app-specific variable, then a quiet default.
    let env_filter = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(config::LOG_ENV.clone()))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")));

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::EnvFilter::new(env_filter));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}
