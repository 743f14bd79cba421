use clap::Parser;
use growth_mindset::app;
use growth_mindset::config::Config;

/// Main entry point for the web application
///
/// Initializes logging from `RUST_LOG` (default `info`), reads the
/// configuration from flags and environment, and serves the app until
/// Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "Starting Growth Mindset App (session ttl {}s, upload limit {} MB)",
        config.session_ttl_secs,
        config.max_upload_mb
    );

    app::run(config).await
}
