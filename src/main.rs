use clap::Parser;
use replisync::config::Cli;
use replisync::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;

    // Held until exit so buffered log lines reach the file
    let _guard = replisync::logging::init(&config.log_file, config.verbose)?;

    tracing::info!(
        "replisync v{}: {:?} -> {:?}, interval {}s, log {:?}",
        replisync::VERSION,
        config.source,
        config.replica,
        config.interval.as_secs(),
        config.log_file
    );
    if !config.exclude_patterns.is_empty() {
        tracing::info!("Exclude patterns: {:?}", config.exclude_patterns);
    }

    if let Err(e) = replisync::commands::sync::run(config).await {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    Ok(())
}
