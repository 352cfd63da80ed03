use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use complaintdesk::cli::{run_command, Cli};
use complaintdesk::config::Config;
use complaintdesk::ComplaintDesk;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?.with_api_url(cli.api_url.as_deref());

    // Initialize logging. Output goes to stderr so command output stays clean.
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        api_url = %config.api.base_url,
        token_file = %config.session.token_file.display(),
        "Starting complaintdesk v{}",
        env!("CARGO_PKG_VERSION")
    );

    let desk = ComplaintDesk::connect(&config)?;

    // A stored token is only trusted once the server confirms it.
    if let Some(user) = desk.auth.restore_session().await {
        tracing::debug!(email = %user.email, "Session restored");
    }

    run_command(&cli, &desk).await
}
