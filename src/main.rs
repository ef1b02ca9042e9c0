//! FinTrip - travel planning from the terminal
//!
#![doc = "Main entry point for the FinTrip client."]

use anyhow::Result;
use colored::Colorize;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fintrip::cli::{Cli, Commands};
use fintrip::commands::{self, AppContext};
use fintrip::config::Config;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::debug!("command failed: {:#}", e);
        eprintln!("{} {}", "error:".red().bold(), commands::user_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let ctx = AppContext::build(config, cli.location())?;

    // Execute command
    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Signing in as {}", email);
            commands::auth::login(&ctx, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Chat { message } => commands::chat::run_chat(&ctx, message).await,
        Commands::Weather { place, date } => {
            tracing::debug!("Weather lookup for {}", place);
            commands::weather::show_weather(&ctx, &place, date).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "fintrip=debug" } else { "fintrip=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
