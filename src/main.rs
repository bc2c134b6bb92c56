//! custom-filter - run playbooks with the custom_title filter plugin
//!
//! This is the main entry point for the custom-filter CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use custom_filter::config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &config.logging.log_level);

    // Display version if verbose
    if cli.verbosity() >= 2 {
        eprintln!("custom-filter v{} by {}", VERSION, AUTHORS);
    }

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::Run(args) => args.execute(&mut ctx).await,
        Commands::Render(args) => args.execute(&mut ctx).await,
        Commands::Filters(args) => args.execute(&mut ctx).await,
        Commands::Validate(args) => args.execute(&mut ctx).await,
    };

    let exit_code = result.unwrap_or_else(|e| {
        ctx.output.error(&format!("{:#}", e));
        e.downcast_ref::<custom_filter::error::Error>()
            .map_or(1, custom_filter::error::Error::exit_code)
    });

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, default_level: &str) {
    let filter = match verbosity {
        0 => default_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
