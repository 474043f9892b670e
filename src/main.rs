// Main binary that starts the orchestrator server
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use outrider_server::ServerConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Outrider training-fleet orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output - shows debug-level logs
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the orchestrator HTTP server (default action).
    Serve(ServeArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Listen port, overriding OUTRIDER_PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_level},tower_http=info,reqwest=warn"))
    });
    registry().with(filter).with(fmt::layer()).init();

    let mut config = ServerConfig::from_env();

    // Bare invocation serves, like `serve` with no overrides
    if let Some(Commands::Serve(args)) = cli.command {
        if let Some(port) = args.port {
            config.port = port;
        }
    }

    info!(port = config.port, "starting outrider");
    outrider_server::run(config)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))?;

    Ok(())
}
