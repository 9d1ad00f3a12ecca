mod args;
mod output;
mod runner;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use args::{Cli, Commands};
use runner::{build_orchestrator, run_logins};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve { bind, probe } => {
            let orchestrator = build_orchestrator(&probe)?;
            server::serve(&bind, orchestrator).await?;
        }
        Commands::Run {
            num_logins,
            output_format,
            probe,
        } => {
            run_logins(num_logins, &output_format, &probe).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    // stdout carries events in `run`; keep logs on stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
