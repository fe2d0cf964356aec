use anyhow::Result;
use clap::Parser;
use tododex::cli::{Cli, Commands};
use tododex::config::Config;
use tododex::{doctor, engine};

fn init_simple_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the command-line arguments.
    let cli = Cli::parse();

    // Dispatch to the appropriate command handler.
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            // start_bot() initializes its own tracing.
            engine::gateway::start_bot().await?;
        }
        Commands::Doctor => {
            init_simple_tracing();
            let config = Config::load()?;
            doctor::run(&config).await?;
        }
    }

    Ok(())
}
