//! opsplit CLI — split coarse operation descriptions into atomic,
//! agent-executable sub-steps, grounded in a knowledge base of
//! documented standard operations.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
