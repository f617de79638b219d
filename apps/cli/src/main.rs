//! Newsdesk CLI: bounded multi-agent news article generation.
//!
//! Runs the research → write → review → revise pipeline against Amazon
//! Bedrock, and exposes the individual tools and handlers for testing.

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
