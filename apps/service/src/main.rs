//! ContentFlow service: HTTP API and operator CLI for the content pipeline.
//!
//! Orchestrates research → draft → fact-check for PRDs held in Supabase
//! (or a local libSQL file).

mod api;
mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
