mod bulk;
mod cli;
mod config;
mod extract;
mod ledger;
mod logging;
mod model;
mod sheets;
mod sync;
mod tracker;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_format)?;

    match cli.command {
        Command::Sync(args) => cli::handle_sync(cli.config, args).await,
        Command::Create(args) => cli::handle_create(cli.config, args).await,
    }
}
