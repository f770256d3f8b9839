mod args;
mod commands;
mod logging;
mod render;

use clap::Parser;

use crate::args::{Cli, Command};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    logging::init_cli();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Replay(args) => commands::replay(args).await,
        Command::Check(args) => commands::check(args).await,
    };

    outcome.map_err(|e| color_eyre::eyre::eyre!("{e:#}"))
}
