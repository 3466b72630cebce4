use anyhow::Context;
use clap::Parser;

use task_intel::commands::{execute, Cli};
use task_intel::AppController;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let controller =
        AppController::new(cli.data_dir).context("Failed to initialize application")?;

    execute(&controller, cli.command)?;
    Ok(())
}
