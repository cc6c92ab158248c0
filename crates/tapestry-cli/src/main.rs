//! Tapestry terminal player entry point.

use std::error::Error;

use clap::Parser;
use tapestry_cli::{Cli, Console, StdinInput, run, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json);

    let console = Console::stdout();
    let mut input = StdinInput::spawn();
    let outcome = run(&cli, &console, &mut input).await?;
    tracing::info!(?outcome, "session closed");

    Ok(())
}
