//! Lantern CLI: discover and talk to A2A agents from the terminal.

mod commands;

use clap::Parser;
use commands::{execute, Cli};
use lantern_core::LanternConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LanternConfig::load(cli.config.as_deref())?;
    lantern_core::telemetry::init_telemetry(&config.telemetry)?;
    execute(cli, config).await
}
