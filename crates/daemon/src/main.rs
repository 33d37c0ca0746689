// SPDX-License-Identifier: MIT

//! `appliance-daemon` binary entry point: parses the CLI, loads config, and
//! either validates it (`check-config`) or starts the daemon (`run`, the
//! default). Everything past this file talks typed errors; this boundary is
//! the one place an `anyhow::Result` is acceptable.

use appliance_daemon::config::Config;
use appliance_daemon::logging;
use appliance_daemon::runtime::Daemon;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "appliance-daemon", version, about = "On-premises compliance appliance daemon")]
struct Cli {
    /// Path to the appliance's YAML config file.
    #[arg(long, global = true, default_value = "/etc/appliance/config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon (default).
    Run,
    /// Load and validate the config file, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    logging::init(&config.log_level);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!(site_id = %config.site_id, "starting appliance daemon");
            let daemon = Daemon::bootstrap(config).await?;
            daemon.run().await
        }
        Command::CheckConfig => {
            println!("config OK: site_id={} state_dir={}", config.site_id, config.state_dir.display());
            Ok(())
        }
    }
}
