mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_error;
mod core_ftpcommand;
mod core_log;
mod core_network;
mod core_sandbox;
mod core_transfer;
mod helpers;
mod server;
mod session;

use crate::config::Config;
use crate::core_cli::Cli;
use crate::core_log::logger::init_logger;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    init_logger(args.verbose);

    // Load configuration from the TOML file, if any
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    // CLI flags override the file
    args.apply_to(&mut config);

    // Run the SFTP server
    server::run(config).await?;

    Ok(())
}
