use crate::config::Config;
use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "rouillesftpd",
    about = "A Simple File Transfer Protocol (RFC913) server written in Rust."
)]
pub struct Cli {
    /// Directory served to clients. Sessions can never leave it.
    pub root_dir: Option<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on (defaults to 115)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    pub address: Option<String>,

    /// Log in with a user-id alone, without account and password
    #[arg(long)]
    pub user_only_login: bool,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies the command-line overrides on top of a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(root_dir) = &self.root_dir {
            config.server.root_dir = root_dir.clone();
        }
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(address) = &self.address {
            config.server.listen_address = address.clone();
        }
        if self.user_only_login {
            config.server.require_account_and_password = false;
        }
    }
}
