use crate::config::Config;
use crate::core_network::network;
use crate::core_sandbox::Sandbox;
use crate::helpers::{log_config, resolve_hostname};
use crate::session::{Session, SessionOptions};
use anyhow::{Context, Result};
use log::{error, info};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Runs the SFTP server with the provided configuration.
///
/// The root directory is validated and canonicalized once here; every
/// session gets its own copy of the resulting sandbox.
pub async fn run(config: Config) -> Result<()> {
    info!("Starting server with config:");
    log_config(&config);

    let sandbox = Sandbox::new(&config.server.root_dir).with_context(|| {
        format!(
            "Directory \"{}\" does not exist or is not a directory",
            config.server.root_dir
        )
    })?;
    let hostname = resolve_hostname(&config);
    info!("Announcing host name: {}", hostname);

    match network::start_server(Arc::new(config), sandbox, hostname).await {
        Ok(_) => info!("Server stopped."),
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

pub fn initialize_session<S>(
    config: &Config,
    stream: S,
    sandbox: Sandbox,
    hostname: String,
    peer: String,
) -> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let options = SessionOptions {
        hostname,
        peer,
        require_account_and_password: config.server.require_account_and_password,
        receive_buffer_size: config.server.receive_buffer_size(),
        transfer_buffer_size: config.server.transfer_buffer_size(),
    };
    Session::new(stream, sandbox, options)
}
