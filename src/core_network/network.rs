use crate::config::Config;
use crate::core_sandbox::Sandbox;
use crate::server::initialize_session;
use anyhow::{Context, Result};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Accepts clients forever, one task per connection.
pub async fn start_server(config: Arc<Config>, sandbox: Sandbox, hostname: String) -> Result<()> {
    let address = format!(
        "{}:{}",
        config.server.listen_address, config.server.listen_port
    );
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server listening on {}", address);
    info!("Serving files from {:?}", sandbox.root());

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("New connection from {}", addr);

        let config = Arc::clone(&config);
        let sandbox = sandbox.clone();
        let hostname = hostname.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, addr, config, sandbox, hostname).await {
                error!("Connection error for {}: {}", addr, e);
            }
            info!("Connection closed for {}", addr);
        });
    }
}

pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    config: Arc<Config>,
    sandbox: Sandbox,
    hostname: String,
) -> Result<()> {
    if let Err(e) = socket.set_nodelay(true) {
        error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }

    let mut session = initialize_session(&config, socket, sandbox, hostname, addr.to_string());
    session.run().await?;
    Ok(())
}
