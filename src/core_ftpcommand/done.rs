use crate::core_ftpcommand::handlers::CommandResult;
use crate::session::Session;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the DONE command. The session loop stops after the reply.
pub async fn handle_done_command<S>(session: &mut Session<S>, _args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("{}: Received DONE, closing connection", session.peer);
    let response = format!("+Ended connection to {}", session.hostname);
    session.send_message(&response).await?;
    session.running = false;
    Ok(None)
}
