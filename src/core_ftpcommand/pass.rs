use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::join_args;
use crate::session::Session;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the PASS command.
pub async fn handle_pass_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let response = submit_password(session, args);
    session.send_message(&response).await?;
    Ok(None)
}

/// Records the password and phrases the reply. Also used by the CDIR login wait.
pub fn submit_password<S>(session: &mut Session<S>, args: &[String]) -> String {
    session.auth.submit_password(&join_args(args));

    if session.auth.is_logged_in() {
        info!("{}: Password accepted, logged in", session.peer);
        String::from("!Logged in")
    } else {
        format!("+Send {}", session.auth.describe_missing())
    }
}
