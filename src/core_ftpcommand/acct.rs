use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::join_args;
use crate::session::Session;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the ACCT command.
pub async fn handle_acct_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let response = submit_account(session, args);
    session.send_message(&response).await?;
    Ok(None)
}

/// Records the account and phrases the reply. Also used by the CDIR login wait.
pub fn submit_account<S>(session: &mut Session<S>, args: &[String]) -> String {
    session.auth.submit_account(&join_args(args));

    if session.auth.is_logged_in() {
        info!("{}: Account valid, logged in", session.peer);
        String::from("!Account valid, logged in")
    } else {
        format!("+Account valid, send {}", session.auth.describe_missing())
    }
}
