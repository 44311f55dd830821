use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::join_args;
use crate::session::Session;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the USER command.
///
/// Any user-id is accepted. The reply tells the client either that it is
/// logged in or which credentials are still missing.
pub async fn handle_user_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let user_id = join_args(args);
    session.auth.submit_user_id(&user_id);

    let response = if session.auth.is_logged_in() {
        info!("{}: {} logged in", session.peer, session.auth.user_id());
        format!("!{} logged in", session.auth.user_id())
    } else {
        info!("{}: User-id accepted: {}", session.peer, user_id);
        format!("+User-id valid, send {}", session.auth.describe_missing())
    };

    session.send_message(&response).await?;
    Ok(None)
}
