use crate::core_ftpcommand::sftpcommand::SftpCommand;
use crate::core_ftpcommand::utils::parse_command;
use crate::core_ftpcommand::{
    acct, cdir, done, kill, list, name, pass, retr, stor, type_, user,
};
use crate::session::{Session, SessionError};
use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

/// What every handler returns.
///
/// `Some(line)` carries a line read during a nested wait that belongs to the
/// main loop; the session dispatches it next.
pub type CommandResult = Result<Option<String>, SessionError>;

/// Validates `line` against the login and argument gates and runs its handler.
pub async fn dispatch_command<S>(session: &mut Session<S>, line: &str) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (verb, args) = parse_command(line);

    let command = match SftpCommand::from_str(&verb) {
        Some(command) => command,
        None => {
            warn!("{}: Unknown command {:?}", session.peer, verb);
            session.send_message("-Invalid command").await?;
            return Ok(None);
        }
    };

    if command.requires_login() && !session.auth.is_logged_in() && !may_wait_for_login(session, command) {
        info!("{}: {} refused, user not logged in", session.peer, command);
        session.send_message("-User not logged").await?;
        return Ok(None);
    }

    if command.requires_arguments() && args.is_empty() {
        session
            .send_message(&format!("-Insufficient arguments for command {}", command))
            .await?;
        return Ok(None);
    }

    info!("{}: Handling {}", session.peer, command);
    match command {
        SftpCommand::USER => user::handle_user_command(session, &args).await,
        SftpCommand::ACCT => acct::handle_acct_command(session, &args).await,
        SftpCommand::PASS => pass::handle_pass_command(session, &args).await,
        SftpCommand::TYPE => type_::handle_type_command(session, &args).await,
        SftpCommand::LIST => list::handle_list_command(session, &args).await,
        SftpCommand::CDIR => cdir::handle_cdir_command(session, &args).await,
        SftpCommand::KILL => kill::handle_kill_command(session, &args).await,
        SftpCommand::NAME => name::handle_name_command(session, &args).await,
        SftpCommand::DONE => done::handle_done_command(session, &args).await,
        SftpCommand::RETR => retr::handle_retr_command(session, &args).await,
        SftpCommand::STOR => stor::handle_stor_command(session, &args).await,
    }
}

/// CDIR may run with a user-id alone when account and password are still
/// owed: it then collects them itself before changing directory.
fn may_wait_for_login<S>(session: &Session<S>, command: SftpCommand) -> bool {
    command == SftpCommand::CDIR
        && session.auth.requires_account_and_password()
        && session.auth.has_user_id()
}
