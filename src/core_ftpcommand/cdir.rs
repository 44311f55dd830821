use crate::core_ftpcommand::acct::submit_account;
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::pass::submit_password;
use crate::core_ftpcommand::sftpcommand::SftpCommand;
use crate::core_ftpcommand::utils::{join_args, parse_command};
use crate::core_sandbox::SandboxError;
use crate::session::{Session, SessionError};
use log::info;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the CDIR command.
///
/// When account and password are still owed the directory is checked, the
/// client is asked for them, and the change only happens once they arrive.
/// Any other command sent meanwhile cancels the change and is handed back to
/// the main loop.
///
/// # Arguments
///
/// * `session` - The client session whose working directory changes.
/// * `args` - The target directory, split on whitespace.
///
/// # Returns
///
/// `Some(line)` when a command interrupted the login wait and still has to
/// be dispatched, `None` otherwise.
pub async fn handle_cdir_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let target = match session.sandbox.resolve_change(&session.working_dir, args) {
        Ok(path) => path,
        Err(SandboxError::Unchanged(_)) => {
            session
                .send_message("-Can't connect to directory because: tried to change to current directory")
                .await?;
            return Ok(None);
        }
        Err(SandboxError::OutOfScope(_)) => {
            session
                .send_message("-Can't connect to directory because: directory out of server scope")
                .await?;
            return Ok(None);
        }
    };

    if !target.is_dir() {
        let response = format!(
            "-Can't connect to directory because: directory \"{}\" doesn't exist",
            join_args(args)
        );
        session.send_message(&response).await?;
        return Ok(None);
    }

    if !session.auth.requires_account_and_password() || session.auth.is_logged_in() {
        change_directory(session, target).await?;
        return Ok(None);
    }

    session
        .send_message("+directory ok, send account and password")
        .await?;
    await_login(session, target).await
}

/// AwaitingLogin: only ACCT and PASS are consumed here.
async fn await_login<S>(session: &mut Session<S>, target: PathBuf) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let line = session.receive_message().await?;
        let (verb, args) = parse_command(&line);

        let command = match SftpCommand::from_str(&verb) {
            Some(command @ (SftpCommand::ACCT | SftpCommand::PASS)) => command,
            _ => {
                info!(
                    "{}: CDIR to {:?} cancelled by {:?}",
                    session.peer, target, verb
                );
                return Ok(Some(line));
            }
        };

        if args.is_empty() {
            session
                .send_message(&format!("-Insufficient arguments for command {}", command))
                .await?;
            continue;
        }

        let response = match command {
            SftpCommand::ACCT => submit_account(session, &args),
            _ => submit_password(session, &args),
        };

        if session.auth.is_logged_in() {
            change_directory(session, target).await?;
            return Ok(None);
        }
        session.send_message(&response).await?;
    }
}

async fn change_directory<S>(
    session: &mut Session<S>,
    target: PathBuf,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.working_dir = target;
    let display = session.display_working_dir();
    info!("{}: Changed working dir to {}", session.peer, display);
    session
        .send_message(&format!("!Changed working dir to {}", display))
        .await
}
