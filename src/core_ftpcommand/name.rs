use crate::core_error::FsError;
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::{join_args, parse_command};
use crate::core_sandbox::sandbox::is_inside;
use crate::session::Session;
use log::{error, info};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};

const TOBE: &str = "TOBE";

/// Handles the NAME command.
///
/// After `+File Exists` every `TOBE <new-name>` renames the file again, so a
/// client can retry without re-sending NAME. The first line that is not a
/// TOBE ends the exchange and goes back to the main loop.
///
/// # Arguments
///
/// * `session` - The client session.
/// * `args` - The name of the file to rename, split on whitespace.
///
/// # Returns
///
/// The line that ended the TOBE exchange, for the main loop to dispatch.
/// `None` when NAME was refused.
pub async fn handle_name_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = join_args(args);

    let source = match session.sandbox.resolve(&session.working_dir, args) {
        Ok(path) if is_inside(&session.working_dir, &path) && path.exists() => path,
        _ => {
            session.send_message(&format!("-Can't find {}", name)).await?;
            return Ok(None);
        }
    };

    session.send_message("+File Exists").await?;
    await_rename_target(session, source, name).await
}

/// AwaitingRenameTarget.
async fn await_rename_target<S>(
    session: &mut Session<S>,
    mut source: PathBuf,
    mut old_name: String,
) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let line = session.receive_message().await?;
        let (verb, args) = parse_command(&line);

        if verb != TOBE {
            info!("{}: Rename of {} ended by {:?}", session.peer, old_name, verb);
            return Ok(Some(line));
        }

        if args.is_empty() {
            session.send_message("-No name received").await?;
            continue;
        }

        let new_name = join_args(&args);
        match rename_file(session, &source, &args, &new_name).await {
            Ok(target) => {
                info!("{}: Renamed {:?} to {:?}", session.peer, source, target);
                session
                    .send_message(&format!("+{} renamed to {}", old_name, new_name))
                    .await?;
                source = target;
                old_name = new_name;
            }
            Err(e) => {
                error!("{}: Failed to rename {:?}: {}", session.peer, source, e);
                session.send_message(&e.to_rename_response()).await?;
            }
        }
    }
}

async fn rename_file<S>(
    session: &Session<S>,
    source: &Path,
    args: &[String],
    new_name: &str,
) -> Result<PathBuf, FsError> {
    let target = match session.sandbox.resolve(&session.working_dir, args) {
        Ok(path) if is_inside(&session.working_dir, &path) => path,
        _ => {
            return Err(FsError::Other(String::from(
                "new name is out of current directory scope",
            )))
        }
    };

    if fs::symlink_metadata(&target).await.is_ok() {
        return Err(FsError::AlreadyExists(new_name.to_string()));
    }
    if fs::metadata(source).await.is_err() {
        return Err(FsError::NotFound);
    }

    fs::rename(source, &target).await?;
    Ok(target)
}
