use crate::core_error::FsError;
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::join_args;
use crate::core_sandbox::sandbox::is_inside;
use crate::session::Session;
use log::{error, info, warn};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the KILL command.
///
/// Deletes a file below the working directory. Directories are refused.
pub async fn handle_kill_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = join_args(args);

    let file_path = match session.sandbox.resolve(&session.working_dir, args) {
        Ok(path) if is_inside(&session.working_dir, &path) => path,
        _ => {
            warn!("{}: KILL outside of working directory: {}", session.peer, name);
            session
                .send_message("-Not deleted because: file is out of current directory scope")
                .await?;
            return Ok(None);
        }
    };

    let response = match fs::metadata(&file_path).await {
        Err(e) => FsError::from_io(&e).to_kill_response(),
        Ok(metadata) if metadata.is_dir() => FsError::IsDirectory.to_kill_response(),
        Ok(_) => match fs::remove_file(&file_path).await {
            Ok(()) => {
                info!("{}: Deleted {:?}", session.peer, file_path);
                format!("+{} deleted", name)
            }
            Err(e) => {
                error!("{}: Failed to delete {:?}: {}", session.peer, file_path, e);
                FsError::from_io(&e).to_kill_response()
            }
        },
    };

    session.send_message(&response).await?;
    Ok(None)
}
