use crate::constants::{GENERIC_ERROR_MESSAGE, MAX_PATH_LENGTH};
use crate::core_error::FsError;
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::join_args;
use crate::core_transfer::codec::send_file;
use crate::session::Session;
use log::{error, info, warn};
use std::io;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the RETR (Retrieve) command.
///
/// The file size is announced first; the client then answers `SEND` to
/// receive exactly that many bytes or `STOP` to cancel.
///
/// # Arguments
///
/// * `session` - The client session; its working directory and transfer type apply.
/// * `args` - The file name, split on whitespace.
///
/// # Returns
///
/// `Ok(None)` once the exchange is over, whatever its outcome. An error only
/// when the connection itself failed.
pub async fn handle_retr_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = join_args(args);

    let file_path = match session.sandbox.resolve(&session.working_dir, args) {
        Ok(path) => path,
        Err(e) => {
            warn!("{}: RETR {}: {}", session.peer, name, e);
            session.send_message("-File out of server scope").await?;
            return Ok(None);
        }
    };

    let size = match check_retrievable(&file_path).await {
        Ok(size) => size,
        Err(response) => {
            session.send_message(response).await?;
            return Ok(None);
        }
    };

    session.send_message(&size.to_string()).await?;
    await_transfer_go(session, &file_path).await
}

/// The file's size, or the reply explaining why it can't be sent.
async fn check_retrievable(path: &Path) -> Result<u64, &'static str> {
    if path.as_os_str().len() > MAX_PATH_LENGTH {
        return Err("-File path is too long");
    }

    let metadata = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err("-File doesn't exist"),
        Err(e) => return Err(open_error_response(&e)),
    };

    if metadata.len() == 0 {
        return Err("-File is empty, aborting connection");
    }

    // Fail before the size is announced if the file can't be opened.
    if let Err(e) = File::open(path).await {
        error!("Failed to open {:?}: {}", path, e);
        return Err(open_error_response(&e));
    }

    Ok(metadata.len())
}

fn open_error_response(error: &io::Error) -> &'static str {
    match FsError::from_io(error) {
        FsError::NotFound => "-File doesn't exist",
        FsError::PermissionDenied => "-Access to the file was denied",
        FsError::PathTooLong => "-File path is too long",
        _ => GENERIC_ERROR_MESSAGE,
    }
}

/// AwaitingTransferGo.
async fn await_transfer_go<S>(session: &mut Session<S>, file_path: &Path) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = session.receive_message().await?;

    match reply.trim().to_ascii_uppercase().as_str() {
        "SEND" => {
            let transfer_type = session.transfer_type;
            let buffer_size = session.transfer_buffer_size;
            let sent = send_file(file_path, transfer_type, session.stream_mut(), buffer_size).await?;
            info!(
                "{}: Sent {:?} ({} bytes, {} mode)",
                session.peer,
                file_path,
                sent,
                transfer_type.name()
            );
            session.send_message("+Finished file transfer").await?;
        }
        "STOP" => {
            session.send_message("+ok, RETR aborted").await?;
        }
        _ => {
            warn!("{}: Unexpected reply to size announcement: {:?}", session.peer, reply);
            session
                .send_message("-Unexpected command, RETR aborted")
                .await?;
        }
    }
    Ok(None)
}
