use crate::constants::MAX_PATH_LENGTH;
use crate::core_error::FsError;
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::{join_args, parse_command};
use crate::core_transfer::codec::{append_file, receive_file};
use crate::core_transfer::TransferError;
use crate::helpers::get_site_free_space;
use crate::session::Session;
use log::{error, info, warn};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorMode {
    New,
    Old,
    Append,
}

impl StorMode {
    fn from_str(mode: &str) -> Option<Self> {
        match mode.to_ascii_uppercase().as_str() {
            "NEW" => Some(StorMode::New),
            "OLD" => Some(StorMode::Old),
            "APP" => Some(StorMode::Append),
            _ => None,
        }
    }
}

/// Handles the STOR (Store File) command: `STOR { NEW | OLD | APP } file`.
///
/// Once the mode is accepted the client announces the size with
/// `SIZE <bytes>` and then sends exactly that many bytes.
///
/// # Arguments
///
/// * `session` - The client session receiving the file.
/// * `args` - The mode followed by the file name, split on whitespace.
///
/// # Returns
///
/// `Ok(None)` when the file was saved or refused. An error when the
/// connection failed or the client stopped sending before the announced size.
pub async fn handle_stor_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mode = match StorMode::from_str(&args[0]) {
        Some(mode) => mode,
        None => {
            session.send_message("-Invalid STOR mode").await?;
            return Ok(None);
        }
    };

    if args.len() < 2 {
        session
            .send_message("-Insufficient arguments for command STOR")
            .await?;
        return Ok(None);
    }

    let name = join_args(&args[1..]);
    let file_path = match session.sandbox.resolve(&session.working_dir, &args[1..]) {
        Ok(path) if path != session.working_dir => path,
        _ => {
            warn!("{}: STOR outside of server scope: {}", session.peer, name);
            session.send_message("-File out of server scope").await?;
            return Ok(None);
        }
    };

    let too_long = match fs::symlink_metadata(&file_path).await {
        Err(e) => matches!(FsError::from_io(&e), FsError::PathTooLong),
        Ok(_) => false,
    };
    if too_long || file_path.as_os_str().len() > MAX_PATH_LENGTH {
        session
            .send_message(&FsError::PathTooLong.to_save_response())
            .await?;
        return Ok(None);
    }
    if file_path.is_dir() {
        session
            .send_message(&FsError::IsDirectory.to_save_response())
            .await?;
        return Ok(None);
    }
    if !file_path.parent().is_some_and(Path::is_dir) {
        session
            .send_message(&FsError::NotFound.to_save_response())
            .await?;
        return Ok(None);
    }

    let exists = file_path.is_file();
    let response = match (mode, exists) {
        (StorMode::New, true) => {
            session
                .send_message("-File exists, but system doesn't support generations")
                .await?;
            return Ok(None);
        }
        (StorMode::New, false) => "+File does not exist, will create new file",
        (StorMode::Old, true) => "+Will write over old file",
        (StorMode::Old, false) => "+Will create new file",
        (StorMode::Append, true) => "+Will append to file",
        (StorMode::Append, false) => "+Will create file",
    };
    session.send_message(response).await?;

    await_size(session, &file_path, &name, mode == StorMode::Append && exists).await
}

/// AwaitingSize: the next line must be `SIZE <bytes>`.
async fn await_size<S>(
    session: &mut Session<S>,
    file_path: &Path,
    name: &str,
    append: bool,
) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let line = session.receive_message().await?;
    let (verb, args) = parse_command(&line);

    if verb != "SIZE" {
        warn!("{}: Expected SIZE, got {:?}", session.peer, verb);
        session
            .send_message("-Unexpected command, STOR aborted")
            .await?;
        return Ok(None);
    }

    let size = match args.first().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) => size,
        None => {
            session.send_message("-Invalid file size").await?;
            return Ok(None);
        }
    };

    if let Some(free) = get_site_free_space(&session.working_dir) {
        if free < size {
            warn!(
                "{}: Refusing {} bytes for {}, {} bytes free",
                session.peer, size, name, free
            );
            session
                .send_message("-Not enough room, don't send it")
                .await?;
            return Ok(None);
        }
    }

    session.send_message("+ok, waiting for file").await?;

    let transfer_type = session.transfer_type;
    let buffer_size = session.transfer_buffer_size;
    let result = if append {
        append_file(session.stream_mut(), file_path, transfer_type, size, buffer_size).await
    } else {
        receive_file(session.stream_mut(), file_path, transfer_type, size, buffer_size).await
    };

    match result {
        Ok(received) => {
            info!("{}: Saved {:?} ({} bytes)", session.peer, file_path, received);
            session.send_message(&format!("+Saved {}", name)).await?;
        }
        // The peer went away mid-payload; nothing left to reply to.
        Err(e @ TransferError::UnexpectedEof { .. }) => return Err(e.into()),
        Err(TransferError::Io(e)) => {
            error!("{}: Failed to save {:?}: {}", session.peer, file_path, e);
            session
                .send_message(&FsError::from_io(&e).to_save_response())
                .await?;
        }
    }
    Ok(None)
}
