//! File payload streaming for RETR and STOR.
//!
//! The payload has no framing of its own: the receiver is told the byte
//! count beforehand and stops after exactly that many bytes. ASCII mode maps
//! every byte outside 7-bit ASCII to `?`, one byte for one byte, so the
//! announced count is still exact after re-encoding.

use crate::core_transfer::error::TransferError;
use crate::core_transfer::transfer_type::TransferType;
use log::{debug, error};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const ASCII_REPLACEMENT: u8 = b'?';
const TEMP_NAME_PREFIX_CHARS: usize = 32;

/// Streams the file at `path` to `writer`. Returns the number of bytes sent.
pub async fn send_file<W>(
    path: &Path,
    transfer_type: TransferType,
    writer: &mut W,
    buffer_size: usize,
) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut file = File::open(path).await?;
    let mut buffer = vec![0; buffer_size.max(1)];
    let mut sent: u64 = 0;

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        let chunk = &mut buffer[..bytes_read];
        if transfer_type.is_ascii() {
            encode_ascii(chunk);
        }
        writer.write_all(chunk).await?;
        sent += bytes_read as u64;
    }
    writer.flush().await?;

    debug!("Sent {} bytes from {:?} ({} mode)", sent, path, transfer_type.name());
    Ok(sent)
}

/// Reads exactly `expected` bytes from `reader` into `destination`.
///
/// The bytes land in a temporary file next to the destination, which is
/// renamed over it once complete. Nothing is left behind on failure.
pub async fn receive_file<R>(
    reader: &mut R,
    destination: &Path,
    transfer_type: TransferType,
    expected: u64,
    buffer_size: usize,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
{
    let temp_path = temp_path_for(destination);
    let received = match receive_into(reader, &temp_path, transfer_type, expected, buffer_size).await {
        Ok(received) => received,
        Err(e) => {
            discard(&temp_path).await;
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&temp_path, destination).await {
        error!("Failed to move {:?} to {:?}: {}", temp_path, destination, e);
        discard(&temp_path).await;
        return Err(e.into());
    }
    Ok(received)
}

/// Same as [`receive_file`], but the bytes are appended to `destination`.
pub async fn append_file<R>(
    reader: &mut R,
    destination: &Path,
    transfer_type: TransferType,
    expected: u64,
    buffer_size: usize,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
{
    let temp_path = temp_path_for(destination);
    let result = async {
        let received = receive_into(reader, &temp_path, transfer_type, expected, buffer_size).await?;
        let mut source = File::open(&temp_path).await?;
        let mut target = OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination)
            .await?;
        tokio::io::copy(&mut source, &mut target).await?;
        target.flush().await?;
        Ok::<u64, TransferError>(received)
    }
    .await;

    discard(&temp_path).await;
    result
}

async fn receive_into<R>(
    reader: &mut R,
    path: &Path,
    transfer_type: TransferType,
    expected: u64,
    buffer_size: usize,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut file = File::create(path).await?;
    let mut buffer = vec![0; buffer_size.max(1)];
    let mut remaining = expected;

    while remaining > 0 {
        // Never read past the announced size; what follows belongs to the next message.
        let wanted = remaining.min(buffer.len() as u64) as usize;
        let received = reader.read(&mut buffer[..wanted]).await?;
        if received == 0 {
            return Err(TransferError::UnexpectedEof {
                expected,
                received: expected - remaining,
            });
        }
        let chunk = &mut buffer[..received];
        if transfer_type.is_ascii() {
            encode_ascii(chunk);
        }
        file.write_all(chunk).await?;
        remaining -= received as u64;
    }
    file.flush().await?;

    debug!("Received {} bytes into {:?}", expected, path);
    Ok(expected)
}

fn encode_ascii(chunk: &mut [u8]) {
    for byte in chunk.iter_mut() {
        if !byte.is_ascii() {
            *byte = ASCII_REPLACEMENT;
        }
    }
}

/// Temporary sibling of `destination`. Only a prefix of the file name is
/// kept so the temporary name is never longer than the destination allows.
fn temp_path_for(destination: &Path) -> PathBuf {
    let name: String = destination
        .file_name()
        .map(|n| n.to_string_lossy().chars().take(TEMP_NAME_PREFIX_CHARS).collect())
        .unwrap_or_else(|| String::from("upload"));
    let temp_name = format!(".{}.{:08x}.part", name, rand::random::<u32>());
    match destination.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            error!("Failed to remove temporary file {:?}: {}", path, e);
        }
    }
}
