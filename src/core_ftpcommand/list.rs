use crate::constants::{GENERIC_ERROR_MESSAGE, LIST_TIME_FORMAT};
use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_ftpcommand::utils::{join_args, quote_name};
use crate::session::Session;
use chrono::{Local, TimeZone};
use filetime::FileTime;
use log::error;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};

const INVALID_FORMAT: &str =
    "-Invalid command. The format for this command is: LIST { F | V } directory path";
const VERBOSE_HEADER: &str = "TYPE \t CREATED AT\t\tLAST ACCESSED\t\tOWNER \t GROUP\tNAME\r\n";

struct Entry {
    name: String,
    metadata: Metadata,
}

/// Handles the LIST command.
///
/// `LIST F [path]` lists entry names, `LIST V [path]` adds type, times and
/// ownership. The path is resolved against the working directory, which is
/// left unchanged.
pub async fn handle_list_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let verbose = match args[0].to_ascii_uppercase().as_str() {
        "F" => false,
        "V" => true,
        _ => {
            session.send_message(INVALID_FORMAT).await?;
            return Ok(None);
        }
    };

    let directory = if args.len() > 1 {
        match session.sandbox.resolve(&session.working_dir, &args[1..]) {
            Ok(path) => path,
            Err(_) => {
                session.send_message("-Directory out of server scope").await?;
                return Ok(None);
            }
        }
    } else {
        session.working_dir.clone()
    };

    if !directory.is_dir() {
        let response = format!(
            "-The directory {} does not exist in current path",
            join_args(&args[1..])
        );
        session.send_message(&response).await?;
        return Ok(None);
    }

    let header = format!("+{}\r\n", session.sandbox.display(&directory));
    let listing = if verbose {
        verbose_listing(&directory).await
    } else {
        formatted_listing(&directory).await
    };

    match listing {
        Ok(body) => session.send_message(&format!("{}{}", header, body)).await?,
        Err(e) => {
            error!("{}: Failed to list {:?}: {}", session.peer, directory, e);
            session.send_message(GENERIC_ERROR_MESSAGE).await?;
        }
    }
    Ok(None)
}

async fn read_entries(directory: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(directory).await?;
    while let Some(entry) = reader.next_entry().await? {
        let metadata = entry.metadata().await?;
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().into_owned(),
            metadata,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

async fn formatted_listing(directory: &Path) -> io::Result<String> {
    let mut body = String::new();
    for entry in read_entries(directory).await? {
        body.push_str(&quote_name(&entry.name));
        body.push_str("\r\n");
    }
    Ok(body)
}

async fn verbose_listing(directory: &Path) -> io::Result<String> {
    let entries = read_entries(directory).await?;
    let (folders, files): (Vec<&Entry>, Vec<&Entry>) =
        entries.iter().partition(|entry| entry.metadata.is_dir());

    let mut body = String::from(VERBOSE_HEADER);
    for entry in folders {
        body.push_str(&verbose_row("FOLDER \t ", entry));
    }
    for entry in files {
        body.push_str(&verbose_row("FILE\t ", entry));
    }
    Ok(body)
}

fn verbose_row(kind: &str, entry: &Entry) -> String {
    let (owner, group) = ownership(&entry.metadata);
    format!(
        "{}{} \t{} \t{}\t {}\t {}\r\n",
        kind,
        format_time(FileTime::from_creation_time(&entry.metadata)),
        format_time(Some(FileTime::from_last_access_time(&entry.metadata))),
        owner,
        group,
        quote_name(&entry.name)
    )
}

fn format_time(time: Option<FileTime>) -> String {
    time.and_then(|t| Local.timestamp_opt(t.unix_seconds(), t.nanoseconds()).single())
        .map(|t| t.format(LIST_TIME_FORMAT).to_string())
        .unwrap_or_else(|| String::from("-"))
}

#[cfg(unix)]
fn ownership(metadata: &Metadata) -> (String, String) {
    use std::os::unix::fs::MetadataExt;
    (metadata.uid().to_string(), metadata.gid().to_string())
}

#[cfg(not(unix))]
fn ownership(_metadata: &Metadata) -> (String, String) {
    (String::from("-"), String::from("-"))
}
