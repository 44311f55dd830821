// Filesystem failures as the protocol reports them
use std::io::{self, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("file doesn't exist")]
    NotFound,

    #[error("it is a directory")]
    IsDirectory,

    #[error("file is in use")]
    InUse,

    #[error("permission denied")]
    PermissionDenied,

    #[error("path is too long")]
    PathTooLong,

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Other(String),
}

impl FsError {
    /// Sorts an I/O error into the failure classes clients are told about.
    pub fn from_io(error: &io::Error) -> Self {
        if is_name_too_long(error) {
            return FsError::PathTooLong;
        }
        match error.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            ErrorKind::PermissionDenied => FsError::PermissionDenied,
            ErrorKind::IsADirectory => FsError::IsDirectory,
            ErrorKind::ResourceBusy | ErrorKind::WouldBlock => FsError::InUse,
            ErrorKind::AlreadyExists => FsError::AlreadyExists(String::from("file")),
            _ => FsError::Other(error.to_string()),
        }
    }

    pub fn to_kill_response(&self) -> String {
        format!("-Not deleted because: {}", self)
    }

    pub fn to_rename_response(&self) -> String {
        format!("-File wasn't renamed because: {}", self)
    }

    pub fn to_save_response(&self) -> String {
        format!("-Couldn't save because {}", self)
    }
}

// A single path component longer than the filesystem allows.
#[cfg(unix)]
fn is_name_too_long(error: &io::Error) -> bool {
    error.raw_os_error() == Some(libc::ENAMETOOLONG)
}

#[cfg(not(unix))]
fn is_name_too_long(_error: &io::Error) -> bool {
    false
}

impl From<io::Error> for FsError {
    fn from(error: io::Error) -> Self {
        FsError::from_io(&error)
    }
}
