// Path containment errors
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SandboxError {
    #[error("Path is outside of the server root: {0}")]
    OutOfScope(PathBuf),

    #[error("Path resolves to the current directory: {0}")]
    Unchanged(PathBuf),
}
