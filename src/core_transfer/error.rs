// Errors raised while streaming file contents
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("I/O error during transfer: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed after {received} of {expected} bytes")]
    UnexpectedEof { expected: u64, received: u64 },
}
