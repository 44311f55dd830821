// src/constants.rs

pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 115; // RFC913
pub const DEFAULT_TRANSFER_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Every reply sent to the client ends with this byte.
pub const MESSAGE_TERMINATOR: u8 = b'\0';

/// Longest path (in bytes) RETR/STOR will try to open.
pub const MAX_PATH_LENGTH: usize = 4096;

pub const LIST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const GENERIC_ERROR_MESSAGE: &str = "-Error while processing the request, please try again";
