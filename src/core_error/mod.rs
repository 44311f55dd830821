pub mod fs_error;

pub use fs_error::FsError;
