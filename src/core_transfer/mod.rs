pub mod codec;
pub mod error;
pub mod transfer_type;

pub use error::TransferError;
pub use transfer_type::TransferType;
