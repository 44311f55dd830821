pub mod error;
pub mod sandbox;

pub use error::SandboxError;
pub use sandbox::Sandbox;
