// Here's the list of the SFTP commands implemented
pub mod acct;
pub mod cdir;
pub mod done;
pub mod kill;
pub mod list;
pub mod name;
pub mod pass;
pub mod retr;
pub mod stor;
pub mod type_;
pub mod user;

// Verb table and dispatch
pub mod handlers;
pub mod sftpcommand;

// The utils and common functions are here
pub mod utils;

#[cfg(test)]
mod test_session;
