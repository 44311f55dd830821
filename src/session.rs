use crate::constants::MESSAGE_TERMINATOR;
use crate::core_auth::AuthState;
use crate::core_ftpcommand::handlers::dispatch_command;
use crate::core_sandbox::Sandbox;
use crate::core_transfer::{TransferError, TransferType};
use log::{debug, error, info};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Failures of the connection itself. These end the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Stream error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Settings a session is created with.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub hostname: String,
    pub peer: String,
    pub require_account_and_password: bool,
    pub receive_buffer_size: usize,
    pub transfer_buffer_size: usize,
}

/// Everything one connection owns. Nothing in here is shared with other sessions.
#[derive(Debug)]
pub struct Session<S> {
    stream: S,
    buffer: Vec<u8>,
    pub sandbox: Sandbox,
    pub working_dir: PathBuf,
    pub transfer_type: TransferType,
    pub auth: AuthState,
    pub running: bool,
    pub hostname: String,
    pub peer: String,
    pub transfer_buffer_size: usize,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, sandbox: Sandbox, options: SessionOptions) -> Self {
        let working_dir = sandbox.root().to_path_buf();
        Self {
            stream,
            buffer: vec![0; options.receive_buffer_size.max(1)],
            sandbox,
            working_dir,
            transfer_type: TransferType::default(),
            auth: AuthState::new(options.require_account_and_password),
            running: true,
            hostname: options.hostname,
            peer: options.peer,
            transfer_buffer_size: options.transfer_buffer_size.max(1),
        }
    }

    /// Greets the client and serves commands until DONE or disconnect.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        info!("{}: Connection established, sending greeting", self.peer);
        let greeting = format!("+{} SFTP Service", self.hostname);
        self.send_message(&greeting).await?;

        let result = self.serve().await;
        match &result {
            Ok(()) => info!("{}: Ending connection", self.peer),
            Err(SessionError::ConnectionClosed) => {
                info!("{}: Connection was closed by client", self.peer)
            }
            Err(e) => error!("{}: Session aborted: {}", self.peer, e),
        }
        self.close().await;

        match result {
            Err(SessionError::ConnectionClosed) => Ok(()),
            other => other,
        }
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        let mut pending: Option<String> = None;

        while self.running {
            let line = match pending.take() {
                Some(line) => line,
                None => self.receive_message().await?,
            };
            // A nested wait may hand back a line it did not consume; it is dispatched next.
            pending = dispatch_command(self, &line).await?;
        }
        Ok(())
    }

    /// Reads one message. One read is assumed to carry exactly one command.
    pub async fn receive_message(&mut self) -> Result<String, SessionError> {
        let received = self.stream.read(&mut self.buffer).await?;
        if received == 0 {
            return Err(SessionError::ConnectionClosed);
        }

        let message = String::from_utf8_lossy(&self.buffer[..received])
            .trim_end_matches(['\0', '\r', '\n'])
            .to_string();
        debug!("{}: Received message {:?}", self.peer, message);
        Ok(message)
    }

    /// Sends `message` followed by the NUL terminator.
    pub async fn send_message(&mut self, message: &str) -> Result<(), SessionError> {
        debug!("{}: Sending {:?}", self.peer, message);
        let mut bytes = Vec::with_capacity(message.len() + 1);
        bytes.extend_from_slice(message.as_bytes());
        bytes.push(MESSAGE_TERMINATOR);
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// The raw byte stream, for file payloads.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Root-relative form of the working directory.
    pub fn display_working_dir(&self) -> String {
        self.sandbox.display(&self.working_dir)
    }

    pub async fn close(&mut self) {
        self.running = false;
        if let Err(e) = self.stream.shutdown().await {
            debug!("{}: Error shutting down stream: {}", self.peer, e);
        }
    }
}
