use crate::core_ftpcommand::handlers::CommandResult;
use crate::core_transfer::TransferType;
use crate::session::Session;
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handles the TYPE command.
///
/// `A` selects ASCII, `B` binary and `C` continuous mode for later transfers.
pub async fn handle_type_command<S>(session: &mut Session<S>, args: &[String]) -> CommandResult
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let response = match TransferType::from_code(&args[0]) {
        Some(transfer_type) => {
            session.transfer_type = transfer_type;
            info!("{}: Now using {} mode", session.peer, transfer_type.name());
            format!("+Using {} mode", transfer_type.name())
        }
        None => String::from("-Type not valid"),
    };

    session.send_message(&response).await?;
    Ok(None)
}
