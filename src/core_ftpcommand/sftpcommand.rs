use std::fmt;

#[allow(clippy::upper_case_acronyms)]
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum SftpCommand {
    USER,
    ACCT,
    PASS,
    TYPE,
    LIST,
    CDIR,
    KILL,
    NAME,
    DONE,
    RETR,
    STOR,
}

impl SftpCommand {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(cmd: &str) -> Option<SftpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(SftpCommand::USER),
            "ACCT" => Some(SftpCommand::ACCT),
            "PASS" => Some(SftpCommand::PASS),
            "TYPE" => Some(SftpCommand::TYPE),
            "LIST" => Some(SftpCommand::LIST),
            "CDIR" => Some(SftpCommand::CDIR),
            "KILL" => Some(SftpCommand::KILL),
            "NAME" => Some(SftpCommand::NAME),
            "DONE" => Some(SftpCommand::DONE),
            "RETR" => Some(SftpCommand::RETR),
            "STOR" => Some(SftpCommand::STOR),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SftpCommand::USER => "USER",
            SftpCommand::ACCT => "ACCT",
            SftpCommand::PASS => "PASS",
            SftpCommand::TYPE => "TYPE",
            SftpCommand::LIST => "LIST",
            SftpCommand::CDIR => "CDIR",
            SftpCommand::KILL => "KILL",
            SftpCommand::NAME => "NAME",
            SftpCommand::DONE => "DONE",
            SftpCommand::RETR => "RETR",
            SftpCommand::STOR => "STOR",
        }
    }

    /// Identification commands and DONE work before login.
    pub fn requires_login(&self) -> bool {
        !matches!(
            self,
            SftpCommand::USER | SftpCommand::ACCT | SftpCommand::PASS | SftpCommand::DONE
        )
    }

    pub fn requires_arguments(&self) -> bool {
        !matches!(self, SftpCommand::DONE)
    }
}

impl fmt::Display for SftpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
