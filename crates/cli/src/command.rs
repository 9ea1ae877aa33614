use std::str::FromStr;

use thiserror::Error;

/// Command list shown by help and unknown-command messages.
pub const COMMANDS: &str =
    "status, collect, upgrade [number], wait, save, send [recipient_ip] [amount], exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Collect,
    /// 1-based business position as typed by the player.
    Upgrade(usize),
    Wait,
    Save,
    Send { host: String, amount: f64 },
    Exit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Invalid upgrade command. Use 'upgrade [number]'.")]
    UpgradeUsage,
    #[error("Invalid send command. Use 'send [recipient_ip] [amount]'.")]
    SendUsage,
    #[error("Unknown command. Available commands: {}", COMMANDS)]
    Unknown(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_lowercase();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["status"] => Ok(Self::Status),
            ["collect"] => Ok(Self::Collect),
            ["wait"] => Ok(Self::Wait),
            ["save"] => Ok(Self::Save),
            ["exit"] => Ok(Self::Exit),
            ["upgrade", rest @ ..] => match rest {
                [position] => position
                    .parse()
                    .map(Self::Upgrade)
                    .map_err(|_| CommandError::UpgradeUsage),
                _ => Err(CommandError::UpgradeUsage),
            },
            ["send", rest @ ..] => match rest {
                [host, amount] => amount
                    .parse::<f64>()
                    .ok()
                    .filter(|amount| amount.is_finite())
                    .map(|amount| Self::Send {
                        host: host.to_string(),
                        amount,
                    })
                    .ok_or(CommandError::SendUsage),
                _ => Err(CommandError::SendUsage),
            },
            _ => Err(CommandError::Unknown(line.clone())),
        }
    }
}
