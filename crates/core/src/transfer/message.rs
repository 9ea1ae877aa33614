use std::{fmt, str::FromStr};

use thiserror::Error;

/// One-shot peer transfer payload, `"<sender>:<amount>"` on the wire.
///
/// The sender name is self-reported and the amount is not range checked.
/// Anyone able to reach the listener can credit any amount.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMessage {
    pub sender: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageError {
    #[error("empty payload")]
    Empty,
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
    #[error("payload '{0}' has no ':' separator")]
    MissingSeparator(String),
    #[error("amount '{0}' is not a number")]
    InvalidAmount(String),
}

impl TransferMessage {
    pub fn new(sender: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            amount,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.is_empty() {
            return Err(MessageError::Empty);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| MessageError::InvalidUtf8)?;
        text.parse()
    }
}

impl fmt::Display for TransferMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sender, self.amount)
    }
}

impl FromStr for TransferMessage {
    type Err = MessageError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err(MessageError::Empty);
        }
        let (sender, raw_amount) = text
            .split_once(':')
            .ok_or_else(|| MessageError::MissingSeparator(text.to_string()))?;
        let amount = raw_amount
            .trim()
            .parse::<f64>()
            .ok()
            // NaN or infinity would poison the balance and the save file.
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| MessageError::InvalidAmount(raw_amount.to_string()))?;
        Ok(Self::new(sender, amount))
    }
}
