//! Domain errors surfaced to the command loop.

use std::io;

use thiserror::Error;

/// Failures raised by ledger bookkeeping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The requested business position does not exist.
    #[error("invalid business choice {position}; {count} businesses owned")]
    InvalidBusiness {
        /// 1-based position as the player typed it.
        position: usize,
        /// Number of businesses in the ledger.
        count: usize,
    },
    /// The balance does not cover the upgrade cost.
    #[error("not enough balance to upgrade {name}; upgrade cost: ${cost:.2}")]
    InsufficientFunds {
        /// Business that was to be upgraded.
        name: String,
        /// Cost evaluated at the pre-upgrade level.
        cost: f64,
        /// Balance at the time of the attempt.
        balance: f64,
    },
    /// A persisted business record violates the business invariants.
    #[error("business record '{name}' is invalid: {reason}")]
    InvalidRecord {
        /// Name stored in the record.
        name: String,
        /// Violated invariant.
        reason: &'static str,
    },
}

/// Failures raised while sending money to a peer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The amount exceeds the local balance.
    #[error("insufficient balance to send ${amount:.2}; balance is ${balance:.2}")]
    InsufficientFunds {
        /// Requested amount.
        amount: f64,
        /// Balance at the time of the attempt.
        balance: f64,
    },
    /// The peer could not be reached.
    #[error("failed to connect to {peer}")]
    Connect {
        /// `host:port` of the peer.
        peer: String,
        /// Underlying socket error.
        source: io::Error,
    },
    /// The peer did not accept the connection in time.
    #[error("connection to {peer} timed out after {secs}s")]
    ConnectTimeout {
        /// `host:port` of the peer.
        peer: String,
        /// Configured connect timeout.
        secs: u64,
    },
    /// The payload could not be written.
    #[error("failed to deliver transfer to {peer}")]
    Write {
        /// `host:port` of the peer.
        peer: String,
        /// Underlying socket error.
        source: io::Error,
    },
}
