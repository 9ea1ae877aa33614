use std::time::Duration;

use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};
use tracing::{debug, info};

use super::message::TransferMessage;
use crate::{config::AppConfig, error::TransferError, session::GameSession};

/// Outcome of a delivered transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// `host:port` the payload was written to.
    pub peer: String,
    pub amount: f64,
    /// Local balance after the debit.
    pub balance: f64,
}

/// Sends money to peers and debits the local balance.
#[derive(Clone)]
pub struct TransferSender {
    session: GameSession,
    port: u16,
    connect_timeout: Duration,
}

impl TransferSender {
    /// Sender targeting `port` on every peer.
    pub fn new(session: GameSession, port: u16, connect_timeout: Duration) -> Self {
        Self {
            session,
            port,
            connect_timeout,
        }
    }

    /// Sender using the configured transfer port and connect timeout.
    pub fn from_config(session: GameSession, config: &AppConfig) -> Self {
        Self::new(session, config.transfer_port, config.connect_timeout())
    }

    /// Send `amount` to the listener at `host`.
    ///
    /// The balance is only debited once the payload has been written; no
    /// acknowledgement is awaited. Any failure leaves the balance untouched.
    pub async fn send(&self, host: &str, amount: f64) -> Result<TransferReceipt, TransferError> {
        let (username, balance) = self
            .session
            .with_ledger(|ledger| (ledger.username().to_string(), ledger.balance()));
        if amount > balance {
            return Err(TransferError::InsufficientFunds { amount, balance });
        }

        let peer = format!("{host}:{}", self.port);
        let message = TransferMessage::new(username, amount);

        let connect = TcpStream::connect((host, self.port));
        let mut stream = match timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransferError::Connect { peer, source }),
            Err(_) => {
                return Err(TransferError::ConnectTimeout {
                    peer,
                    secs: self.connect_timeout.as_secs(),
                })
            }
        };
        if let Err(source) = stream.write_all(&message.encode()).await {
            return Err(TransferError::Write { peer, source });
        }
        if let Err(err) = stream.shutdown().await {
            debug!("closing transfer connection to {peer} failed: {err}");
        }

        let balance = self.session.debit(amount);
        info!("sent ${amount:.2} to {peer}; remaining balance ${balance:.2}");
        Ok(TransferReceipt {
            peer,
            amount,
            balance,
        })
    }
}
