use std::{future::Future, io, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream, ToSocketAddrs},
    sync::mpsc,
    time::timeout,
};
use tracing::{debug, info, warn};

use super::{
    message::{MessageError, TransferMessage},
    DEFAULT_RECV_BUFFER,
};
use crate::{config::AppConfig, session::GameSession};

/// Events emitted by the transfer listener.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// A peer credited the local balance.
    Received {
        peer: SocketAddr,
        sender: String,
        amount: f64,
        balance: f64,
    },
    /// A connection was dropped without crediting anything.
    Rejected { peer: SocketAddr, reason: String },
}

/// Per-connection limits applied by the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerSettings {
    pub buffer_size: usize,
    pub read_timeout: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_RECV_BUFFER,
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for ListenerSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            buffer_size: config.recv_buffer_size,
            read_timeout: config.read_timeout(),
        }
    }
}

#[derive(Debug, Error)]
enum ReceiveError {
    #[error("peer sent nothing within {0:?}")]
    Timeout(Duration),
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Accepts inbound transfers and credits them to the session.
///
/// Connections are handled one at a time inside the accept loop. A payload is
/// credited once the peer closes its side; a peer that keeps the socket open
/// is only credited when the read timeout expires, and holds up the
/// connections queued behind it until then.
pub struct TransferListener {
    listener: TcpListener,
    session: GameSession,
    settings: ListenerSettings,
}

impl TransferListener {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        session: GameSession,
        settings: ListenerSettings,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind transfer listener")?;
        Ok(Self {
            listener,
            session,
            settings,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read transfer listener address")
    }

    /// Accept transfers until the process exits.
    pub async fn run(self, events: mpsc::UnboundedSender<TransferEvent>) -> Result<()> {
        self.run_until(events, std::future::pending()).await
    }

    /// Accept transfers until `shutdown` resolves.
    pub async fn run_until(
        self,
        events: mpsc::UnboundedSender<TransferEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        info!("listening for incoming transfers on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    info!("transfer listener shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!("failed to accept transfer connection: {err}");
                        continue;
                    }
                },
            };

            let event = self.handle(stream, peer).await;
            if events.send(event).is_err() {
                debug!("transfer event receiver dropped");
            }
        }
    }

    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) -> TransferEvent {
        match self.receive(&mut stream).await {
            Ok(message) => {
                let balance = self.session.credit(message.amount);
                info!(
                    "received ${:.2} from {} ({peer}); new balance ${balance:.2}",
                    message.amount, message.sender
                );
                TransferEvent::Received {
                    peer,
                    sender: message.sender,
                    amount: message.amount,
                    balance,
                }
            }
            Err(err) => {
                warn!("rejected transfer from {peer}: {err}");
                TransferEvent::Rejected {
                    peer,
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Read until the peer closes or the buffer fills. A peer that stops
    /// sending without closing, or resets the connection after writing, gets
    /// whatever arrived before that.
    async fn receive(&self, stream: &mut TcpStream) -> Result<TransferMessage, ReceiveError> {
        let mut buffer = Vec::with_capacity(self.settings.buffer_size);
        let mut limited = stream.take(self.settings.buffer_size as u64);
        let outcome = timeout(self.settings.read_timeout, limited.read_to_end(&mut buffer)).await;
        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(err)) if buffer.is_empty() => return Err(err.into()),
            Ok(Err(err)) => debug!("read ended with {err}; using partial payload"),
            Err(_) if buffer.is_empty() => {
                return Err(ReceiveError::Timeout(self.settings.read_timeout));
            }
            Err(_) => debug!("peer kept the connection open; using partial payload"),
        }
        Ok(TransferMessage::decode(&buffer)?)
    }
}
