#![allow(missing_docs)]

//! Unauthenticated peer-to-peer money transfers over TCP.
//!
//! One connection carries exactly one `"<sender>:<amount>"` payload and is
//! closed by the sender. There is no acknowledgement and no authentication,
//! so this channel is not safe to expose to untrusted networks.

pub mod listener;
pub mod message;
pub mod sender;

pub use listener::{ListenerSettings, TransferEvent, TransferListener};
pub use message::{MessageError, TransferMessage};
pub use sender::{TransferReceipt, TransferSender};

/// Port used for transfers unless configured otherwise.
pub const DEFAULT_TRANSFER_PORT: u16 = 5050;
/// Bytes read from one inbound connection unless configured otherwise.
pub const DEFAULT_RECV_BUFFER: usize = 1024;
