#![warn(clippy::all, missing_docs)]

//! Core domain logic for the tycoon idle game.
//!
//! This crate hosts the business and ledger models, save-file persistence,
//! configuration handling and the peer-to-peer transfer channel used by
//! the command-line frontend.

pub mod business;
pub mod config;
pub mod error;
pub mod ledger;
pub mod save;
pub mod session;
pub mod transfer;

pub use business::{Business, BusinessInfo, BusinessRecord};
pub use config::AppConfig;
pub use error::{LedgerError, TransferError};
pub use ledger::{CollectReport, Ledger, Payout, StatusReport, UpgradeReceipt};
pub use save::{SaveManager, SaveRecord};
pub use session::GameSession;
pub use transfer::{TransferEvent, TransferListener, TransferMessage, TransferSender};
