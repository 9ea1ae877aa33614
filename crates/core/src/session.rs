#![allow(missing_docs)]

//! Shared handle to the running game.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use crate::{
    error::LedgerError,
    ledger::{CollectReport, Ledger, StatusReport, UpgradeReceipt},
    save::SaveManager,
};

/// Thread-safe game session shared by the command loop and the transfer listener.
///
/// Every ledger access goes through one mutex. The lock is only held inside
/// these synchronous methods, never across an await point.
#[derive(Clone)]
pub struct GameSession {
    inner: Arc<Inner>,
}

struct Inner {
    ledger: Mutex<Ledger>,
    saves: SaveManager,
}

impl GameSession {
    /// Wrap a ledger together with the save file it belongs to.
    pub fn new(ledger: Ledger, saves: SaveManager) -> Self {
        Self {
            inner: Arc::new(Inner {
                ledger: Mutex::new(ledger),
                saves,
            }),
        }
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut Ledger) -> R) -> R {
        let mut ledger = self.inner.ledger.lock();
        f(&mut ledger)
    }

    /// Clone of the current ledger state.
    pub fn snapshot(&self) -> Ledger {
        self.inner.ledger.lock().clone()
    }

    pub fn username(&self) -> String {
        self.inner.ledger.lock().username().to_string()
    }

    pub fn balance(&self) -> f64 {
        self.inner.ledger.lock().balance()
    }

    pub fn status(&self) -> StatusReport {
        self.inner.ledger.lock().status()
    }

    pub fn collect(&self) -> CollectReport {
        self.inner.ledger.lock().collect_all_income()
    }

    /// Upgrade the business at `index` (0-based).
    pub fn upgrade(&self, index: usize) -> Result<UpgradeReceipt, LedgerError> {
        self.inner.ledger.lock().upgrade_business(index)
    }

    /// Credit the balance, returning the new balance.
    pub fn credit(&self, amount: f64) -> f64 {
        self.inner.ledger.lock().credit(amount)
    }

    /// Debit the balance, returning the new balance.
    pub fn debit(&self, amount: f64) -> f64 {
        self.inner.ledger.lock().debit(amount)
    }

    /// Write the current state to the save file.
    ///
    /// The record is captured under the lock and written after releasing it.
    pub fn save(&self) -> Result<()> {
        let record = self.inner.ledger.lock().to_record();
        self.inner.saves.persist(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn concurrent_credits_are_not_lost() {
        let session = GameSession::new(Ledger::new_game("alice"), SaveManager::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        session.credit(1.0);
                    }
                })
            })
            .collect();
        for _ in 0..1_000 {
            session.debit(1.0);
        }
        for handle in handles {
            handle.join().expect("credit thread panicked");
        }

        assert_eq!(session.balance(), 100.0 + 8_000.0 - 1_000.0);
    }

    #[test]
    fn save_writes_current_state() -> Result<()> {
        let dir = tempdir()?;
        let saves = SaveManager::new(dir.path().join("save.json"));
        let session = GameSession::new(Ledger::new_game("alice"), saves.clone());

        session.upgrade(0)?;
        session.save()?;

        let loaded = saves.load()?.expect("expected a saved ledger");
        assert_eq!(loaded.balance(), 50.0);
        assert_eq!(loaded.businesses()[0].level(), 2);
        assert_eq!(loaded.to_record(), session.snapshot().to_record());
        Ok(())
    }
}
