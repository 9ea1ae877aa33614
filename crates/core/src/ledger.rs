//! Player ledger: balance plus the ordered set of owned businesses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    business::{Business, BusinessInfo},
    error::LedgerError,
    save::SaveRecord,
};

/// Balance a new game starts with.
pub const STARTING_BALANCE: f64 = 100.0;
/// Upgrade cost per pre-upgrade level.
pub const UPGRADE_COST_PER_LEVEL: f64 = 50.0;

/// Businesses seeded into every new game: name, base income, interval seconds.
pub const STARTER_BUSINESSES: [(&str, f64, f64); 3] = [
    ("Lemonade Stand", 10.0, 5.0),
    ("Newspaper Delivery", 50.0, 10.0),
    ("Car Wash", 200.0, 20.0),
];

/// In-memory game state for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    username: String,
    balance: f64,
    businesses: Vec<Business>,
}

/// A single business payout within a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    /// Business that paid out.
    pub name: String,
    /// Amount credited.
    pub amount: f64,
}

/// Result of collecting income across all businesses.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollectReport {
    /// Businesses that paid out, in ledger order.
    pub payouts: Vec<Payout>,
    /// Sum credited to the balance.
    pub total: f64,
    /// Balance after the credit.
    pub balance: f64,
}

/// Result of a paid upgrade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeReceipt {
    /// Upgraded business.
    pub name: String,
    /// Level reached.
    pub level: u32,
    /// Amount debited.
    pub cost: f64,
    /// Balance after the debit.
    pub balance: f64,
}

/// Snapshot rendered by the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Player name.
    pub username: String,
    /// Current balance.
    pub balance: f64,
    /// Business views in ledger order.
    pub businesses: Vec<BusinessInfo>,
}

impl Ledger {
    /// Start a fresh game with the starter businesses and balance.
    pub fn new_game(username: impl Into<String>) -> Self {
        Self::new_game_at(username, Utc::now())
    }

    /// Start a fresh game whose business timers begin at `now`.
    pub fn new_game_at(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        let businesses = STARTER_BUSINESSES
            .iter()
            .map(|(name, income, interval)| Business::new_at(*name, *income, *interval, now))
            .collect();
        Self {
            username: username.into(),
            balance: STARTING_BALANCE,
            businesses,
        }
    }

    /// Assemble a ledger from already-built parts.
    pub fn from_parts(username: impl Into<String>, balance: f64, businesses: Vec<Business>) -> Self {
        Self {
            username: username.into(),
            balance,
            businesses,
        }
    }

    /// Player name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Current balance. May be negative.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Owned businesses in order.
    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    /// Collect income from every business using the wall clock.
    pub fn collect_all_income(&mut self) -> CollectReport {
        self.collect_all_income_at(Utc::now())
    }

    /// Collect income from every business as of `now` and credit the sum.
    pub fn collect_all_income_at(&mut self, now: DateTime<Utc>) -> CollectReport {
        let mut report = CollectReport::default();
        for business in &mut self.businesses {
            let amount = business.collect_income_at(now);
            report.total += amount;
            if amount > 0.0 {
                report.payouts.push(Payout {
                    name: business.name().to_string(),
                    amount,
                });
            }
        }
        self.balance += report.total;
        report.balance = self.balance;
        debug!(total = report.total, balance = self.balance, "collected income");
        report
    }

    /// Upgrade cost for the business at `index` (0-based), if it exists.
    pub fn upgrade_cost(&self, index: usize) -> Option<f64> {
        self.businesses
            .get(index)
            .map(|business| f64::from(business.level()) * UPGRADE_COST_PER_LEVEL)
    }

    /// Pay for and apply an upgrade to the business at `index` (0-based).
    ///
    /// Leaves the ledger untouched when the index is out of range or the
    /// balance does not cover `level * 50`.
    pub fn upgrade_business(&mut self, index: usize) -> Result<UpgradeReceipt, LedgerError> {
        let count = self.businesses.len();
        let cost = self
            .upgrade_cost(index)
            .ok_or(LedgerError::InvalidBusiness {
                position: index.saturating_add(1),
                count,
            })?;
        let business = &mut self.businesses[index];
        if self.balance < cost {
            return Err(LedgerError::InsufficientFunds {
                name: business.name().to_string(),
                cost,
                balance: self.balance,
            });
        }

        self.balance -= cost;
        business.upgrade();
        debug!(business = business.name(), level = business.level(), cost, "upgraded business");
        Ok(UpgradeReceipt {
            name: business.name().to_string(),
            level: business.level(),
            cost,
            balance: self.balance,
        })
    }

    /// Add `amount` to the balance and return the new balance.
    pub fn credit(&mut self, amount: f64) -> f64 {
        self.balance += amount;
        self.balance
    }

    /// Subtract `amount` from the balance and return the new balance.
    pub fn debit(&mut self, amount: f64) -> f64 {
        self.balance -= amount;
        self.balance
    }

    /// Snapshot for display.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            username: self.username.clone(),
            balance: self.balance,
            businesses: self.businesses.iter().map(Business::info).collect(),
        }
    }

    /// Persisted form of the whole ledger.
    pub fn to_record(&self) -> SaveRecord {
        SaveRecord {
            username: self.username.clone(),
            balance: self.balance,
            businesses: self.businesses.iter().map(Business::to_record).collect(),
        }
    }

    /// Rebuild a ledger from its persisted form.
    pub fn from_record(record: SaveRecord) -> Result<Self, LedgerError> {
        let now = Utc::now();
        let businesses = record
            .businesses
            .into_iter()
            .map(|business| Business::from_record_at(business, now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_parts(record.username, record.balance, businesses))
    }
}
