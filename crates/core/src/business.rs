//! Income-generating businesses.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Factor applied to base income on every upgrade.
pub const INCOME_GROWTH: f64 = 1.2;
/// Factor applied to the income interval on every upgrade.
pub const INTERVAL_DECAY: f64 = 0.9;

/// A single business owned by the player.
///
/// Income accrues all-or-nothing: once `income_interval` seconds have passed
/// since the last collection, a collection pays `base_income * level` and
/// restarts the timer. Collecting early pays nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    name: String,
    base_income: f64,
    income_interval: f64,
    level: u32,
    last_collected: DateTime<Utc>,
}

/// Display view of a business used by status reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessInfo {
    /// Business name.
    pub name: String,
    /// Current level.
    pub level: u32,
    /// Income per level paid out each interval.
    pub base_income: f64,
    /// Seconds between payouts.
    pub income_interval: f64,
}

/// Persisted form of a [`Business`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Business name.
    pub name: String,
    /// Income per level.
    pub base_income: f64,
    /// Seconds between payouts.
    pub income_interval: f64,
    /// Current level.
    pub level: u32,
    /// Unix timestamp in fractional seconds; absent means "now" on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_collected: Option<f64>,
}

impl Business {
    /// Create a level 1 business whose timer starts at `now`.
    pub fn new_at(
        name: impl Into<String>,
        base_income: f64,
        income_interval: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            base_income,
            income_interval,
            level: 1,
            last_collected: now,
        }
    }

    /// Unique name within the ledger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Income per level.
    pub fn base_income(&self) -> f64 {
        self.base_income
    }

    /// Seconds between payouts.
    pub fn income_interval(&self) -> f64 {
        self.income_interval
    }

    /// Current level, starting at 1.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// When income was last paid out.
    pub fn last_collected(&self) -> DateTime<Utc> {
        self.last_collected
    }

    /// Payout of a single collection at the current level.
    pub fn payout(&self) -> f64 {
        self.base_income * f64::from(self.level)
    }

    /// Collect income using the wall clock.
    pub fn collect_income(&mut self) -> f64 {
        self.collect_income_at(Utc::now())
    }

    /// Collect income as of `now`, returning 0 if the interval has not elapsed.
    pub fn collect_income_at(&mut self, now: DateTime<Utc>) -> f64 {
        if elapsed_secs(self.last_collected, now) >= self.income_interval {
            self.last_collected = now;
            self.payout()
        } else {
            0.0
        }
    }

    /// Level up: more income, shorter interval. Cost is charged by the ledger.
    pub fn upgrade(&mut self) {
        self.level += 1;
        self.income_interval *= INTERVAL_DECAY;
        self.base_income *= INCOME_GROWTH;
    }

    /// Snapshot for status output.
    pub fn info(&self) -> BusinessInfo {
        BusinessInfo {
            name: self.name.clone(),
            level: self.level,
            base_income: self.base_income,
            income_interval: self.income_interval,
        }
    }

    /// Persisted form of this business.
    pub fn to_record(&self) -> BusinessRecord {
        BusinessRecord {
            name: self.name.clone(),
            base_income: self.base_income,
            income_interval: self.income_interval,
            level: self.level,
            last_collected: Some(to_epoch_secs(self.last_collected)),
        }
    }

    /// Rebuild a business from its record, defaulting a missing timer to now.
    pub fn from_record(record: BusinessRecord) -> Result<Self, LedgerError> {
        Self::from_record_at(record, Utc::now())
    }

    /// Rebuild a business from its record, defaulting a missing timer to `now`.
    pub fn from_record_at(
        record: BusinessRecord,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let invalid = |reason| LedgerError::InvalidRecord {
            name: record.name.clone(),
            reason,
        };
        if !(record.base_income.is_finite() && record.base_income >= 0.0) {
            return Err(invalid("base_income must be a non-negative number"));
        }
        if !(record.income_interval.is_finite() && record.income_interval > 0.0) {
            return Err(invalid("income_interval must be positive"));
        }
        if record.level == 0 {
            return Err(invalid("level must be at least 1"));
        }
        let last_collected = match record.last_collected {
            Some(secs) => from_epoch_secs(secs)
                .ok_or_else(|| invalid("last_collected is out of range"))?,
            None => now,
        };

        Ok(Self {
            name: record.name,
            base_income: record.base_income,
            income_interval: record.income_interval,
            level: record.level,
            last_collected,
        })
    }
}

fn elapsed_secs(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now.signed_duration_since(since);
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None if delta > Duration::zero() => f64::INFINITY,
        None => f64::NEG_INFINITY,
    }
}

fn to_epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
    }

    #[test]
    fn collects_once_per_interval() {
        let mut stand = Business::new_at("Lemonade Stand", 10.0, 5.0, at(0));

        assert_eq!(stand.collect_income_at(at(4)), 0.0);
        assert_eq!(stand.last_collected(), at(0));

        assert_eq!(stand.collect_income_at(at(5)), 10.0);
        assert_eq!(stand.last_collected(), at(5));

        // The timer restarted, nothing is carried over.
        assert_eq!(stand.collect_income_at(at(9)), 0.0);
        assert_eq!(stand.collect_income_at(at(10)), 10.0);
    }

    #[test]
    fn long_idle_pays_a_single_interval() {
        let mut wash = Business::new_at("Car Wash", 200.0, 20.0, at(0));
        assert_eq!(wash.collect_income_at(at(3_600)), 200.0);
    }

    #[test]
    fn payout_scales_with_level() {
        let mut paper = Business::new_at("Newspaper Delivery", 50.0, 10.0, at(0));
        paper.upgrade();
        let expected = 50.0 * INCOME_GROWTH * 2.0;
        assert!((paper.collect_income_at(at(10)) - expected).abs() < 1e-9);
    }

    #[test]
    fn upgrades_compound() {
        let mut stand = Business::new_at("Lemonade Stand", 10.0, 5.0, at(0));
        for _ in 0..4 {
            stand.upgrade();
        }
        assert_eq!(stand.level(), 5);
        assert!((stand.base_income() - 10.0 * 1.2_f64.powi(4)).abs() < 1e-9);
        assert!((stand.income_interval() - 5.0 * 0.9_f64.powi(4)).abs() < 1e-9);
    }

    #[test]
    fn record_round_trip_keeps_every_field() -> Result<(), LedgerError> {
        let mut stand = Business::new_at("Lemonade Stand", 10.0, 5.0, at(0));
        stand.upgrade();
        stand.collect_income_at(at(7));

        let record = stand.to_record();
        let restored = Business::from_record(record.clone())?;
        assert_eq!(restored, stand);
        assert_eq!(restored.to_record(), record);
        Ok(())
    }

    #[test]
    fn missing_timer_defaults_to_now() -> Result<(), LedgerError> {
        let record: BusinessRecord = serde_json::from_str(
            r#"{"name": "Car Wash", "base_income": 200, "income_interval": 20, "level": 1}"#,
        )
        .expect("record parses");
        let business = Business::from_record_at(record, at(42))?;
        assert_eq!(business.last_collected(), at(42));
        assert_eq!(business.base_income(), 200.0);
        Ok(())
    }

    #[test]
    fn rejects_records_breaking_invariants() {
        let record = BusinessRecord {
            name: "Broken".to_string(),
            base_income: 10.0,
            income_interval: 0.0,
            level: 1,
            last_collected: None,
        };
        assert!(matches!(
            Business::from_record(record),
            Err(LedgerError::InvalidRecord { .. })
        ));
    }
}
