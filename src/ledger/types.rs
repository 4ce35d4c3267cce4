use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bonus::NormalizedResult;
use crate::grading::Tier;

pub const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusLedger {
    pub version: u32,
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub records: BTreeMap<u64, BonusRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRecord {
    pub user: Option<String>,
    pub child: Option<String>,
    pub subject: String,
    pub tier: Tier,
    pub normalized: f64,
    pub bonus: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl BonusRecord {
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    fn belongs_to(&self, child: Option<&str>) -> bool {
        child.is_none() || self.child.as_deref() == child
    }
}

impl Default for BonusLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BonusLedger {
    /// Create a new empty ledger with the current version
    pub fn new() -> Self {
        Self {
            version: LEDGER_VERSION,
            next_id: 1,
            records: BTreeMap::new(),
        }
    }

    /// Store a calculated bonus as an unsettled record and return its id
    pub fn record(
        &mut self,
        user: Option<&str>,
        child: Option<&str>,
        result: &NormalizedResult,
        recorded_at: DateTime<Utc>,
    ) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.records.insert(
            id,
            BonusRecord {
                user: user.map(str::to_string),
                child: child.map(str::to_string),
                subject: result.subject.clone(),
                tier: result.tier,
                normalized: result.normalized,
                bonus: result.bonus,
                recorded_at,
                settled_at: None,
            },
        );
        id
    }

    /// Mark a record as settled. Returns false if the id is unknown or the
    /// record was already settled.
    pub fn settle(&mut self, id: u64, at: DateTime<Utc>) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if !record.is_settled() => {
                record.settled_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Settle every open record, optionally only those of one child.
    /// Returns how many records were settled.
    pub fn settle_all(&mut self, child: Option<&str>, at: DateTime<Utc>) -> usize {
        let mut count = 0;
        for record in self.records.values_mut() {
            if !record.is_settled() && record.belongs_to(child) {
                record.settled_at = Some(at);
                count += 1;
            }
        }
        count
    }

    /// Sum of bonuses not yet settled
    pub fn unsettled_total(&self, child: Option<&str>) -> Decimal {
        self.unsettled(child).map(|(_, record)| record.bonus).sum()
    }

    pub fn unsettled<'a>(
        &'a self,
        child: Option<&'a str>,
    ) -> impl Iterator<Item = (u64, &'a BonusRecord)> + 'a {
        self.records
            .iter()
            .filter(move |(_, record)| !record.is_settled() && record.belongs_to(child))
            .map(|(id, record)| (*id, record))
    }

    pub fn records(&self) -> &BTreeMap<u64, BonusRecord> {
        &self.records
    }
}
