//! Aggregates shown on the transaction summary, settlements and reports pages.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::Amount;
use crate::model::{MerchantId, Settlement, SettlementStatus, Transaction, TxStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("amount total overflowed while adding {amount}")]
    Overflow { amount: Amount },
}

/// Count and volume of one status bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bucket {
    pub count: usize,
    pub amount: Amount,
}

impl Bucket {
    fn add(&mut self, amount: Amount) -> Result<(), SummaryError> {
        self.amount = checked_add(self.amount, amount)?;
        self.count += 1;
        Ok(())
    }
}

fn checked_add(total: Amount, amount: Amount) -> Result<Amount, SummaryError> {
    total
        .checked_add(amount)
        .ok_or(SummaryError::Overflow { amount })
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxSummary {
    pub by_status: BTreeMap<TxStatus, Bucket>,
    pub total: Bucket,
}

impl TxSummary {
    pub fn from_transactions<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<Self, SummaryError> {
        let mut summary = TxSummary::default();
        for tx in transactions {
            summary.by_status.entry(tx.status).or_default().add(tx.amount)?;
            summary.total.add(tx.amount)?;
        }
        Ok(summary)
    }

    pub fn bucket(&self, status: TxStatus) -> Bucket {
        self.by_status.get(&status).copied().unwrap_or_default()
    }

    /// Share of successful transactions, `0.0` for an empty set.
    pub fn success_rate(&self) -> f64 {
        if self.total.count == 0 {
            return 0.0;
        }
        self.bucket(TxStatus::Success).count as f64 / self.total.count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementSummary {
    pub by_status: BTreeMap<SettlementStatus, Bucket>,
    pub transactions: u64,
}

impl SettlementSummary {
    pub fn from_settlements<'a>(
        settlements: impl IntoIterator<Item = &'a Settlement>,
    ) -> Result<Self, SummaryError> {
        let mut summary = SettlementSummary::default();
        for s in settlements {
            summary.by_status.entry(s.status).or_default().add(s.total)?;
            summary.transactions += u64::from(s.tx_count);
        }
        Ok(summary)
    }

    pub fn settled(&self) -> Amount {
        self.by_status
            .get(&SettlementStatus::Settled)
            .map(|b| b.amount)
            .unwrap_or_default()
    }

    /// Amount not yet credited (pending and processing).
    pub fn outstanding(&self) -> Result<Amount, SummaryError> {
        self.by_status
            .iter()
            .filter(|(status, _)| **status != SettlementStatus::Settled)
            .try_fold(Amount::ZERO, |acc, (_, b)| checked_add(acc, b.amount))
    }
}

/// Settlements of one sub-merchant, oldest first.
pub fn drill_down(settlements: &[Settlement], sub_merchant: MerchantId) -> Vec<&Settlement> {
    let mut rows: Vec<_> = settlements
        .iter()
        .filter(|s| s.sub_merchant == sub_merchant)
        .collect();
    rows.sort_by_key(|s| s.date);
    rows
}

/// Successful volume per day, the series behind the reports chart.
pub fn daily_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<BTreeMap<NaiveDate, Amount>, SummaryError> {
    let mut totals = BTreeMap::new();
    for tx in transactions {
        if tx.status == TxStatus::Success {
            let total: &mut Amount = totals.entry(tx.timestamp.date()).or_default();
            *total = checked_add(*total, tx.amount)?;
        }
    }
    Ok(totals)
}
