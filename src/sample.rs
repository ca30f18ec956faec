//! Deterministic sample data for demos and benchmarks.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::Amount;
use crate::model::{MerchantId, Settlement, SettlementStatus, Transaction, TxId, TxStatus};

const PAYERS: &[&str] = &[
    "asha.k@oksbi",
    "ravi1987@ybl",
    "meera.s@okicici",
    "farhan@paytm",
    "deepa.n@okhdfcbank",
];
const REMARKS: &[&str] = &["Groceries", "Rent", "Tea", "Electricity bill", "Books", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("{days} day(s) from {start} fall outside the supported calendar")]
    DateOutOfRange { start: NaiveDate, days: u64 },
}

/// Generates sample transactions.
///
/// Statuses cycle so that roughly 80% succeed, with the rest spread over
/// pending, failed and deemed. Amounts and timestamps are derived from the
/// seed and the position, so the same seed always yields the same rows.
pub struct SampleTransactions {
    next_id: TxId,
    remaining: usize,
    payee: String,
    start: NaiveDateTime,
    state: u64,
}

impl SampleTransactions {
    pub fn new(count: usize, payee: &str, start: NaiveDate, seed: u64) -> Self {
        Self {
            next_id: 1,
            remaining: count,
            payee: payee.to_string(),
            start: start.and_hms_opt(9, 0, 0).unwrap_or_default(),
            state: seed,
        }
    }

    fn next_random(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }
}

impl Iterator for SampleTransactions {
    type Item = Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let id = self.next_id;
        self.next_id += 1;
        let r = self.next_random();

        let status = match id % 10 {
            3 => TxStatus::Failure,
            7 => TxStatus::Pending,
            _ if id % 25 == 0 => TxStatus::Deemed,
            _ => TxStatus::Success,
        };
        // 10.00 to 5009.99
        let amount = Amount::from_paise(1_000 + (r % 500_000) as i64);
        // roughly 37 minutes apart, saturating at the end of the calendar
        let timestamp = i64::try_from(id)
            .ok()
            .and_then(|id| id.checked_mul(37))
            .and_then(Duration::try_minutes)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(NaiveDateTime::MAX);

        Some(Transaction {
            id,
            timestamp,
            amount,
            status,
            payer: PAYERS[(r % PAYERS.len() as u64) as usize].to_string(),
            payee: self.payee.clone(),
            rrn: format!("{:012}", 400_000_000_000 + id * 7_919 + r % 1_000),
            remark: REMARKS[(id as usize) % REMARKS.len()].to_string(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SampleTransactions {}

/// One settlement per sub-merchant per day, T+1 after `start`. The last two
/// days are still pending or processing.
pub fn sample_settlements(
    start: NaiveDate,
    days: u32,
    merchants: &[MerchantId],
) -> Result<Vec<Settlement>, SampleError> {
    let out_of_range = || SampleError::DateOutOfRange {
        start,
        days: u64::from(days),
    };
    start
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(out_of_range)?;

    let mut rows = Vec::new();
    for day in 0..days {
        let date = start
            .checked_add_days(Days::new(u64::from(day) + 1))
            .ok_or_else(out_of_range)?;
        let status = match days - day {
            1 => SettlementStatus::Pending,
            2 => SettlementStatus::Processing,
            _ => SettlementStatus::Settled,
        };
        for &merchant in merchants {
            let tx_count = 20 + (day * 7 + merchant * 3) % 40;
            rows.push(Settlement {
                date,
                sub_merchant: merchant,
                tx_count,
                total: Amount::from_paise(i64::from(tx_count) * 35_000),
                status,
                utr: format!("UTR{}{merchant:03}{day:04}", date.format("%y%m%d")),
            });
        }
    }
    Ok(rows)
}
