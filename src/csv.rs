use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::model::{
    AuditEntry, MerchantId, Settlement, SubMerchant, Transaction, TxId, TxStatus, UnknownStatus,
};
use crate::{Amount, amount::ParseAmountError};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRANSACTION_HEADER: &[&str] = &[
    "id", "timestamp", "amount", "status", "payer", "payee", "rrn", "remark",
];
const SETTLEMENT_HEADER: &[&str] = &["date", "sub_merchant", "tx_count", "total", "status", "utr"];
const SUB_MERCHANT_HEADER: &[&str] = &[
    "id",
    "name",
    "phone",
    "email",
    "vpa",
    "status",
    "per_transaction_limit",
    "daily_limit",
    "created",
];
const AUDIT_HEADER: &[&str] = &["id", "subject", "action", "actor", "timestamp", "description"];

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: u64, source: csv::Error },

    #[error("line {line}: {source}")]
    UnknownStatus { line: u64, source: UnknownStatus },

    #[error("line {line}: {source}")]
    InvalidAmount { line: u64, source: ParseAmountError },

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv output: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    id: TxId,
    timestamp: String,
    amount: String,
    status: String,
    payer: String,
    payee: String,
    #[serde(default)]
    rrn: String,
    #[serde(default)]
    remark: String,
}

impl TransactionRow {
    fn into_transaction(self, line: u64) -> Result<Transaction, CsvError> {
        let timestamp = NaiveDateTime::parse_from_str(self.timestamp.trim(), TIMESTAMP_FORMAT)
            .or_else(|_| {
                NaiveDate::parse_from_str(self.timestamp.trim(), "%Y-%m-%d")
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map_err(|_| CsvError::InvalidTimestamp {
                line,
                value: self.timestamp.clone(),
            })?;
        let amount: Amount = self
            .amount
            .parse()
            .map_err(|source| CsvError::InvalidAmount { line, source })?;
        let status: TxStatus = self
            .status
            .parse()
            .map_err(|source| CsvError::UnknownStatus { line, source })?;

        Ok(Transaction {
            id: self.id,
            timestamp,
            amount,
            status,
            payer: self.payer,
            payee: self.payee,
            rrn: self.rrn,
            remark: self.remark,
        })
    }
}

#[derive(Debug, Serialize)]
struct TransactionOut<'a> {
    id: TxId,
    timestamp: String,
    amount: Amount,
    status: TxStatus,
    payer: &'a str,
    payee: &'a str,
    rrn: &'a str,
    remark: &'a str,
}

#[derive(Debug, Serialize)]
struct SubMerchantOut<'a> {
    id: MerchantId,
    name: &'a str,
    phone: &'a str,
    email: &'a str,
    vpa: &'a str,
    status: &'static str,
    per_transaction_limit: Amount,
    daily_limit: Amount,
    created: NaiveDate,
}

#[derive(Debug, Serialize)]
struct AuditOut<'a> {
    id: u64,
    subject: MerchantId,
    action: &'a str,
    actor: &'a str,
    timestamp: String,
    description: &'a str,
}

/// Read transactions from a csv source with a header row.
///
/// Errors carry the line the offending record starts on, so rows with quoted
/// multi-line fields do not shift the numbers of later rows.
pub fn read_transactions_from<R: io::Read>(
    reader: R,
) -> impl Iterator<Item = Result<Transaction, CsvError>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut record = csv::StringRecord::new();

    std::iter::from_fn(move || match reader.read_record(&mut record) {
        Ok(false) => None,
        Ok(true) => {
            let line = record.position().map_or(0, csv::Position::line);
            let headers = reader.headers().ok();
            let result = record
                .deserialize::<TransactionRow>(headers)
                .map_err(|source| CsvError::Parse { line, source })
                .and_then(|row| row.into_transaction(line));
            Some(result)
        }
        Err(source) => {
            let line = source.position().map_or(0, csv::Position::line);
            Some(Err(CsvError::Parse { line, source }))
        }
    })
}

/// Read transactions from a csv file
pub fn read_transactions(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Transaction, CsvError>>, CsvError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CsvError::Open {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    Ok(read_transactions_from(file))
}

/// Header row first, then one row per record. No rows gives the header alone.
fn write_rows<W, T, I>(writer: W, header: &[&str], rows: I) -> Result<(), CsvError>
where
    W: io::Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_transactions<'a>(
    writer: impl io::Write,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<(), CsvError> {
    let rows = transactions.into_iter().map(|tx| TransactionOut {
        id: tx.id,
        timestamp: tx.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        amount: tx.amount,
        status: tx.status,
        payer: &tx.payer,
        payee: &tx.payee,
        rrn: &tx.rrn,
        remark: &tx.remark,
    });
    write_rows(writer, TRANSACTION_HEADER, rows)
}

pub fn write_settlements<'a>(
    writer: impl io::Write,
    settlements: impl IntoIterator<Item = &'a Settlement>,
) -> Result<(), CsvError> {
    write_rows(writer, SETTLEMENT_HEADER, settlements)
}

pub fn write_sub_merchants<'a>(
    writer: impl io::Write,
    merchants: impl IntoIterator<Item = &'a SubMerchant>,
) -> Result<(), CsvError> {
    let rows = merchants.into_iter().map(|m| SubMerchantOut {
        id: m.id,
        name: &m.name,
        phone: &m.contact.phone,
        email: &m.contact.email,
        vpa: m.vpa.as_str(),
        status: m.status.as_str(),
        per_transaction_limit: m.limits.per_transaction,
        daily_limit: m.limits.daily,
        created: m.created,
    });
    write_rows(writer, SUB_MERCHANT_HEADER, rows)
}

pub fn write_audit_log<'a>(
    writer: impl io::Write,
    entries: impl IntoIterator<Item = &'a AuditEntry>,
) -> Result<(), CsvError> {
    let rows = entries.into_iter().map(|e| AuditOut {
        id: e.id,
        subject: e.subject,
        action: &e.action,
        actor: &e.actor,
        timestamp: e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        description: &e.description,
    });
    write_rows(writer, AUDIT_HEADER, rows)
}
