//! Core record types shown by the dashboard pages.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;
use crate::upi::Vpa;

/// Transaction identifier.
pub type TxId = u64;

/// Sub-merchant identifier.
pub type MerchantId = u32;

/// Returned when a status label is not one of the known values.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed status enum with a fixed wire label per variant.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownStatus {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

status_enum! {
    /// Outcome of a UPI transaction as reported by the network. `Deemed` means
    /// debited at the payer bank with the credit not yet confirmed.
    TxStatus, "transaction status" {
        Success => "SUCCESS",
        Pending => "PENDING",
        Failure => "FAILURE",
        Deemed => "DEEMED",
    }
}

status_enum! {
    SettlementStatus, "settlement status" {
        Settled => "settled",
        Pending => "pending",
        Processing => "processing",
    }
}

status_enum! {
    SubMerchantStatus, "sub-merchant status" {
        Active => "Active",
        Suspended => "Suspended",
        Revoked => "Revoked",
    }
}

status_enum! {
    RefundStatus, "refund status" {
        Initiated => "Initiated",
        Processing => "Processing",
        Completed => "Completed",
        Failed => "Failed",
    }
}

status_enum! {
    DisputeStatus, "dispute status" {
        Open => "Open",
        UnderReview => "Under Review",
        Resolved => "Resolved",
        Rejected => "Rejected",
    }
}

status_enum! {
    TicketStatus, "ticket status" {
        Open => "Open",
        InProgress => "In Progress",
        Resolved => "Resolved",
        Closed => "Closed",
    }
}

/// A collected UPI payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub timestamp: NaiveDateTime,
    pub amount: Amount,
    pub status: TxStatus,
    pub payer: String,
    pub payee: String,
    /// Retrieval reference number assigned by the network.
    pub rrn: String,
    pub remark: String,
}

/// One settlement batch credited to a merchant bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub date: NaiveDate,
    pub sub_merchant: MerchantId,
    pub tx_count: u32,
    pub total: Amount,
    pub status: SettlementStatus,
    pub utr: String,
}

/// Per-transaction and daily caps of a sub-merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLimits {
    pub per_transaction: Amount,
    pub daily: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMerchant {
    pub id: MerchantId,
    pub name: String,
    pub contact: Contact,
    pub vpa: Vpa,
    pub status: SubMerchantStatus,
    pub limits: TxLimits,
    pub created: NaiveDate,
}

/// A single line of the sub-merchant audit trail. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub subject: MerchantId,
    pub action: String,
    pub actor: String,
    pub timestamp: NaiveDateTime,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub at: NaiveDateTime,
    pub label: String,
    pub note: String,
}

impl TimelineEvent {
    pub fn new(at: NaiveDateTime, label: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            at,
            label: label.into(),
            note: note.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub tx: TxId,
    pub amount: Amount,
    pub reason: String,
    pub status: RefundStatus,
    pub requested: NaiveDateTime,
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub tx: TxId,
    pub amount: Amount,
    pub reason: String,
    pub status: DisputeStatus,
    pub raised: NaiveDateTime,
    pub timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub rrn: Option<String>,
    pub status: TicketStatus,
    pub opened: NaiveDateTime,
    pub timeline: Vec<TimelineEvent>,
}

impl Refund {
    /// Append a timeline event and move the refund to `status`.
    pub fn push_event(&mut self, status: RefundStatus, event: TimelineEvent) {
        self.status = status;
        self.timeline.push(event);
    }
}

impl Dispute {
    pub fn push_event(&mut self, status: DisputeStatus, event: TimelineEvent) {
        self.status = status;
        self.timeline.push(event);
    }
}

impl Ticket {
    pub fn push_event(&mut self, status: TicketStatus, event: TimelineEvent) {
        self.status = status;
        self.timeline.push(event);
    }
}
