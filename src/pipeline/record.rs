use std::borrow::Cow;
use std::hash::Hash;

use chrono::{NaiveDate, NaiveDateTime};

use crate::Amount;
use crate::model::{
    Dispute, DisputeStatus, Refund, RefundStatus, Settlement, SettlementStatus, SubMerchant,
    SubMerchantStatus, Ticket, TicketStatus, Transaction, TxStatus,
};

/// A row that a list page can search, filter by status, bound by date and sort.
pub trait Record {
    type Status: Copy + Eq + Hash;

    /// Fields matched by the free-text search box.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    fn status(&self) -> Self::Status;

    fn timestamp(&self) -> NaiveDateTime;

    /// Day used by the date-range filter.
    fn date(&self) -> NaiveDate {
        self.timestamp().date()
    }

    /// `None` for rows that carry no amount; those sort first.
    fn amount(&self) -> Option<Amount>;
}

impl Record for Transaction {
    type Status = TxStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(self.id.to_string()),
            Cow::from(&self.payer),
            Cow::from(&self.payee),
            Cow::from(&self.rrn),
            Cow::from(&self.remark),
        ]
    }

    fn status(&self) -> TxStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    fn amount(&self) -> Option<Amount> {
        Some(self.amount)
    }
}

impl Record for Settlement {
    type Status = SettlementStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(&self.utr),
            Cow::from(self.sub_merchant.to_string()),
        ]
    }

    fn status(&self) -> SettlementStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(chrono::NaiveTime::MIN)
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> Option<Amount> {
        Some(self.total)
    }
}

impl Record for SubMerchant {
    type Status = SubMerchantStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(self.id.to_string()),
            Cow::from(&self.name),
            Cow::from(self.vpa.as_str()),
            Cow::from(&self.contact.phone),
            Cow::from(&self.contact.email),
        ]
    }

    fn status(&self) -> SubMerchantStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.created.and_time(chrono::NaiveTime::MIN)
    }

    fn date(&self) -> NaiveDate {
        self.created
    }

    fn amount(&self) -> Option<Amount> {
        Some(self.limits.daily)
    }
}

impl Record for Refund {
    type Status = RefundStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(&self.id),
            Cow::from(self.tx.to_string()),
            Cow::from(&self.reason),
        ]
    }

    fn status(&self) -> RefundStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.requested
    }

    fn amount(&self) -> Option<Amount> {
        Some(self.amount)
    }
}

impl Record for Dispute {
    type Status = DisputeStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::from(&self.id),
            Cow::from(self.tx.to_string()),
            Cow::from(&self.reason),
        ]
    }

    fn status(&self) -> DisputeStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.raised
    }

    fn amount(&self) -> Option<Amount> {
        Some(self.amount)
    }
}

impl Record for Ticket {
    type Status = TicketStatus;

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::from(self.id.as_str()), Cow::from(self.subject.as_str())];
        if let Some(rrn) = &self.rrn {
            fields.push(Cow::from(rrn.as_str()));
        }
        fields
    }

    fn status(&self) -> TicketStatus {
        self.status
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.opened
    }

    fn amount(&self) -> Option<Amount> {
        None
    }
}
