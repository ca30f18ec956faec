//! UPI payment addresses and `upi://pay` deep links for QR codes.
//!
//! A static QR carries only the payee address and name; the payer enters the
//! amount. A dynamic QR also fixes the amount and usually a note.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::Amount;

const SCHEME: &str = "upi://pay?";
const CURRENCY: &str = "INR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpiError {
    #[error("invalid VPA '{0}': expected handle@bank")]
    InvalidVpa(String),

    #[error("dynamic QR amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("payee name is empty")]
    EmptyName,

    #[error("not a upi://pay link: '{0}'")]
    NotUpiLink(String),

    #[error("link is missing the '{0}' parameter")]
    MissingParam(&'static str),

    #[error("malformed '{param}' parameter: {reason}")]
    MalformedParam { param: &'static str, reason: String },

    #[error("unsupported currency '{0}', only INR links are accepted")]
    UnsupportedCurrency(String),
}

/// Virtual payment address in `handle@bank` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vpa(String);

impl Vpa {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn handle(&self) -> &str {
        self.0.split_once('@').map(|(h, _)| h).unwrap_or_default()
    }

    pub fn bank(&self) -> &str {
        self.0.split_once('@').map(|(_, b)| b).unwrap_or_default()
    }

    /// Whether both name the same account; addresses are case-insensitive.
    pub fn same_address(&self, other: &Vpa) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl FromStr for Vpa {
    type Err = UpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || UpiError::InvalidVpa(s.to_string());
        let (handle, bank) = s.split_once('@').ok_or_else(invalid)?;

        let handle_ok = (2..=256).contains(&handle.len())
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        let bank_ok =
            (2..=64).contains(&bank.len()) && bank.chars().all(|c| c.is_ascii_alphanumeric());

        if !handle_ok || !bank_ok {
            return Err(invalid());
        }
        Ok(Vpa(s.to_string()))
    }
}

impl fmt::Display for Vpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Vpa {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Vpa {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrKind {
    Static,
    Dynamic,
}

/// Payment request encoded into a QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    payee: Vpa,
    name: String,
    amount: Option<Amount>,
    reference: Option<String>,
    note: Option<String>,
}

impl DeepLink {
    /// Static QR: payee address and display name only.
    pub fn fixed(payee: Vpa, name: impl Into<String>) -> Result<Self, UpiError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UpiError::EmptyName);
        }
        Ok(Self {
            payee,
            name,
            amount: None,
            reference: None,
            note: None,
        })
    }

    /// Fix the amount, turning the link into a dynamic QR.
    pub fn with_amount(mut self, amount: Amount) -> Result<Self, UpiError> {
        if !amount.is_positive() {
            return Err(UpiError::NonPositiveAmount(amount));
        }
        self.amount = Some(amount);
        Ok(self)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = (!note.is_empty()).then_some(note);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        self.reference = (!reference.is_empty()).then_some(reference);
        self
    }

    pub fn payee(&self) -> &Vpa {
        &self.payee
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn kind(&self) -> QrKind {
        if self.amount.is_some() {
            QrKind::Dynamic
        } else {
            QrKind::Static
        }
    }

    /// Read a `upi://pay?...` link back. Unknown parameters are ignored.
    pub fn parse(link: &str) -> Result<Self, UpiError> {
        let query = link
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| UpiError::NotUpiLink(link.to_string()))?;

        let mut pa = None;
        let mut pn = None;
        let mut am = None;
        let mut tr = None;
        let mut tn = None;
        let mut cu = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let slot = match key {
                "pa" => &mut pa,
                "pn" => &mut pn,
                "am" => &mut am,
                "tr" => &mut tr,
                "tn" => &mut tn,
                "cu" => &mut cu,
                _ => continue,
            };
            *slot = Some(decode(raw).ok_or_else(|| UpiError::MalformedParam {
                param: param_name(key),
                reason: "bad percent escape".to_string(),
            })?);
        }

        if let Some(cu) = cu {
            if cu != CURRENCY {
                return Err(UpiError::UnsupportedCurrency(cu));
            }
        }

        let payee: Vpa = pa.ok_or(UpiError::MissingParam("pa"))?.parse()?;
        let mut link = DeepLink::fixed(payee, pn.ok_or(UpiError::MissingParam("pn"))?)?;
        if let Some(am) = am {
            let amount = am.parse().map_err(|e: crate::amount::ParseAmountError| {
                UpiError::MalformedParam {
                    param: "am",
                    reason: e.to_string(),
                }
            })?;
            link = link.with_amount(amount)?;
        }
        if let Some(tr) = tr {
            link = link.with_reference(tr);
        }
        if let Some(tn) = tn {
            link = link.with_note(tn);
        }
        Ok(link)
    }
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}pa={}", encode(self.payee.as_str()))?;
        write!(f, "&pn={}", encode(&self.name))?;
        if let Some(amount) = self.amount {
            write!(f, "&am={amount}")?;
        }
        if let Some(reference) = &self.reference {
            write!(f, "&tr={}", encode(reference))?;
        }
        if let Some(note) = &self.note {
            write!(f, "&tn={}", encode(note))?;
        }
        write!(f, "&cu={CURRENCY}")
    }
}

fn param_name(key: &str) -> &'static str {
    match key {
        "pa" => "pa",
        "pn" => "pn",
        "am" => "am",
        "tr" => "tr",
        "tn" => "tn",
        _ => "cu",
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set, keeping `@`.
fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'@' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let high = hex_digit(*bytes.get(i + 1)?)?;
                let low = hex_digit(*bytes.get(i + 2)?)?;
                out.push((high << 4) | low);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
