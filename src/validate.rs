//! Form-level checks run before anything is submitted.

use chrono::NaiveDate;
use thiserror::Error;

use crate::upi::Vpa;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("invalid mobile number '{0}'")]
    Phone(String),

    #[error("invalid email address '{0}'")]
    Email(String),

    #[error("invalid VPA '{0}'")]
    Vpa(String),

    #[error("start date {from} is after end date {to}")]
    DateRange { from: NaiveDate, to: NaiveDate },
}

pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

/// Indian mobile number: optional `+91`, then 10 digits starting with 6-9.
/// Returns the bare 10-digit number.
pub fn phone(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("+91")
        .map(str::trim_start)
        .unwrap_or(trimmed);

    let valid = digits.len() == 10
        && digits.bytes().all(|b| b.is_ascii_digit())
        && matches!(digits.as_bytes()[0], b'6'..=b'9');

    if !valid {
        return Err(ValidationError::Phone(value.to_string()));
    }
    Ok(digits.to_string())
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    let err = || ValidationError::Email(value.to_string());
    let trimmed = value.trim();
    let (local, domain) = trimmed.split_once('@').ok_or_else(err)?;

    if local.is_empty() || domain.contains('@') || trimmed.contains(char::is_whitespace) {
        return Err(err());
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(err());
    }
    Ok(())
}

pub fn vpa(value: &str) -> Result<Vpa, ValidationError> {
    value
        .parse()
        .map_err(|_| ValidationError::Vpa(value.to_string()))
}

pub fn date_range(from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
    if from > to {
        return Err(ValidationError::DateRange { from, to });
    }
    Ok(())
}
