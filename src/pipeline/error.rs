//! Error types for the filter pipeline.

use chrono::NaiveDate;
use thiserror::Error;

/// Invalid filter criteria, rejected before any record is looked at.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("date range is inverted: {from} is after {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    #[error("page size must be greater than zero")]
    ZeroPageSize,
}
