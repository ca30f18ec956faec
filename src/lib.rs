pub mod amount;
pub mod config;
pub mod csv;
pub mod merchant;
pub mod model;
pub mod otp;
pub mod pipeline;
pub mod sample;
pub mod summary;
pub mod upi;
pub mod validate;

pub use amount::Amount;
pub use merchant::SubMerchantRegistry;
pub use model::{MerchantId, Settlement, SubMerchant, Transaction, TxId, TxStatus};
pub use pipeline::{Direction, Filter, Page, Query, SortField};
pub use upi::{DeepLink, Vpa};

use thiserror::Error;

/// Any failure surfaced to the command line.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Amount(#[from] amount::ParseAmountError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Csv(#[from] crate::csv::CsvError),

    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),

    #[error(transparent)]
    Upi(#[from] upi::UpiError),

    #[error(transparent)]
    Merchant(#[from] merchant::MerchantError),

    #[error(transparent)]
    Otp(#[from] otp::OtpError),

    #[error(transparent)]
    Summary(#[from] summary::SummaryError),

    #[error(transparent)]
    Sample(#[from] sample::SampleError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}
