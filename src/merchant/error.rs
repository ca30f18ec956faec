//! Error types for sub-merchant administration.

use thiserror::Error;

use crate::Amount;
use crate::model::{MerchantId, SubMerchantStatus};
use crate::upi::Vpa;
use crate::validate::ValidationError;

/// The administrative action being performed on a sub-merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantAction {
    Onboard,
    Suspend,
    Reactivate,
    Revoke,
    UpdateLimits,
}

impl MerchantAction {
    /// Label recorded in the audit log.
    pub fn label(self) -> &'static str {
        match self {
            MerchantAction::Onboard => "ONBOARD",
            MerchantAction::Suspend => "SUSPEND",
            MerchantAction::Reactivate => "REACTIVATE",
            MerchantAction::Revoke => "REVOKE",
            MerchantAction::UpdateLimits => "UPDATE_LIMITS",
        }
    }
}

impl std::fmt::Display for MerchantAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerchantError {
    #[error("sub-merchant {0} not found")]
    NotFound(MerchantId),

    #[error("{action}: sub-merchant {id} is {from}")]
    InvalidTransition {
        id: MerchantId,
        from: SubMerchantStatus,
        action: MerchantAction,
    },

    #[error("VPA {0} is already assigned")]
    DuplicateVpa(Vpa),

    #[error("invalid limits: per-transaction {per_transaction} must be positive and not exceed daily {daily}")]
    InvalidLimits {
        per_transaction: Amount,
        daily: Amount,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
