//! Sub-merchant administration.
//!
//! The registry owns the sub-merchants of one aggregator account and records
//! every successful administrative action in an append-only audit log.
//! A failed action changes nothing.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use tracing::info;

use crate::Amount;
use crate::model::{AuditEntry, Contact, MerchantId, SubMerchant, SubMerchantStatus, TxLimits};
use crate::validate;

mod audit;
pub use audit::AuditLog;

mod error;
pub use error::{MerchantAction, MerchantError};

/// Onboarding form for a new sub-merchant.
#[derive(Debug, Clone)]
pub struct SubMerchantDraft {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vpa: String,
    pub limits: TxLimits,
}

pub struct SubMerchantRegistry {
    merchants: BTreeMap<MerchantId, SubMerchant>,
    audit: AuditLog,
    next_id: MerchantId,
    clock: fn() -> NaiveDateTime,
}

/// Public API
impl SubMerchantRegistry {
    pub fn new() -> Self {
        Self::with_clock(|| Utc::now().naive_utc())
    }

    pub fn with_clock(clock: fn() -> NaiveDateTime) -> Self {
        Self {
            merchants: BTreeMap::new(),
            audit: AuditLog::default(),
            next_id: 1,
            clock,
        }
    }

    /// Sub-merchants ordered by id.
    pub fn merchants(&self) -> impl Iterator<Item = &SubMerchant> + '_ {
        self.merchants.values()
    }

    pub fn get(&self, id: MerchantId) -> Option<&SubMerchant> {
        self.merchants.get(&id)
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    pub fn audit_for(&self, id: MerchantId) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.audit.for_subject(id)
    }

    /// Validate the draft and add it as an `Active` sub-merchant.
    pub fn onboard(
        &mut self,
        draft: SubMerchantDraft,
        actor: &str,
    ) -> Result<MerchantId, MerchantError> {
        let result = self.apply_onboard(draft, actor);
        let id = *result.as_ref().unwrap_or(&0);
        Self::log_result(MerchantAction::Onboard, id, actor, &result);
        result
    }

    /// `Active -> Suspended`
    pub fn suspend(
        &mut self,
        id: MerchantId,
        actor: &str,
        reason: &str,
    ) -> Result<(), MerchantError> {
        let result = self.transition(
            id,
            actor,
            MerchantAction::Suspend,
            &[SubMerchantStatus::Active],
            SubMerchantStatus::Suspended,
            reason,
        );
        Self::log_result(MerchantAction::Suspend, id, actor, &result);
        result
    }

    /// `Suspended -> Active`
    pub fn reactivate(&mut self, id: MerchantId, actor: &str) -> Result<(), MerchantError> {
        let result = self.transition(
            id,
            actor,
            MerchantAction::Reactivate,
            &[SubMerchantStatus::Suspended],
            SubMerchantStatus::Active,
            "",
        );
        Self::log_result(MerchantAction::Reactivate, id, actor, &result);
        result
    }

    /// `Active | Suspended -> Revoked`. Revoked is terminal.
    pub fn revoke(&mut self, id: MerchantId, actor: &str, reason: &str) -> Result<(), MerchantError> {
        let result = self.transition(
            id,
            actor,
            MerchantAction::Revoke,
            &[SubMerchantStatus::Active, SubMerchantStatus::Suspended],
            SubMerchantStatus::Revoked,
            reason,
        );
        Self::log_result(MerchantAction::Revoke, id, actor, &result);
        result
    }

    pub fn update_limits(
        &mut self,
        id: MerchantId,
        limits: TxLimits,
        actor: &str,
    ) -> Result<(), MerchantError> {
        let result = self.apply_update_limits(id, limits, actor);
        Self::log_result(MerchantAction::UpdateLimits, id, actor, &result);
        result
    }
}

/// Private API
impl SubMerchantRegistry {
    fn log_result<T, E: std::fmt::Display>(
        action: MerchantAction,
        id: MerchantId,
        actor: &str,
        result: &Result<T, E>,
    ) {
        match result {
            Ok(_) => info!(merchant = id, actor, "{action} applied"),
            Err(e) => info!(merchant = id, actor, reason = %e, "{action} skipped"),
        }
    }

    fn check_limits(limits: TxLimits) -> Result<(), MerchantError> {
        if !limits.per_transaction.is_positive() || limits.per_transaction > limits.daily {
            return Err(MerchantError::InvalidLimits {
                per_transaction: limits.per_transaction,
                daily: limits.daily,
            });
        }
        Ok(())
    }

    fn apply_onboard(
        &mut self,
        draft: SubMerchantDraft,
        actor: &str,
    ) -> Result<MerchantId, MerchantError> {
        validate::required("name", &draft.name)?;
        let phone = validate::phone(&draft.phone)?;
        validate::email(&draft.email)?;
        let vpa = validate::vpa(&draft.vpa)?;
        Self::check_limits(draft.limits)?;

        if self.merchants.values().any(|m| m.vpa.same_address(&vpa)) {
            return Err(MerchantError::DuplicateVpa(vpa));
        }

        let id = self.next_id;
        self.next_id += 1;
        let now = (self.clock)();

        let description = format!("onboarded {} with VPA {vpa}", draft.name.trim());
        self.merchants.insert(
            id,
            SubMerchant {
                id,
                name: draft.name.trim().to_string(),
                contact: Contact {
                    phone,
                    email: draft.email.trim().to_string(),
                },
                vpa,
                status: SubMerchantStatus::Active,
                limits: draft.limits,
                created: now.date(),
            },
        );
        self.audit
            .append(id, MerchantAction::Onboard.label(), actor, now, description);

        Ok(id)
    }

    /// Move `id` to `to` if its current status is one of `allowed`.
    fn transition(
        &mut self,
        id: MerchantId,
        actor: &str,
        action: MerchantAction,
        allowed: &[SubMerchantStatus],
        to: SubMerchantStatus,
        reason: &str,
    ) -> Result<(), MerchantError> {
        let merchant = self
            .merchants
            .get_mut(&id)
            .ok_or(MerchantError::NotFound(id))?;

        if !allowed.contains(&merchant.status) {
            return Err(MerchantError::InvalidTransition {
                id,
                from: merchant.status,
                action,
            });
        }

        let from = merchant.status;
        merchant.status = to;

        let mut description = format!("{from} -> {to}");
        if !reason.trim().is_empty() {
            description.push_str(": ");
            description.push_str(reason.trim());
        }
        self.audit
            .append(id, action.label(), actor, (self.clock)(), description);

        Ok(())
    }

    fn apply_update_limits(
        &mut self,
        id: MerchantId,
        limits: TxLimits,
        actor: &str,
    ) -> Result<(), MerchantError> {
        let merchant = self
            .merchants
            .get_mut(&id)
            .ok_or(MerchantError::NotFound(id))?;

        if merchant.status == SubMerchantStatus::Revoked {
            return Err(MerchantError::InvalidTransition {
                id,
                from: merchant.status,
                action: MerchantAction::UpdateLimits,
            });
        }
        Self::check_limits(limits)?;

        let old = std::mem::replace(&mut merchant.limits, limits);
        let description = format!(
            "per-transaction {} -> {}, daily {} -> {}",
            old.per_transaction, limits.per_transaction, old.daily, limits.daily
        );
        self.audit.append(
            id,
            MerchantAction::UpdateLimits.label(),
            actor,
            (self.clock)(),
            description,
        );

        Ok(())
    }
}

impl Default for SubMerchantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Limits applied to newly onboarded sub-merchants unless the form overrides them.
pub const DEFAULT_LIMITS: TxLimits = TxLimits {
    per_transaction: Amount::from_paise(1_000_000),
    daily: Amount::from_paise(10_000_000),
};
