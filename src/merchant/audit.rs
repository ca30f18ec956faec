use chrono::NaiveDateTime;

use crate::model::{AuditEntry, MerchantId};

/// Append-only record of administrative actions. Lives only in memory.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn append(
        &mut self,
        subject: MerchantId,
        action: &str,
        actor: &str,
        timestamp: NaiveDateTime,
        description: String,
    ) -> &AuditEntry {
        let id = self.entries.len() as u64 + 1;
        self.entries.push(AuditEntry {
            id,
            subject,
            action: action.to_string(),
            actor: actor.to_string(),
            timestamp,
            description,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn for_subject(&self, subject: MerchantId) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.entries.iter().filter(move |e| e.subject == subject)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
