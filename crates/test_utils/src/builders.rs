//! Test Data Builders
//!
//! Provides builder patterns for constructing ledger test data with
//! sensible defaults. Tests specify only the fields they care about.

use chrono::{DateTime, Utc};
use core_kernel::{Amount, EntryId, OwnerRef};
use domain_ledger::{EntryDraft, EntryType, LedgerEntry, Metadata};

use crate::fixtures::{AmountFixtures, OwnerFixtures};

/// Builder for entry drafts
pub struct EntryDraftBuilder {
    owner: OwnerRef,
    amount: Amount,
    entry_type: EntryType,
    description: Option<String>,
    metadata: Metadata,
}

impl Default for EntryDraftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryDraftBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            owner: OwnerFixtures::business(),
            amount: AmountFixtures::credit_100(),
            entry_type: EntryType::Charge,
            description: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> EntryDraft {
        let mut draft = EntryDraft::new(self.owner, self.amount, self.entry_type)
            .with_metadata(self.metadata);
        if let Some(description) = self.description {
            draft = draft.with_description(description);
        }
        draft
    }
}

/// Builder for committed entries, for store-level tests that bypass the
/// append path
pub struct LedgerEntryBuilder {
    id: EntryId,
    owner: OwnerRef,
    amount: Amount,
    running_balance: Amount,
    entry_type: EntryType,
    created_at: DateTime<Utc>,
    reversed_at: Option<DateTime<Utc>>,
    reversal_of: Option<EntryId>,
}

impl Default for LedgerEntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerEntryBuilder {
    pub fn new() -> Self {
        let amount = AmountFixtures::credit_100();
        Self {
            id: EntryId::new_v7(),
            owner: OwnerFixtures::business(),
            amount,
            running_balance: amount,
            entry_type: EntryType::Charge,
            created_at: Utc::now(),
            reversed_at: None,
            reversal_of: None,
        }
    }

    pub fn with_owner(mut self, owner: OwnerRef) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_running_balance(mut self, balance: Amount) -> Self {
        self.running_balance = balance;
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn reversed_at(mut self, at: DateTime<Utc>) -> Self {
        self.reversed_at = Some(at);
        self
    }

    pub fn reversal_of(mut self, original: EntryId) -> Self {
        self.reversal_of = Some(original);
        self
    }

    pub fn build(self) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            owner: self.owner,
            amount: self.amount,
            running_balance: self.running_balance,
            entry_type: self.entry_type,
            description: None,
            metadata: Metadata::new(),
            created_at: self.created_at,
            reversed_at: self.reversed_at,
            reversal_of: self.reversal_of,
        }
    }
}
