//! Polymorphic owner references
//!
//! A ledger balance is tracked against an *owner*: any entity of the
//! hosting platform (business, user, campaign, loyalty account). The
//! ledger never dereferences the owner; the pair is only a grouping and
//! sequencing key, so it is modeled as a tagged `(kind, id)` pair with
//! no referential enforcement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to the entity a ledger sequence belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    /// Entity type tag, e.g. "business", "user", "campaign"
    pub kind: String,
    /// Entity identifier in the owning system; opaque to the ledger
    pub id: String,
}

impl OwnerRef {
    /// Creates an owner reference
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Returns true if either component is empty
    pub fn is_empty(&self) -> bool {
        self.kind.trim().is_empty() || self.id.trim().is_empty()
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_display() {
        let owner = OwnerRef::new("business", "biz-1");
        assert_eq!(owner.to_string(), "business/biz-1");
    }

    #[test]
    fn test_owner_ref_empty_detection() {
        assert!(OwnerRef::new("", "biz-1").is_empty());
        assert!(OwnerRef::new("business", "  ").is_empty());
        assert!(!OwnerRef::new("business", "biz-1").is_empty());
    }

    #[test]
    fn test_owner_ref_equality_is_by_kind_and_id() {
        let a = OwnerRef::new("user", "42");
        let b = OwnerRef::new("user", "42");
        let c = OwnerRef::new("campaign", "42");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
