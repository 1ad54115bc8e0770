//! Quota ledger
//!
//! Anonymous objects are charged against their owner's object quota at
//! creation and credited back exactly once at final destruction. This
//! module is the refund side's collaborator: a per-owner ledger the server
//! reconciles against the database's stored quota properties.
//!
//! Thread-local because the value graph is single-threaded; tests read the
//! ledger back to pin the exactly-once refund guarantee.

use crate::value::Objid;
use std::cell::RefCell;
use std::collections::HashMap;

/// Charges and refunds recorded for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaEntry {
    pub charges: u64,
    pub refunds: u64,
}

thread_local! {
    static LEDGER: RefCell<HashMap<Objid, QuotaEntry>> = RefCell::new(HashMap::new());
}

/// Record the creation-side quota debit for `owner`.
pub fn charge_quota(owner: Objid) {
    LEDGER.with(|l| l.borrow_mut().entry(owner).or_default().charges += 1);
}

/// Refund one object's quota to `owner`.
///
/// Called from exactly one place: the Invalid → Freed transition of the
/// anonymous-object lifecycle.
pub fn incr_quota(owner: Objid) {
    LEDGER.with(|l| l.borrow_mut().entry(owner).or_default().refunds += 1);
}

/// Ledger entry for `owner` (zeroes if never touched).
pub fn quota_entry(owner: Objid) -> QuotaEntry {
    LEDGER.with(|l| l.borrow().get(&owner).copied().unwrap_or_default())
}

/// Clear the ledger. For tests and server checkpoint handoff.
pub fn reset_quota_ledger() {
    LEDGER.with(|l| l.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_and_refund_accumulate() {
        reset_quota_ledger();
        charge_quota(42);
        charge_quota(42);
        incr_quota(42);
        assert_eq!(
            quota_entry(42),
            QuotaEntry {
                charges: 2,
                refunds: 1
            }
        );
        assert_eq!(quota_entry(7), QuotaEntry::default());
    }
}
