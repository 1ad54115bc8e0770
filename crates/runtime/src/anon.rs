//! Anonymous object lifecycle
//!
//! Anonymous objects are runtime-created, quota-charged objects without a
//! durable database slot. They cannot simply be freed on first zero
//! refcount: a user-visible recycle step must run first, and the owner's
//! quota must be credited back exactly once.
//!
//! The state machine:
//!
//! ```text
//! Live ──refcount 0, no flags──▶ PendingRecycle ──finalizer ran──▶ Recycled ──▶ Freed
//!   │                                  │
//!   └──────────db destroys object──────┴──▶ Invalid ──refcount 0──▶ Freed
//!                                                   (quota refunded once)
//! ```
//!
//! Flags are monotonic: once Recycled or Invalid is set it is never
//! cleared. The refcount-zero branches live in `lifecycle::complex_free_var`;
//! this module owns the cell type, the flag transitions driven by the
//! database, and the pending-recycle queue an external finalizer drains.

use crate::quota::charge_quota;
use crate::value::{Objid, Var};
use hearth_core::{AllocCategory, CellHeader, alloc_cell};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::ptr::NonNull;

/// The recycle finalizer has run for this object.
pub const FLAG_RECYCLED: u8 = 0x1;
/// The database destroyed the backing object out from under live handles.
pub const FLAG_INVALID: u8 = 0x2;

/// Refcounted anonymous-object cell.
#[derive(Debug)]
pub struct AnonCell {
    pub(crate) header: CellHeader,
    owner: Objid,
    flags: Cell<u8>,
}

impl AnonCell {
    pub fn owner(&self) -> Objid {
        self.owner
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags.get() & flag != 0
    }
}

/// Create a live anonymous object owned by `owner`, debiting one object
/// of its quota.
pub fn new_anon(owner: Objid) -> Var {
    charge_quota(owner);
    Var::Anon(Some(alloc_cell(
        AllocCategory::Anon,
        AnonCell {
            header: CellHeader::new(),
            owner,
            flags: Cell::new(0),
        },
    )))
}

/// Flag query on a live handle.
pub fn db_object_has_flag(p: NonNull<AnonCell>, flag: u8) -> bool {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }.has_flag(flag)
}

/// Owner lookup on a live handle.
pub fn db_object_owner(p: NonNull<AnonCell>) -> Objid {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }.owner
}

fn anon_cell(v: Var) -> NonNull<AnonCell> {
    match v {
        Var::Anon(Some(p)) => p,
        Var::Anon(None) => panic!("anon transition on a detached handle"),
        _ => panic!("anon transition on a {} value", v.type_name()),
    }
}

/// PendingRecycle → Recycled: the external finalizer has run. Monotonic.
pub fn set_recycled(v: Var) {
    let p = anon_cell(v);
    // Safety: handle points at a live cell.
    let cell = unsafe { p.as_ref() };
    cell.flags.set(cell.flags.get() | FLAG_RECYCLED);
}

/// Live/PendingRecycle → Invalid: the database destroyed the backing
/// object out from under still-referenced handles. Monotonic.
pub fn set_invalid(v: Var) {
    let p = anon_cell(v);
    // Safety: handle points at a live cell.
    let cell = unsafe { p.as_ref() };
    cell.flags.set(cell.flags.get() | FLAG_INVALID);
}

thread_local! {
    /// Values whose count hit zero with neither flag set, awaiting their
    /// recycle finalizer. The queue owns the storage while the value sits
    /// in it.
    static PENDING_RECYCLE: RefCell<VecDeque<Var>> = const { RefCell::new(VecDeque::new()) };

    /// Owners of anonymous objects the database has been told to discard.
    static DESTROYED: RefCell<Vec<Objid>> = const { RefCell::new(Vec::new()) };
}

/// Queue a zero-count anonymous value for its recycle step
/// (Live → PendingRecycle). The queue takes its own reference; storage is
/// not freed now.
pub fn queue_anonymous_object(v: Var) {
    debug_assert!(matches!(v, Var::Anon(Some(_))));
    tracing::debug!(owner = db_object_owner(anon_cell(v)), "queueing anonymous object for recycle");
    PENDING_RECYCLE.with(|q| q.borrow_mut().push_back(crate::lifecycle::var_ref(v)));
}

/// Drain the pending-recycle queue. The external finalizer takes over the
/// queue's reference to every value it receives and releases it (normally
/// with `free_var` after `set_recycled`).
pub fn take_pending_recycle() -> Vec<Var> {
    PENDING_RECYCLE.with(|q| q.borrow_mut().drain(..).collect())
}

pub fn pending_recycle_len() -> usize {
    PENDING_RECYCLE.with(|q| q.borrow().len())
}

/// Tell the database to discard an anonymous object (Invalid → Freed
/// path). Recorded so the server's checkpointer can reconcile.
pub fn db_destroy_anonymous_object(p: NonNull<AnonCell>) {
    let owner = db_object_owner(p);
    tracing::debug!(owner, "destroying anonymous object");
    DESTROYED.with(|d| d.borrow_mut().push(owner));
}

/// Drain the destroyed-object log.
pub fn take_destroyed_objects() -> Vec<Objid> {
    DESTROYED.with(|d| std::mem::take(&mut *d.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_monotonic() {
        let v = new_anon(5);
        let p = anon_cell(v);
        assert!(!db_object_has_flag(p, FLAG_RECYCLED));
        set_recycled(v);
        assert!(db_object_has_flag(p, FLAG_RECYCLED));
        set_invalid(v);
        // Setting one flag never clears the other.
        assert!(db_object_has_flag(p, FLAG_RECYCLED));
        assert!(db_object_has_flag(p, FLAG_INVALID));
        // Cell is leaked deliberately: lifecycle tests cover the free paths.
    }

    #[test]
    #[should_panic(expected = "detached handle")]
    fn test_transition_on_detached_handle_panics() {
        set_recycled(Var::Anon(None));
    }

    #[test]
    fn test_queue_drain() {
        let before = pending_recycle_len();
        let v = new_anon(9);
        queue_anonymous_object(v);
        assert_eq!(pending_recycle_len(), before + 1);
        let drained = take_pending_recycle();
        assert_eq!(drained.len(), before + 1);
        assert_eq!(pending_recycle_len(), 0);
    }
}
