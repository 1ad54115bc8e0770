//! List cells
//!
//! An ordered sequence of Vars with copy-on-write semantics for callers.
//! Slot 0 of the backing storage holds the element count as an `Int`;
//! user elements occupy slots 1..=n. The slot-0 sentinel is a load-bearing
//! representation detail: conditional truth of a list reads that slot's
//! numeric field directly (see `compare::is_true`).
//!
//! List cells participate in cycle collection: they carry a color and a
//! buffered flag, and releasing the last reference while buffered leaves
//! the cell's storage to the possible-roots sweep.

use crate::compare::equality;
use crate::lifecycle::{free_var, var_ref};
use crate::value::Var;
use hearth_core::{AllocCategory, CellHeader, alloc_cell};
use std::ptr::NonNull;

/// Refcounted list cell. `slots[0]` is the `Int` length sentinel.
#[derive(Debug)]
pub struct ListCell {
    pub(crate) header: CellHeader,
    slots: Vec<Var>,
}

impl ListCell {
    /// Element count (not counting the sentinel slot). Zero once the cell
    /// has been destroyed and is awaiting its buffered sweep.
    pub fn length(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// User elements, slots 1..=n.
    pub fn elements(&self) -> &[Var] {
        if self.slots.is_empty() {
            &[]
        } else {
            &self.slots[1..]
        }
    }

    /// Raw slot 0, the representation detail behind list truthiness.
    pub fn first_slot(&self) -> Var {
        self.slots.first().copied().unwrap_or(Var::Int(0))
    }
}

/// Allocate a list of `n` elements, each initialized to `Var::None`.
pub fn new_list(n: usize) -> Var {
    let mut slots = Vec::with_capacity(n + 1);
    slots.push(Var::Int(n as i64));
    slots.resize(n + 1, Var::None);
    Var::List(alloc_cell(
        AllocCategory::List,
        ListCell {
            header: CellHeader::new(),
            slots,
        },
    ))
}

/// Build a list from owned elements (each element's reference transfers to
/// the list).
pub fn from_vec(elements: Vec<Var>) -> Var {
    let mut slots = Vec::with_capacity(elements.len() + 1);
    slots.push(Var::Int(elements.len() as i64));
    slots.extend(elements);
    Var::List(alloc_cell(
        AllocCategory::List,
        ListCell {
            header: CellHeader::new(),
            slots,
        },
    ))
}

/// Build a list from raw slot storage with no sentinel fixup.
///
/// For persistence-reader internals and fixtures that need to pin the
/// slot-0 representation; everything else wants `from_vec`.
pub fn from_raw_slots(slots: Vec<Var>) -> Var {
    Var::List(alloc_cell(
        AllocCategory::List,
        ListCell {
            header: CellHeader::new(),
            slots,
        },
    ))
}

/// Release every child slot of a list whose count has reached zero.
///
/// The slots are detached before any child is freed, so a child's own
/// release chain can never observe a half-released parent. The cell's
/// storage itself is not freed here; the caller decides that based on the
/// buffered flag.
pub fn destroy_list(p: NonNull<ListCell>) {
    // Safety: count is zero, so this is the only live access to the cell.
    let slots = std::mem::take(unsafe { &mut (*p.as_ptr()).slots });
    for child in slots {
        free_var(child);
    }
}

/// Structurally independent copy: a fresh cell whose slots reference the
/// same children (each child's count is incremented).
pub fn list_dup(p: NonNull<ListCell>) -> Var {
    // Safety: handle points at a live cell.
    let src = unsafe { p.as_ref() };
    let mut elements = Vec::with_capacity(src.length());
    for &child in src.elements() {
        elements.push(var_ref(child));
    }
    from_vec(elements)
}

/// Structural equality, threading the case-sensitivity flag through
/// element comparisons.
pub fn listequal(a: NonNull<ListCell>, b: NonNull<ListCell>, case_matters: bool) -> bool {
    if a.as_ptr() == b.as_ptr() {
        return true;
    }
    // Safety: handles point at live cells.
    let (a, b) = unsafe { (a.as_ref(), b.as_ref()) };
    if a.length() != b.length() {
        return false;
    }
    a.elements()
        .iter()
        .zip(b.elements())
        .all(|(&x, &y)| equality(x, y, case_matters))
}

/// Element count of a list handle.
pub fn listlength(p: NonNull<ListCell>) -> usize {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }.length()
}

/// Storage footprint of the cell and its slots, in bytes.
pub fn list_sizeof(p: NonNull<ListCell>) -> usize {
    // Safety: handle points at a live cell.
    let cell = unsafe { p.as_ref() };
    std::mem::size_of::<ListCell>() + cell.slots.capacity() * std::mem::size_of::<Var>()
}
