//! Refcounted immutable strings
//!
//! String cells are immutable byte sequences with a memoized length and a
//! plain reference count. Strings never participate in cycles, so they are
//! never colored or buffered: the instant the count hits zero the cell is
//! released.

use crate::value::Var;
use hearth_core::{AllocCategory, CellHeader, alloc_cell, free_cell};
use std::ptr::NonNull;

/// Immutable refcounted string cell.
#[derive(Debug)]
pub struct StrCell {
    pub(crate) header: CellHeader,
    text: Box<str>,
}

impl StrCell {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Memoized length: stored with the allocation, never recomputed.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Allocate a fresh string cell with refcount 1.
pub fn new_str(s: &str) -> Var {
    Var::Str(alloc_cell(
        AllocCategory::Str,
        StrCell {
            header: CellHeader::new(),
            text: s.into(),
        },
    ))
}

/// Allocate a string cell taking ownership of `s`.
pub fn new_str_owned(s: String) -> Var {
    Var::Str(alloc_cell(
        AllocCategory::Str,
        StrCell {
            header: CellHeader::new(),
            text: s.into_boxed_str(),
        },
    ))
}

/// Add a reference to a string cell.
pub fn str_ref(p: NonNull<StrCell>) {
    // Safety: handle points at a live cell (Var invariant).
    unsafe { p.as_ref() }.header.addref();
}

/// Drop a reference, releasing the cell when the count hits zero.
pub fn free_str(p: NonNull<StrCell>) {
    // Safety: handle points at a live cell; after the count reaches zero
    // no other reference exists, so the free is sound.
    unsafe {
        if p.as_ref().header.delref() == 0 {
            free_cell(AllocCategory::Str, p);
        }
    }
}

/// Allocate an independent copy. Safe because strings are never mutated
/// in place.
pub fn str_dup(p: NonNull<StrCell>) -> Var {
    new_str(unsafe { p.as_ref() }.text())
}

/// Memoized length lookup.
pub fn memo_strlen(p: NonNull<StrCell>) -> usize {
    unsafe { p.as_ref() }.len()
}
