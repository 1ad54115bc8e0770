//! Iterator cells
//!
//! An external traversal cursor over a list or map. The cursor holds a
//! counted reference to its source collection and a position; duplicating
//! a cursor copies the position independently. Iterator cells are plain
//! refcounted (never cyclic, never colored): the moment the count hits
//! zero the traversal state is torn down and the cell released.

use crate::lifecycle::{free_var, var_ref};
use crate::value::Var;
use hearth_core::{AllocCategory, CellHeader, alloc_cell, free_cell};
use std::cell::Cell;
use std::ptr::NonNull;

/// Refcounted traversal cursor.
#[derive(Debug)]
pub struct IterCell {
    pub(crate) header: CellHeader,
    source: Var,
    pos: Cell<usize>,
}

impl IterCell {
    /// Current (key, value) pair, or `None` when the cursor is exhausted.
    ///
    /// For maps the pair is the stored key and value; for lists the key is
    /// the 1-based index. The returned Vars are borrowed views; callers
    /// that keep them must `var_ref` them.
    pub fn get(&self) -> Option<(Var, Var)> {
        let pos = self.pos.get();
        // Safety: the cursor holds a counted reference, so the source cell
        // is alive as long as the cursor is.
        match self.source {
            Var::List(p) => {
                let elements = unsafe { p.as_ref() }.elements();
                elements
                    .get(pos)
                    .map(|&v| (Var::Int(pos as i64 + 1), v))
            }
            Var::Map(p) => unsafe { p.as_ref() }.pairs().get(pos).copied(),
            _ => None,
        }
    }

    /// Advance the cursor; returns false once it moves past the end.
    pub fn next(&self) -> bool {
        let pos = self.pos.get() + 1;
        self.pos.set(pos);
        match self.source {
            // Safety: as in `get`.
            Var::List(p) => pos < unsafe { p.as_ref() }.length(),
            Var::Map(p) => pos < unsafe { p.as_ref() }.len(),
            _ => false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos.get()
    }
}

/// Create a cursor over `source` (a List or Map), taking a new reference
/// to it.
pub fn new_iter(source: Var) -> Var {
    assert!(
        matches!(source, Var::List(_) | Var::Map(_)),
        "new_iter: source must be a list or map, got {}",
        source.type_name()
    );
    Var::Iter(alloc_cell(
        AllocCategory::Iter,
        IterCell {
            header: CellHeader::new(),
            source: var_ref(source),
            pos: Cell::new(0),
        },
    ))
}

/// Tear down a cursor whose count has reached zero: release the source
/// reference and free the cell.
pub fn destroy_iter(p: NonNull<IterCell>) {
    // Safety: count is zero, so this is the only live access; the cell
    // came from alloc_cell.
    unsafe {
        let source = p.as_ref().source;
        free_cell(AllocCategory::Iter, p);
        free_var(source);
    }
}

/// Duplicate the cursor's position and source reference independently.
pub fn iter_dup(p: NonNull<IterCell>) -> Var {
    // Safety: handle points at a live cell.
    let src = unsafe { p.as_ref() };
    Var::Iter(alloc_cell(
        AllocCategory::Iter,
        IterCell {
            header: CellHeader::new(),
            source: var_ref(src.source),
            pos: Cell::new(src.pos.get()),
        },
    ))
}
