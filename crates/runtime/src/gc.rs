//! Cycle-tracer client state
//!
//! The runtime never traces the value graph itself. It maintains exactly
//! the per-cell state an external incremental tracer depends on: tri-color
//! marks, the buffered flag, and the possible-roots buffer that Decrement
//! feeds. A cell whose count drops without reaching zero might be the
//! external anchor of a garbage cycle, so it is buffered as a possible
//! root; the tracer drains the buffer on its own schedule (this core
//! assumes no upper bound on how long a cell stays buffered).
//!
//! `aux_free` is the tracer's callback for cells that entered the buffer
//! and subsequently had their count reach zero: their children are already
//! released, only the cell's storage remains.

use crate::anon::{self, FLAG_INVALID};
use crate::value::Var;
use hearth_core::{AllocCategory, free_cell};
pub use hearth_core::Color;
use std::cell::RefCell;

thread_local! {
    static POSSIBLE_ROOTS: RefCell<Vec<Var>> = const { RefCell::new(Vec::new()) };
}

/// Color of a collectable cell (List, Map, live Anon).
pub fn gc_get_color(v: Var) -> Color {
    match v.header() {
        // Safety: header projection of a live cell.
        Some(h) => unsafe { h.as_ref() }.color(),
        None => panic!("gc_get_color: {} value has no cell", v.type_name()),
    }
}

/// Set the color of a collectable cell.
pub fn gc_set_color(v: Var, color: Color) {
    match v.header() {
        // Safety: header projection of a live cell.
        Some(h) => unsafe { h.as_ref() }.set_color(color),
        None => panic!("gc_set_color: {} value has no cell", v.type_name()),
    }
}

/// Whether the cell currently sits in the possible-roots buffer.
pub fn gc_is_buffered(v: Var) -> bool {
    match v.header() {
        // Safety: header projection of a live cell.
        Some(h) => unsafe { h.as_ref() }.is_buffered(),
        None => false,
    }
}

/// Register a cell whose count dropped without reaching zero as a
/// possible cycle root. Already-buffered cells are not enqueued twice.
pub fn gc_possible_root(v: Var) {
    debug_assert!(matches!(v, Var::List(_) | Var::Map(_) | Var::Anon(Some(_))));
    let Some(h) = v.header() else { return };
    // Safety: header projection of a live cell.
    let header = unsafe { h.as_ref() };
    if !header.is_buffered() {
        header.set_buffered(true);
        POSSIBLE_ROOTS.with(|r| r.borrow_mut().push(v));
    }
}

/// Tracer callback: the cell has been processed out of the buffer. A
/// still-live cell goes back to normal operation; a dead one must go to
/// `aux_free` instead.
pub fn gc_clear_buffered(v: Var) {
    if let Some(h) = v.header() {
        // Safety: header projection of a live cell.
        unsafe { h.as_ref() }.set_buffered(false);
    }
}

/// Hand the accumulated candidates to the external tracer. The tracer
/// owns clearing each cell's buffered flag (and freeing dead cells via
/// `aux_free`) as it processes them.
pub fn take_possible_roots() -> Vec<Var> {
    POSSIBLE_ROOTS.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

pub fn possible_roots_len() -> usize {
    POSSIBLE_ROOTS.with(|r| r.borrow().len())
}

/// Free the storage of a buffered cell whose count reached zero after it
/// entered the possible-roots buffer. Children were already released by
/// the Decrement that zeroed the count; only the cell box remains.
pub fn aux_free(v: Var) {
    // Safety: the tracer calls this exactly once per dead buffered cell,
    // after confirming refcount zero; no other reference exists.
    unsafe {
        match v {
            Var::List(p) => free_cell(AllocCategory::List, p),
            Var::Map(p) => free_cell(AllocCategory::Map, p),
            Var::Anon(Some(p)) => {
                assert!(
                    anon::db_object_has_flag(p, FLAG_INVALID),
                    "aux_free: anonymous object reached the sweep without being invalidated"
                );
                free_cell(AllocCategory::Anon, p);
            }
            _ => panic!("aux_free: {} value is not collectable", v.type_name()),
        }
    }
}
