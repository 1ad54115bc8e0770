//! Reference lifecycle protocol
//!
//! The choke point for every ownership change in the value graph. Every
//! assignment or copy goes through `var_ref`, every drop through
//! `free_var`; nothing else touches a reference count. Scalars pass
//! through untouched (value semantics); the `complex_` entry points handle
//! the heap-backed variants and are where the cycle-collector bookkeeping
//! and the anonymous-object state machine hook in.
//!
//! Release rules by type:
//! - Str/Float: free the instant the count hits zero; never cyclic.
//! - Iter: zero count tears down the traversal state and the cell.
//! - List/Map: zero count releases every child, marks the cell Black, and
//!   frees the storage only if the cell is not buffered; a buffered
//!   cell's storage belongs to the possible-roots sweep. A nonzero
//!   decrement registers the cell as a possible cycle root.
//! - Anon: zero count branches on the flag set (see the `anon` module's
//!   state machine); nonzero registers a possible root like List/Map.

use crate::anon::{
    FLAG_INVALID, FLAG_RECYCLED, db_destroy_anonymous_object, db_object_has_flag, db_object_owner,
    queue_anonymous_object,
};
use crate::gc::{Color, gc_possible_root, gc_set_color};
use crate::iter;
use crate::list;
use crate::map;
use crate::quota::incr_quota;
use crate::string;
use crate::value::{Var, new_float};
use hearth_core::{AllocCategory, free_cell};

/// Increment: take a new reference to `v`'s payload, returning `v`.
///
/// Scalars are untouched. A new reference to an anonymous object forces
/// its cell Black so a value just handed out can never be misclassified
/// as garbage by an in-progress collection.
#[inline]
pub fn var_ref(v: Var) -> Var {
    if v.is_complex() { complex_var_ref(v) } else { v }
}

/// Increment for heap-backed variants only.
///
/// Calling this with a scalar is a runtime bug and aborts.
pub fn complex_var_ref(v: Var) -> Var {
    // Safety: handles inside a live Var point at live cells.
    unsafe {
        match v {
            Var::Str(p) => {
                p.as_ref().header.addref();
            }
            Var::Float(p) => {
                p.as_ref().header.addref();
            }
            Var::List(p) => {
                p.as_ref().header.addref();
            }
            Var::Map(p) => {
                p.as_ref().header.addref();
            }
            Var::Iter(p) => {
                p.as_ref().header.addref();
            }
            Var::Anon(Some(p)) => {
                p.as_ref().header.addref();
                if p.as_ref().header.color() != Color::Black {
                    p.as_ref().header.set_color(Color::Black);
                }
            }
            Var::Anon(None) => {}
            _ => panic!("complex_var_ref: {} is not a complex value", v.type_name()),
        }
    }
    v
}

/// Decrement/Release: give up one reference to `v`'s payload.
///
/// Scalars are untouched.
#[inline]
pub fn free_var(v: Var) {
    if v.is_complex() {
        complex_free_var(v);
    }
}

/// Decrement/Release for heap-backed variants only.
///
/// Calling this with a scalar is a runtime bug and aborts.
pub fn complex_free_var(v: Var) {
    // Safety: handles inside a live Var point at live cells; each zero
    // branch is the sole remaining access to its cell.
    unsafe {
        match v {
            Var::Str(p) => string::free_str(p),
            Var::Float(p) => {
                if p.as_ref().header.delref() == 0 {
                    free_cell(AllocCategory::Float, p);
                }
            }
            Var::List(p) => {
                if p.as_ref().header.delref() == 0 {
                    // Terminally released before recursing: a child's own
                    // release chain must never re-enter this cell.
                    gc_set_color(v, Color::Black);
                    list::destroy_list(p);
                    if !p.as_ref().header.is_buffered() {
                        free_cell(AllocCategory::List, p);
                    }
                } else {
                    gc_possible_root(v);
                }
            }
            Var::Map(p) => {
                if p.as_ref().header.delref() == 0 {
                    gc_set_color(v, Color::Black);
                    map::destroy_map(p);
                    if !p.as_ref().header.is_buffered() {
                        free_cell(AllocCategory::Map, p);
                    }
                } else {
                    gc_possible_root(v);
                }
            }
            Var::Iter(p) => {
                if p.as_ref().header.delref() == 0 {
                    iter::destroy_iter(p);
                }
            }
            // The first time an anonymous object's count drops to zero it
            // is not destroyed; it is queued to have its recycle step run,
            // which may temporarily create new references and eventually
            // sets the Recycled (and later Invalid) flags.
            Var::Anon(Some(p)) => {
                if p.as_ref().header.delref() == 0 {
                    if db_object_has_flag(p, FLAG_RECYCLED) {
                        gc_set_color(v, Color::Black);
                        if !p.as_ref().header.is_buffered() {
                            free_cell(AllocCategory::Anon, p);
                        }
                    } else if db_object_has_flag(p, FLAG_INVALID) {
                        incr_quota(db_object_owner(p));
                        db_destroy_anonymous_object(p);
                        gc_set_color(v, Color::Black);
                        if !p.as_ref().header.is_buffered() {
                            free_cell(AllocCategory::Anon, p);
                        }
                    } else {
                        queue_anonymous_object(v);
                    }
                } else {
                    gc_possible_root(v);
                }
            }
            Var::Anon(None) => {}
            _ => panic!("complex_free_var: {} is not a complex value", v.type_name()),
        }
    }
}

/// Duplication: produce a value with its own independent ownership.
///
/// Scalars copy trivially. Anonymous objects have unique identity and
/// cannot be value-copied; duplicating one aborts.
#[inline]
pub fn var_dup(v: Var) -> Var {
    if v.is_complex() { complex_var_dup(v) } else { v }
}

/// Duplication for heap-backed variants only.
pub fn complex_var_dup(v: Var) -> Var {
    match v {
        Var::Str(p) => string::str_dup(p),
        // Safety: handle points at a live cell.
        Var::Float(p) => new_float(unsafe { p.as_ref() }.value()),
        Var::List(p) => list::list_dup(p),
        Var::Map(p) => map::map_dup(p),
        Var::Iter(p) => iter::iter_dup(p),
        Var::Anon(_) => panic!("cannot var_dup() anonymous objects"),
        _ => panic!("complex_var_dup: {} is not a complex value", v.type_name()),
    }
}

/// Observable reference count. Scalars (and detached Anon handles) report
/// 1: there is exactly the copy you are holding.
pub fn var_refcount(v: Var) -> u32 {
    match v.header() {
        // Safety: header projection of a live cell.
        Some(h) => unsafe { h.as_ref() }.refcount(),
        None => 1,
    }
}
