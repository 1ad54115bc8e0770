//! Var: the tagged dynamic value exchanged throughout the runtime
//!
//! A `Var` is either an inline scalar (integers, object ids, error codes,
//! the Clear/None sentinels) or a handle to a refcounted heap cell
//! (strings, boxed floats, lists, maps, iterators, anonymous objects).
//! `Var` itself is `Copy`: copying a handle never touches a reference
//! count. Every ownership change goes through `var_ref`/`free_var` in the
//! `lifecycle` module; that discipline, not the type system, is what keeps
//! the counts balanced.
//!
//! # Safety invariants
//!
//! - A heap handle inside a live `Var` always points at a cell allocated by
//!   its owning module and not yet freed.
//! - After `free_var` consumes the last reference, every remaining copy of
//!   that `Var` is dangling and must not be used.
//! - Exactly one logical task mutates the value graph at a time.

use crate::anon::AnonCell;
use crate::error::ErrCode;
use crate::iter::IterCell;
use crate::list::{self, ListCell};
use crate::map::{self, MapCell};
use crate::string::{self, StrCell};
use hearth_core::{AllocCategory, CellHeader, alloc_cell};
use std::ptr::NonNull;

/// Object id. Negative ids are reserved for system sentinels.
pub type Objid = i64;

/// The id conventionally used for "no object".
pub const NOTHING: Objid = -1;

/// The tagged dynamic value.
#[derive(Debug, Clone, Copy)]
pub enum Var {
    /// Unassigned property slot sentinel
    Clear,
    /// Unassigned variable sentinel
    None,
    Int(i64),
    Obj(Objid),
    Err(ErrCode),
    Str(NonNull<StrCell>),
    Float(NonNull<FloatCell>),
    List(NonNull<ListCell>),
    Map(NonNull<MapCell>),
    Iter(NonNull<IterCell>),
    /// Anonymous object handle; `None` means already finalized/detached.
    Anon(Option<NonNull<AnonCell>>),
}

impl Var {
    /// Stable type discriminant used by cross-type ordering and the
    /// persistence format. Codes 7 and 8 are reserved for the
    /// interpreter's catch/finally markers.
    pub fn type_code(self) -> i64 {
        match self {
            Var::Int(_) => 0,
            Var::Obj(_) => 1,
            Var::Str(_) => 2,
            Var::Err(_) => 3,
            Var::List(_) => 4,
            Var::Clear => 5,
            Var::None => 6,
            Var::Float(_) => 9,
            Var::Map(_) => 10,
            Var::Iter(_) => 11,
            Var::Anon(_) => 12,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Var::Clear => "clear",
            Var::None => "none",
            Var::Int(_) => "int",
            Var::Obj(_) => "obj",
            Var::Err(_) => "err",
            Var::Str(_) => "str",
            Var::Float(_) => "float",
            Var::List(_) => "list",
            Var::Map(_) => "map",
            Var::Iter(_) => "iter",
            Var::Anon(_) => "anon",
        }
    }

    /// True for variants whose payload lives in a refcounted heap cell.
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Var::Str(_) | Var::Float(_) | Var::List(_) | Var::Map(_) | Var::Iter(_) | Var::Anon(_)
        )
    }

    /// The cell header, for variants that have one. A detached Anon handle
    /// has no cell and returns `None`.
    pub(crate) fn header(self) -> Option<NonNull<CellHeader>> {
        // Safety: handles inside a live Var point at live cells; the header
        // projection does not outlive the raw pointer it came from.
        unsafe {
            match self {
                Var::Str(p) => Some(NonNull::from(&(*p.as_ptr()).header)),
                Var::Float(p) => Some(NonNull::from(&(*p.as_ptr()).header)),
                Var::List(p) => Some(NonNull::from(&(*p.as_ptr()).header)),
                Var::Map(p) => Some(NonNull::from(&(*p.as_ptr()).header)),
                Var::Iter(p) => Some(NonNull::from(&(*p.as_ptr()).header)),
                Var::Anon(Some(p)) => Some(NonNull::from(&(*p.as_ptr()).header)),
                _ => None,
            }
        }
    }
}

/// Boxed double: a refcounted cell holding one `f64`. Never cyclic.
#[derive(Debug)]
pub struct FloatCell {
    pub(crate) header: CellHeader,
    value: f64,
}

impl FloatCell {
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Allocate a fresh boxed double with refcount 1.
pub fn new_float(value: f64) -> Var {
    Var::Float(alloc_cell(
        AllocCategory::Float,
        FloatCell {
            header: CellHeader::new(),
            value,
        },
    ))
}

/// Approximate memory footprint of a value, in bytes.
///
/// Counts the `Var` itself plus owned payload storage; shared children are
/// counted as if owned (this is a diagnostic figure, not an accounting
/// one).
pub fn value_bytes(v: Var) -> usize {
    let size = std::mem::size_of::<Var>();
    match v {
        Var::Str(p) => size + string::memo_strlen(p) + 1,
        Var::Float(_) => size + std::mem::size_of::<f64>(),
        Var::List(p) => size + list::list_sizeof(p),
        Var::Map(p) => size + map::map_sizeof(p),
        _ => size,
    }
}
