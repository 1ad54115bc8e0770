//! Hearth Runtime: the value core of a multi-user scripting server
//!
//! Key design principles:
//! - Var: one tagged value spanning copy-trivial scalars and refcounted cells
//! - lifecycle: var_ref / free_var / var_dup are the only ownership choke points
//! - gc: this core keeps the per-cell state a deferred cycle tracer needs,
//!   never tracing itself

pub mod anon;
pub mod binary;
pub mod compare;
pub mod dbio;
pub mod error;
pub mod gc;
pub mod iter;
pub mod lifecycle;
pub mod list;
pub mod map;
pub mod quota;
pub mod serialize;
pub mod string;
pub mod strutil;
pub mod value;

// Re-export key types and functions
pub use error::ErrCode;
pub use value::{FloatCell, NOTHING, Objid, Var, new_float, value_bytes};

// The lifecycle protocol (the only way to change a value's ownership)
pub use lifecycle::{
    complex_free_var, complex_var_dup, complex_var_ref, free_var, var_dup, var_ref, var_refcount,
};

// Truthiness, equality, ordering
pub use compare::{compare, equality, is_true};

// Cycle-tracer client surface
pub use gc::{
    Color, aux_free, gc_clear_buffered, gc_get_color, gc_is_buffered, gc_possible_root,
    gc_set_color, possible_roots_len, take_possible_roots,
};

// Anonymous-object lifecycle and its collaborators
pub use anon::{
    AnonCell, FLAG_INVALID, FLAG_RECYCLED, new_anon, pending_recycle_len, set_invalid,
    set_recycled, take_destroyed_objects, take_pending_recycle,
};
pub use quota::{QuotaEntry, charge_quota, incr_quota, quota_entry, reset_quota_ledger};

// Containers and strings
pub use iter::{IterCell, iter_dup, new_iter};
pub use list::{
    ListCell, from_raw_slots, from_vec, list_dup, list_sizeof, listequal, listlength, new_list,
};
pub use map::{
    MapCell, from_pairs, map_dup, map_sizeof, mapempty, mapequal, mapinsert, maplength, maplookup,
    new_map,
};
pub use string::{StrCell, memo_strlen, new_str, new_str_owned, str_dup, str_ref};

// Byte codec and case-folded string utilities
pub use binary::{binary_to_raw_bytes, clean_bytes, raw_bytes_to_binary};
pub use strutil::{casecmp, caseeq, ncasecmp, str_hash, strindex, strrindex, strsub, verbcasecmp};

// Persistence (for exchange with the database layer and external systems)
pub use dbio::{DbIoError, read_var, write_var};
pub use serialize::{SerializeError, TypedVar, VarSerialize};
