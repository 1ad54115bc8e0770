//! Hearth Core: managed-cell primitives for the Hearth object runtime
//!
//! This crate provides the language-agnostic pieces underneath the Var
//! value type: the refcounted cell header with its cycle-collector
//! metadata, category-tagged allocation accounting, and the reusable byte
//! stream used by hot conversion paths.
//!
//! # Modules
//!
//! - `cell`: refcount + tri-color mark + buffered flag for heap cells
//! - `alloc`: category-tagged allocate/free with live-cell accounting
//! - `stream`: growable, reusable byte accumulation buffer

pub mod alloc;
pub mod cell;
pub mod stream;

// Re-export key types and functions
pub use alloc::{
    AggregateAllocStats, AllocCategory, AllocRegistry, alloc_cell, alloc_registry, free_cell,
};
pub use cell::{CellHeader, Color};
pub use stream::Stream;
