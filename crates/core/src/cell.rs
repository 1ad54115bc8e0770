//! Refcounted cell header shared by every heap-backed value payload.
//!
//! The header carries the three pieces of per-cell state the value-lifetime
//! protocol maintains: the reference count, the tri-color mark, and the
//! buffered flag. The runtime mutates all three through `var_ref`/`free_var`;
//! an external cycle tracer reads them when it sweeps the possible-roots
//! buffer.
//!
//! Counts use `Cell` rather than atomics: exactly one logical task mutates
//! the value graph at a time, so updates never race.

use std::cell::Cell;

/// Tri-color mark used by the incremental cycle collector.
///
/// White = candidate garbage, Gray = being traced, Black = presumed live.
/// Only List, Map, and Anon cells are ever colored; Str/Float/Iter cells
/// carry the field but never participate in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Gray,
    Black,
}

/// Per-cell lifetime state: reference count, color, buffered flag.
///
/// Invariants:
/// - the count is never negative and reaches zero at most once per cell
///   generation (a cell, once released, is never reused)
/// - `buffered` set means the possible-roots buffer owns the cell's storage;
///   the cell must not be freed until an external sweep finalizes it
#[derive(Debug)]
pub struct CellHeader {
    refs: Cell<u32>,
    color: Cell<Color>,
    buffered: Cell<bool>,
}

impl CellHeader {
    /// A fresh cell starts with one reference, colored Black (presumed live).
    pub fn new() -> Self {
        Self {
            refs: Cell::new(1),
            color: Cell::new(Color::Black),
            buffered: Cell::new(false),
        }
    }

    /// Add a reference, returning the new count.
    #[inline]
    pub fn addref(&self) -> u32 {
        let n = self.refs.get() + 1;
        self.refs.set(n);
        n
    }

    /// Drop a reference, returning the new count.
    ///
    /// Panics if the count is already zero; that means a double free.
    #[inline]
    pub fn delref(&self) -> u32 {
        let old = self.refs.get();
        assert!(old > 0, "delref on a cell whose count is already zero");
        let n = old - 1;
        self.refs.set(n);
        n
    }

    /// Current reference count.
    #[inline]
    pub fn refcount(&self) -> u32 {
        self.refs.get()
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color.get()
    }

    #[inline]
    pub fn set_color(&self, color: Color) {
        self.color.set(color);
    }

    #[inline]
    pub fn is_buffered(&self) -> bool {
        self.buffered.get()
    }

    #[inline]
    pub fn set_buffered(&self, buffered: bool) {
        self.buffered.set(buffered);
    }
}

impl Default for CellHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_starts_live() {
        let h = CellHeader::new();
        assert_eq!(h.refcount(), 1);
        assert_eq!(h.color(), Color::Black);
        assert!(!h.is_buffered());
    }

    #[test]
    fn test_addref_delref_balance() {
        let h = CellHeader::new();
        assert_eq!(h.addref(), 2);
        assert_eq!(h.addref(), 3);
        assert_eq!(h.delref(), 2);
        assert_eq!(h.delref(), 1);
        assert_eq!(h.delref(), 0);
    }

    #[test]
    #[should_panic(expected = "already zero")]
    fn test_delref_below_zero_panics() {
        let h = CellHeader::new();
        h.delref();
        h.delref();
    }

    #[test]
    fn test_color_and_buffered_round_trip() {
        let h = CellHeader::new();
        h.set_color(Color::White);
        assert_eq!(h.color(), Color::White);
        h.set_color(Color::Gray);
        assert_eq!(h.color(), Color::Gray);
        h.set_buffered(true);
        assert!(h.is_buffered());
        h.set_buffered(false);
        assert!(!h.is_buffered());
    }
}
