//! Map cells
//!
//! An ordered key→value structure over Var keys and values, refcounted
//! with copy-on-write semantics for callers: inserting through a shared
//! handle leaves other aliases untouched. Pairs keep insertion order;
//! key lookup uses case-sensitive structural equality.
//!
//! Map cells participate in cycle collection exactly like list cells.

use crate::compare::equality;
use crate::lifecycle::{free_var, var_ref};
use crate::value::Var;
use hearth_core::{AllocCategory, CellHeader, alloc_cell};
use std::ptr::NonNull;

/// Refcounted map cell: insertion-ordered key/value pairs.
#[derive(Debug)]
pub struct MapCell {
    pub(crate) header: CellHeader,
    pairs: Vec<(Var, Var)>,
}

impl MapCell {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(Var, Var)] {
        &self.pairs
    }
}

/// Allocate an empty map with refcount 1.
pub fn new_map() -> Var {
    Var::Map(alloc_cell(
        AllocCategory::Map,
        MapCell {
            header: CellHeader::new(),
            pairs: Vec::new(),
        },
    ))
}

/// Build a map from owned pairs. Keys are assumed distinct; use
/// `mapinsert` when that is not known.
pub fn from_pairs(pairs: Vec<(Var, Var)>) -> Var {
    Var::Map(alloc_cell(
        AllocCategory::Map,
        MapCell {
            header: CellHeader::new(),
            pairs,
        },
    ))
}

/// Insert a pair, consuming one reference to `map` and ownership of
/// `key`/`value`, and returning the resulting map.
///
/// A uniquely held map is updated in place. A shared map is first
/// duplicated (copy-on-write) so the mutation is never observable through
/// other aliases. An existing equal key has its pair replaced in place.
pub fn mapinsert(map: Var, key: Var, value: Var) -> Var {
    let p = match map {
        Var::Map(p) => p,
        _ => panic!("mapinsert: not a map"),
    };
    // Safety: handle points at a live cell.
    let target = if unsafe { p.as_ref() }.header.refcount() > 1 {
        let dup = map_dup(p);
        free_var(map);
        dup
    } else {
        map
    };
    let tp = match target {
        Var::Map(tp) => tp,
        _ => unreachable!(),
    };
    // Safety: target is uniquely held here, so the mutable access is sole.
    let pairs = unsafe { &mut (*tp.as_ptr()).pairs };
    for pair in pairs.iter_mut() {
        if equality(pair.0, key, true) {
            let (old_key, old_value) = std::mem::replace(pair, (key, value));
            free_var(old_key);
            free_var(old_value);
            return target;
        }
    }
    pairs.push((key, value));
    target
}

/// Look up `key`, returning a borrowed (uncounted) view of the value.
pub fn maplookup(p: NonNull<MapCell>, key: Var, case_matters: bool) -> Option<Var> {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }
        .pairs()
        .iter()
        .find(|(k, _)| equality(*k, key, case_matters))
        .map(|&(_, v)| v)
}

/// Release every pair of a map whose count has reached zero.
///
/// Pairs are detached before any child is freed so re-entrant release
/// chains never see a half-released map. Cell storage is left for the
/// caller (or the buffered sweep).
pub fn destroy_map(p: NonNull<MapCell>) {
    // Safety: count is zero, so this is the only live access to the cell.
    let pairs = std::mem::take(unsafe { &mut (*p.as_ptr()).pairs });
    for (k, v) in pairs {
        free_var(k);
        free_var(v);
    }
}

/// Structurally independent copy referencing the same keys and values.
pub fn map_dup(p: NonNull<MapCell>) -> Var {
    // Safety: handle points at a live cell.
    let src = unsafe { p.as_ref() };
    let pairs = src
        .pairs()
        .iter()
        .map(|&(k, v)| (var_ref(k), var_ref(v)))
        .collect();
    from_pairs(pairs)
}

/// Structural equality: same pairs in the same order, comparing keys and
/// values with the given case flag.
pub fn mapequal(a: NonNull<MapCell>, b: NonNull<MapCell>, case_matters: bool) -> bool {
    if a.as_ptr() == b.as_ptr() {
        return true;
    }
    // Safety: handles point at live cells.
    let (a, b) = unsafe { (a.as_ref(), b.as_ref()) };
    if a.len() != b.len() {
        return false;
    }
    a.pairs().iter().zip(b.pairs()).all(|(&(ak, av), &(bk, bv))| {
        equality(ak, bk, case_matters) && equality(av, bv, case_matters)
    })
}

/// Empty-check used by conditional truth.
pub fn mapempty(p: NonNull<MapCell>) -> bool {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }.is_empty()
}

/// Pair count.
pub fn maplength(p: NonNull<MapCell>) -> usize {
    // Safety: handle points at a live cell.
    unsafe { p.as_ref() }.len()
}

/// Storage footprint of the cell and its pair array, in bytes.
pub fn map_sizeof(p: NonNull<MapCell>) -> usize {
    // Safety: handle points at a live cell.
    let cell = unsafe { p.as_ref() };
    std::mem::size_of::<MapCell>() + cell.pairs.capacity() * std::mem::size_of::<(Var, Var)>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::var_refcount;
    use crate::string::new_str;

    fn cell(v: Var) -> NonNull<MapCell> {
        match v {
            Var::Map(p) => p,
            _ => panic!("expected Map"),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let m = new_map();
        let m = mapinsert(m, new_str("name"), new_str("wizard"));
        let m = mapinsert(m, Var::Int(7), Var::Int(49));
        assert_eq!(maplength(cell(m)), 2);
        match maplookup(cell(m), Var::Int(7), true) {
            Some(Var::Int(49)) => {}
            other => panic!("unexpected lookup result: {other:?}"),
        }
        free_var(m);
    }

    #[test]
    fn test_insert_replaces_equal_key() {
        let m = new_map();
        let m = mapinsert(m, new_str("k"), Var::Int(1));
        let m = mapinsert(m, new_str("k"), Var::Int(2));
        assert_eq!(maplength(cell(m)), 1);
        let probe = new_str("k");
        match maplookup(cell(m), probe, true) {
            Some(Var::Int(2)) => {}
            other => panic!("unexpected lookup result: {other:?}"),
        }
        free_var(probe);
        free_var(m);
    }

    #[test]
    fn test_insert_through_shared_handle_copies() {
        let m = new_map();
        let m = mapinsert(m, Var::Int(1), Var::Int(10));
        let alias = var_ref(m);
        let updated = mapinsert(m, Var::Int(2), Var::Int(20));
        // The alias still sees the one-pair map.
        assert_eq!(maplength(cell(alias)), 1);
        assert_eq!(maplength(cell(updated)), 2);
        assert_eq!(var_refcount(alias), 1);
        free_var(alias);
        free_var(updated);
    }

    #[test]
    fn test_mapequal() {
        let a = from_pairs(vec![(new_str("A"), Var::Int(1))]);
        let b = from_pairs(vec![(new_str("a"), Var::Int(1))]);
        assert!(!mapequal(cell(a), cell(b), true));
        assert!(mapequal(cell(a), cell(b), false));
        free_var(a);
        free_var(b);
    }
}
