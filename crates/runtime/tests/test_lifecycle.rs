//! End-to-end tests of the reference lifecycle protocol
//!
//! These drive whole-value scenarios across modules: refcount identity,
//! deferred frees of buffered cells, and the anonymous-object state
//! machine with its exactly-once quota refund.

use hearth_core::{AllocCategory, alloc_registry};
use hearth_runtime::{
    FLAG_INVALID, FLAG_RECYCLED, Var, aux_free, equality, free_var, from_vec, gc_clear_buffered,
    gc_is_buffered, mapinsert, new_anon, new_map, new_str, pending_recycle_len, quota_entry,
    reset_quota_ledger, set_invalid, set_recycled, take_destroyed_objects, take_pending_recycle,
    take_possible_roots, var_ref, var_refcount,
};
use serial_test::serial;

fn has_flag(v: Var, flag: u8) -> bool {
    match v {
        Var::Anon(Some(p)) => unsafe { p.as_ref() }.has_flag(flag),
        _ => false,
    }
}

/// Tracer stand-in: drain the possible-roots buffer, unbuffer live cells,
/// free dead ones.
fn sweep_possible_roots() {
    for root in take_possible_roots() {
        gc_clear_buffered(root);
        if var_refcount(root) == 0 {
            aux_free(root);
        }
    }
}

#[test]
fn test_increment_decrement_leaves_value_unchanged() {
    let m = mapinsert(new_map(), new_str("depth"), Var::Int(9));
    let v = from_vec(vec![Var::Int(1), new_str("two"), m]);
    let twin = from_vec(vec![
        Var::Int(1),
        new_str("two"),
        mapinsert(new_map(), new_str("depth"), Var::Int(9)),
    ]);

    assert_eq!(var_refcount(v), 1);
    let alias = var_ref(v);
    assert_eq!(var_refcount(v), 2);
    free_var(alias);
    assert_eq!(var_refcount(v), 1);
    assert!(equality(v, twin, true));

    free_var(v);
    free_var(twin);
}

#[test]
#[serial]
fn test_buffered_cell_is_freed_exactly_once() {
    let live_before = alloc_registry().live(AllocCategory::List);
    let str_before = alloc_registry().live(AllocCategory::Str);

    let l = from_vec(vec![new_str("elem")]);
    let alias = var_ref(l);
    // First release leaves one reference and buffers the cell as a
    // possible cycle root.
    free_var(alias);
    assert!(gc_is_buffered(l));
    // Final release destroys the children but must leave the buffered
    // cell's storage to the sweep.
    free_var(l);
    assert_eq!(alloc_registry().live(AllocCategory::Str), str_before);
    assert_eq!(alloc_registry().live(AllocCategory::List), live_before + 1);

    sweep_possible_roots();
    assert_eq!(alloc_registry().live(AllocCategory::List), live_before);
}

#[test]
#[serial]
fn test_invalid_anon_refunds_quota_exactly_once() {
    reset_quota_ledger();
    let anon_before = alloc_registry().live(AllocCategory::Anon);

    let a = new_anon(77);
    let b = var_ref(a);
    let c = var_ref(a);
    set_invalid(a);

    // Two non-final releases buffer the cell but never touch the quota.
    free_var(c);
    free_var(b);
    assert_eq!(quota_entry(77).refunds, 0);
    sweep_possible_roots();

    // Final release takes the Invalid path: refund, destroy, free.
    free_var(a);
    assert_eq!(quota_entry(77).charges, 1);
    assert_eq!(quota_entry(77).refunds, 1);
    assert_eq!(take_destroyed_objects(), vec![77]);
    assert_eq!(alloc_registry().live(AllocCategory::Anon), anon_before);
}

#[test]
#[serial]
fn test_recycle_path_frees_without_refund() {
    reset_quota_ledger();
    let anon_before = alloc_registry().live(AllocCategory::Anon);

    let v = new_anon(5);
    // First zero with neither flag set queues the value instead of
    // freeing it; the queue holds its own reference.
    free_var(v);
    assert_eq!(pending_recycle_len(), 1);
    assert_eq!(alloc_registry().live(AllocCategory::Anon), anon_before + 1);

    for pending in take_pending_recycle() {
        assert!(!has_flag(pending, FLAG_RECYCLED));
        set_recycled(pending);
        free_var(pending);
    }

    // Recycling is not a destruction: no refund, no destroy record.
    assert_eq!(quota_entry(5).refunds, 0);
    assert!(take_destroyed_objects().is_empty());
    assert_eq!(alloc_registry().live(AllocCategory::Anon), anon_before);
}

#[test]
#[serial]
fn test_reference_taken_during_pending_recycle() {
    let anon_before = alloc_registry().live(AllocCategory::Anon);

    let v = new_anon(6);
    free_var(v);
    let pending = take_pending_recycle();
    assert_eq!(pending.len(), 1);
    let v = pending[0];

    // The finalizer hands the value back out before recycling completes.
    let escaped = var_ref(v);
    set_recycled(v);
    free_var(v);
    // Still referenced: buffered as a possible root, not freed.
    assert_eq!(var_refcount(escaped), 1);
    assert!(gc_is_buffered(escaped));
    sweep_possible_roots();
    assert!(!gc_is_buffered(escaped));

    // The escaped reference's release finds Recycled set and frees.
    free_var(escaped);
    assert_eq!(alloc_registry().live(AllocCategory::Anon), anon_before);
}

#[test]
fn test_invalid_flag_wins_only_after_recycled_is_absent() {
    // Both flags set: the Recycled branch is checked first, so no refund
    // happens on release.
    reset_quota_ledger();
    let v = new_anon(8);
    set_recycled(v);
    set_invalid(v);
    assert!(has_flag(v, FLAG_RECYCLED));
    assert!(has_flag(v, FLAG_INVALID));
    free_var(v);
    assert_eq!(quota_entry(8).refunds, 0);
    assert!(take_destroyed_objects().is_empty());
}
