//! Truthiness, equality, ordering
//!
//! Three distinct relations with deliberately different reach:
//! - `is_true` is total over every variant.
//! - `equality` is total but type-strict: differing discriminants are
//!   simply unequal, and anonymous objects compare by handle identity
//!   only.
//! - `compare` is partial: Int, Obj, Err, Str, Float order naturally;
//!   calling it on a collection or anonymous object is a runtime bug and
//!   aborts. Mixed-type operands fall back to a stable ordering by type
//!   code with no domain meaning.
//!
//! # Design
//!
//! Truthiness of a list reads the numeric field of the first stored slot,
//! the literal length sentinel, rather than asking for the length. The two
//! agree for every list built through this crate, but the raw-slot rule is
//! the observable behavior and is pinned by tests.

use crate::list::listequal;
use crate::map::mapequal;
use crate::strutil::{caseeq, casecmp};
use crate::value::Var;
use std::cmp::Ordering;
use std::ptr::NonNull;

fn numeric_field(v: Var) -> i64 {
    match v {
        Var::Int(n) => n,
        Var::Obj(o) => o,
        Var::Err(e) => e.code(),
        _ => 0,
    }
}

/// Conditional-evaluation truth of a value.
pub fn is_true(v: Var) -> bool {
    // Safety throughout: handles inside a live Var point at live cells.
    match v {
        Var::Int(n) => n != 0,
        Var::Float(p) => unsafe { p.as_ref() }.value() != 0.0,
        Var::Str(p) => !unsafe { p.as_ref() }.is_empty(),
        Var::List(p) => numeric_field(unsafe { p.as_ref() }.first_slot()) != 0,
        Var::Map(p) => !unsafe { p.as_ref() }.is_empty(),
        _ => false,
    }
}

fn str_bytes<'a>(p: NonNull<crate::string::StrCell>) -> &'a [u8] {
    // Safety: handle points at a live cell; text is immutable for the
    // cell's lifetime.
    unsafe { p.as_ref() }.text().as_bytes()
}

/// Structural (or, for Anon, identity) equality.
///
/// False immediately when the type discriminants differ. `case_matters`
/// threads recursively through Str comparisons inside collections.
pub fn equality(lhs: Var, rhs: Var, case_matters: bool) -> bool {
    match (lhs, rhs) {
        (Var::Clear, Var::Clear) => true,
        (Var::None, Var::None) => true,
        (Var::Int(a), Var::Int(b)) => a == b,
        (Var::Obj(a), Var::Obj(b)) => a == b,
        (Var::Err(a), Var::Err(b)) => a == b,
        (Var::Float(a), Var::Float(b)) => {
            // Identity fast path: shared storage is equal even for NaN.
            a.as_ptr() == b.as_ptr()
                // Safety: handles point at live cells.
                || unsafe { a.as_ref() }.value() == unsafe { b.as_ref() }.value()
        }
        (Var::Str(a), Var::Str(b)) => {
            a.as_ptr() == b.as_ptr()
                || if case_matters {
                    str_bytes(a) == str_bytes(b)
                } else {
                    caseeq(str_bytes(a), str_bytes(b))
                }
        }
        (Var::List(a), Var::List(b)) => listequal(a, b, case_matters),
        (Var::Map(a), Var::Map(b)) => mapequal(a, b, case_matters),
        // Unique identity: visible state never makes two handles equal.
        (Var::Anon(a), Var::Anon(b)) => {
            a.map(NonNull::as_ptr) == b.map(NonNull::as_ptr)
        }
        (Var::Iter(a), Var::Iter(b)) => a.as_ptr() == b.as_ptr(),
        _ => false,
    }
}

/// Total order over Int, Obj, Err, Str, Float.
///
/// Mixed-type operands order by type code: stable, sufficient for sort
/// stability, semantically arbitrary. Collections and anonymous objects
/// abort.
pub fn compare(lhs: Var, rhs: Var, case_matters: bool) -> Ordering {
    match (lhs, rhs) {
        (Var::Int(a), Var::Int(b)) => a.cmp(&b),
        (Var::Obj(a), Var::Obj(b)) => a.cmp(&b),
        (Var::Err(a), Var::Err(b)) => a.code().cmp(&b.code()),
        (Var::Float(a), Var::Float(b)) => {
            if a.as_ptr() == b.as_ptr() {
                return Ordering::Equal;
            }
            // Safety: handles point at live cells.
            let (x, y) = unsafe { (a.as_ref().value(), b.as_ref().value()) };
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Var::Str(a), Var::Str(b)) => {
            if a.as_ptr() == b.as_ptr() {
                return Ordering::Equal;
            }
            if case_matters {
                str_bytes(a).cmp(str_bytes(b))
            } else {
                casecmp(str_bytes(a), str_bytes(b))
            }
        }
        (Var::List(_), Var::List(_))
        | (Var::Map(_), Var::Map(_))
        | (Var::Iter(_), Var::Iter(_))
        | (Var::Anon(_), Var::Anon(_)) => {
            panic!("compare: {} values have no ordering", lhs.type_name())
        }
        (Var::Clear, Var::Clear) | (Var::None, Var::None) => Ordering::Equal,
        _ => lhs.type_code().cmp(&rhs.type_code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anon::new_anon;
    use crate::lifecycle::free_var;
    use crate::list::{from_raw_slots, from_vec};
    use crate::map::{mapinsert, new_map};
    use crate::string::new_str;
    use crate::value::new_float;

    #[test]
    fn test_truthiness_of_scalars() {
        assert!(!is_true(Var::Int(0)));
        assert!(is_true(Var::Int(-3)));
        assert!(!is_true(Var::Obj(5)));
        assert!(!is_true(Var::Clear));
        assert!(!is_true(Var::None));
        let z = new_float(0.0);
        let nz = new_float(0.5);
        assert!(!is_true(z));
        assert!(is_true(nz));
        free_var(z);
        free_var(nz);
    }

    #[test]
    fn test_truthiness_of_strings_and_maps() {
        let empty = new_str("");
        let full = new_str("x");
        assert!(!is_true(empty));
        assert!(is_true(full));
        free_var(empty);
        free_var(full);

        let m0 = new_map();
        assert!(!is_true(m0));
        let m1 = mapinsert(m0, Var::Int(1), Var::Int(2));
        assert!(is_true(m1));
        free_var(m1);
    }

    #[test]
    fn test_list_truth_reads_first_slot_literally() {
        let normal = from_vec(vec![Var::Int(7)]);
        assert!(is_true(normal));
        let empty = from_vec(vec![]);
        assert!(!is_true(empty));
        // A zeroed sentinel makes a populated list falsy.
        let skewed = from_raw_slots(vec![Var::Int(0), Var::Int(7)]);
        assert!(!is_true(skewed));
        free_var(normal);
        free_var(empty);
        free_var(skewed);
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert!(!equality(Var::Int(1), Var::Obj(1), true));
        let f = new_float(1.0);
        assert!(!equality(Var::Int(1), f, true));
        free_var(f);
    }

    #[test]
    fn test_string_equality_folds_case() {
        let a = new_str("Wizard");
        let b = new_str("wizard");
        assert!(equality(a, b, false));
        assert!(!equality(a, b, true));
        assert!(equality(a, a, true));
        free_var(a);
        free_var(b);
    }

    #[test]
    fn test_structural_list_equality() {
        let a = from_vec(vec![Var::Int(1), Var::Int(2)]);
        let b = from_vec(vec![Var::Int(1), Var::Int(2)]);
        let c = from_vec(vec![Var::Int(1), Var::Int(3)]);
        assert!(equality(a, b, true));
        assert!(!equality(a, c, true));
        free_var(a);
        free_var(b);
        free_var(c);
    }

    #[test]
    fn test_anon_equality_is_identity() {
        let a = new_anon(1);
        let b = new_anon(1);
        assert!(equality(a, a, true));
        assert!(!equality(a, b, true));
        assert!(equality(Var::Anon(None), Var::Anon(None), true));
        // Leaked on purpose: these handles never go through the recycle
        // queue in this test.
    }

    #[test]
    fn test_compare_orders_scalars() {
        assert_eq!(compare(Var::Int(3), Var::Int(5), true), Ordering::Less);
        assert_eq!(compare(Var::Obj(9), Var::Obj(2), true), Ordering::Greater);
        let a = new_str("B");
        let b = new_str("b");
        assert_eq!(compare(a, b, false), Ordering::Equal);
        assert_ne!(compare(a, b, true), Ordering::Equal);
        free_var(a);
        free_var(b);
    }

    #[test]
    fn test_compare_mixed_types_uses_type_code() {
        assert_eq!(compare(Var::Int(999), Var::Obj(0), true), Ordering::Less);
        assert_eq!(compare(Var::Obj(0), Var::Int(999), true), Ordering::Greater);
    }

    #[test]
    #[should_panic(expected = "no ordering")]
    fn test_compare_lists_is_fatal() {
        let a = from_vec(vec![Var::Int(1)]);
        let b = from_vec(vec![Var::Int(1)]);
        let _ = compare(a, b, true);
    }
}
