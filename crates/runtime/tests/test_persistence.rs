//! Round-trip tests for the two persistence surfaces
//!
//! The flat-file format (`dbio`) through a real temp file, and the
//! `TypedVar` bincode snapshot mirror.

use hearth_runtime::{
    DbIoError, ErrCode, SerializeError, TypedVar, Var, VarSerialize, equality, free_var, from_vec,
    mapinsert, new_anon, new_float, new_map, new_str, read_var, write_var,
};
use std::fs::File;
use std::io::{BufReader, Seek, Write};
use tempfile::tempfile;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn sample_values() -> Vec<Var> {
    vec![
        Var::Int(-7),
        Var::Obj(2),
        Var::Clear,
        Var::None,
        Var::Err(ErrCode::Quota),
        new_str("a string with spaces"),
        new_float(-2.75),
        from_vec(vec![Var::Int(1), from_vec(vec![new_str("nested")])]),
        mapinsert(new_map(), new_str("key"), Var::Int(42)),
    ]
}

#[test]
fn test_dbio_round_trip_through_file() {
    init_tracing();
    let values = sample_values();

    let mut file: File = tempfile().unwrap();
    for &v in &values {
        write_var(&mut file, v).unwrap();
    }
    file.flush().unwrap();
    file.rewind().unwrap();

    let mut reader = BufReader::new(file);
    for &v in &values {
        let back = read_var(&mut reader).unwrap();
        assert!(equality(v, back, true), "mismatch for {}", v.type_name());
        free_var(back);
    }
    // The file is exhausted exactly at the last value.
    assert!(matches!(
        read_var(&mut reader),
        Err(DbIoError::UnexpectedEof)
    ));

    for v in values {
        free_var(v);
    }
}

#[test]
fn test_dbio_rejects_garbage_mid_stream() {
    init_tracing();
    let mut file: File = tempfile().unwrap();
    write_var(&mut file, Var::Int(1)).unwrap();
    writeln!(file, "4\n3\n0\n11\nnot a number").unwrap();
    file.rewind().unwrap();

    let mut reader = BufReader::new(file);
    let ok = read_var(&mut reader).unwrap();
    assert!(matches!(ok, Var::Int(1)));
    // The half-read list must fail cleanly, not panic or leak.
    assert!(matches!(
        read_var(&mut reader),
        Err(DbIoError::BadNumber(_))
    ));
}

#[test]
fn test_typed_var_snapshot_round_trip() {
    let values = sample_values();
    for &v in &values {
        let bytes = v.to_bytes().unwrap();
        let back = TypedVar::from_bytes(&bytes).unwrap().to_var();
        assert!(equality(v, back, true), "mismatch for {}", v.type_name());
        free_var(back);
    }
    for v in values {
        free_var(v);
    }
}

#[test]
fn test_typed_var_rejects_runtime_state() {
    let a = new_anon(1);
    assert!(matches!(
        a.to_typed(),
        Err(SerializeError::AnonNotSerializable)
    ));
}

#[test]
fn test_snapshot_bytes_are_deterministic() {
    let m = mapinsert(new_map(), new_str("a"), Var::Int(1));
    let m = mapinsert(m, new_str("b"), Var::Int(2));
    let first = m.to_bytes().unwrap();
    let second = m.to_bytes().unwrap();
    assert_eq!(first, second);
    free_var(m);
}
