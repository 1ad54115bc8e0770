//! Line-oriented value persistence
//!
//! The flat-file database format: one type-tag line, then payload lines.
//! Lists and maps are length-prefixed and recurse. An iterator is written
//! as its current key (or Clear when exhausted) so a suspended traversal
//! resumes by seeking that key; it is never reconstructed as a cursor.
//! Anonymous objects have no stable representation at this layer and are
//! rejected; the object database persists them itself.
//!
//! Readers return owned values: every Var handed back carries a fresh
//! reference the caller must eventually `free_var`.

use crate::error::ErrCode;
use crate::lifecycle::free_var;
use crate::list::from_vec;
use crate::map::from_pairs;
use crate::string::new_str;
use crate::value::{Var, new_float};
use std::fmt;
use std::io::{self, BufRead, Write};

/// Failure reading or writing the flat-file value format.
#[derive(Debug)]
pub enum DbIoError {
    Io(io::Error),
    /// Input ended in the middle of a value.
    UnexpectedEof,
    /// A line that should hold a number did not parse.
    BadNumber(String),
    /// A type tag that names no persistable type.
    BadTypeTag(i64),
    /// An error-code number outside the defined set.
    BadErrCode(i64),
    /// Anonymous objects cannot pass through this layer.
    UnrepresentableAnon,
}

impl fmt::Display for DbIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbIoError::Io(e) => write!(f, "i/o error: {e}"),
            DbIoError::UnexpectedEof => write!(f, "unexpected end of input"),
            DbIoError::BadNumber(line) => write!(f, "expected a number, got {line:?}"),
            DbIoError::BadTypeTag(tag) => write!(f, "unknown type tag {tag}"),
            DbIoError::BadErrCode(code) => write!(f, "unknown error code {code}"),
            DbIoError::UnrepresentableAnon => {
                write!(f, "anonymous objects are not representable in the database format")
            }
        }
    }
}

impl std::error::Error for DbIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DbIoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DbIoError {
    fn from(e: io::Error) -> Self {
        DbIoError::Io(e)
    }
}

fn write_num<W: Write>(w: &mut W, n: i64) -> Result<(), DbIoError> {
    writeln!(w, "{n}")?;
    Ok(())
}

/// Write one value in the flat-file format.
pub fn write_var<W: Write>(w: &mut W, v: Var) -> Result<(), DbIoError> {
    // Safety throughout: handles inside a live Var point at live cells.
    match v {
        Var::Clear | Var::None => write_num(w, v.type_code()),
        Var::Int(n) => {
            write_num(w, v.type_code())?;
            write_num(w, n)
        }
        Var::Obj(o) => {
            write_num(w, v.type_code())?;
            write_num(w, o)
        }
        Var::Err(e) => {
            write_num(w, v.type_code())?;
            write_num(w, e.code())
        }
        Var::Str(p) => {
            write_num(w, v.type_code())?;
            writeln!(w, "{}", unsafe { p.as_ref() }.text())?;
            Ok(())
        }
        Var::Float(p) => {
            write_num(w, v.type_code())?;
            writeln!(w, "{:?}", unsafe { p.as_ref() }.value())?;
            Ok(())
        }
        Var::List(p) => {
            write_num(w, v.type_code())?;
            let cell = unsafe { p.as_ref() };
            write_num(w, cell.length() as i64)?;
            for &elem in cell.elements() {
                write_var(w, elem)?;
            }
            Ok(())
        }
        Var::Map(p) => {
            write_num(w, v.type_code())?;
            let cell = unsafe { p.as_ref() };
            write_num(w, cell.len() as i64)?;
            for &(k, val) in cell.pairs() {
                write_var(w, k)?;
                write_var(w, val)?;
            }
            Ok(())
        }
        Var::Iter(p) => match unsafe { p.as_ref() }.get() {
            Some((key, _)) => write_var(w, key),
            None => write_var(w, Var::Clear),
        },
        Var::Anon(_) => Err(DbIoError::UnrepresentableAnon),
    }
}

fn read_line<R: BufRead>(r: &mut R) -> Result<String, DbIoError> {
    let mut line = String::new();
    if r.read_line(&mut line)? == 0 {
        return Err(DbIoError::UnexpectedEof);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

fn read_num<R: BufRead>(r: &mut R) -> Result<i64, DbIoError> {
    let line = read_line(r)?;
    line.trim().parse().map_err(|_| {
        tracing::error!(line, "database load: expected a number");
        DbIoError::BadNumber(line)
    })
}

fn read_float<R: BufRead>(r: &mut R) -> Result<f64, DbIoError> {
    let line = read_line(r)?;
    line.trim().parse().map_err(|_| {
        tracing::error!(line, "database load: expected a float");
        DbIoError::BadNumber(line)
    })
}

fn read_count<R: BufRead>(r: &mut R) -> Result<usize, DbIoError> {
    let n = read_num(r)?;
    usize::try_from(n).map_err(|_| DbIoError::BadNumber(n.to_string()))
}

/// Read one value in the flat-file format. The result is owned.
pub fn read_var<R: BufRead>(r: &mut R) -> Result<Var, DbIoError> {
    let tag = read_num(r)?;
    match tag {
        t if t == Var::Clear.type_code() => Ok(Var::Clear),
        t if t == Var::None.type_code() => Ok(Var::None),
        0 => Ok(Var::Int(read_num(r)?)),
        1 => Ok(Var::Obj(read_num(r)?)),
        3 => {
            let code = read_num(r)?;
            ErrCode::from_code(code)
                .map(Var::Err)
                .ok_or(DbIoError::BadErrCode(code))
        }
        2 => Ok(new_str(&read_line(r)?)),
        9 => Ok(new_float(read_float(r)?)),
        4 => {
            let n = read_count(r)?;
            let mut elems = Vec::with_capacity(n);
            for _ in 0..n {
                match read_var(r) {
                    Ok(v) => elems.push(v),
                    Err(e) => {
                        for v in elems {
                            free_var(v);
                        }
                        return Err(e);
                    }
                }
            }
            Ok(from_vec(elems))
        }
        10 => {
            let n = read_count(r)?;
            let mut pairs = Vec::with_capacity(n);
            let free_pairs = |pairs: Vec<(Var, Var)>| {
                for (k, v) in pairs {
                    free_var(k);
                    free_var(v);
                }
            };
            for _ in 0..n {
                let key = match read_var(r) {
                    Ok(k) => k,
                    Err(e) => {
                        free_pairs(pairs);
                        return Err(e);
                    }
                };
                match read_var(r) {
                    Ok(v) => pairs.push((key, v)),
                    Err(e) => {
                        free_var(key);
                        free_pairs(pairs);
                        return Err(e);
                    }
                }
            }
            Ok(from_pairs(pairs))
        }
        other => {
            tracing::error!(tag = other, "database load: unknown type tag");
            Err(DbIoError::BadTypeTag(other))
        }
    }
}
