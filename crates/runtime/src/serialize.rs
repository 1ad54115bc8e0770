//! Snapshot serialization of runtime values
//!
//! A serializable mirror of `Var` for state snapshots and exchange with
//! external systems (checkpoints, IPC, test fixtures).
//!
//! # Why TypedVar?
//!
//! The runtime `Var` type holds raw cell handles with manual reference
//! counts, which cannot be serialized directly. `TypedVar` uses owned data
//! and can be serialized with serde/bincode.
//!
//! Iterators (transient traversal state) and anonymous objects (unique
//! identity, owned by the object database) have no meaningful snapshot
//! form and report typed errors. Map entries serialize as an ordered pair
//! list, preserving the runtime map's insertion order so the same logical
//! map always serializes to identical bytes.

use crate::error::ErrCode;
use crate::list::from_vec;
use crate::map::from_pairs;
use crate::string::new_str;
use crate::value::{Var, new_float};
use serde::{Deserialize, Serialize};

/// Error during serialization/deserialization
#[derive(Debug)]
pub enum SerializeError {
    /// Cannot serialize iterators (transient traversal state)
    IterNotSerializable,
    /// Cannot serialize anonymous objects (unique identity)
    AnonNotSerializable,
    /// Bincode encoding/decoding error (preserves original error for debugging)
    BincodeError(Box<bincode::Error>),
    /// Non-finite float (NaN or Infinity)
    NonFiniteFloat(f64),
}

impl std::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializeError::IterNotSerializable => {
                write!(f, "Iterators cannot be serialized - transient traversal state")
            }
            SerializeError::AnonNotSerializable => {
                write!(f, "Anonymous objects cannot be serialized - identity is not data")
            }
            SerializeError::BincodeError(e) => write!(f, "Bincode error: {}", e),
            SerializeError::NonFiniteFloat(v) => {
                write!(f, "Cannot serialize non-finite float: {}", v)
            }
        }
    }
}

impl std::error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerializeError::BincodeError(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<bincode::Error> for SerializeError {
    fn from(e: bincode::Error) -> Self {
        SerializeError::BincodeError(Box::new(e))
    }
}

/// Serializable representation of runtime values
///
/// Mirrors `Var` but uses owned data suitable for serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TypedVar {
    Clear,
    None,
    Int(i64),
    Obj(i64),
    Err(ErrCode),
    Str(String),
    Float(f64),
    List(Vec<TypedVar>),
    /// Ordered key/value pairs, in the runtime map's insertion order
    Map(Vec<(TypedVar, TypedVar)>),
}

impl TypedVar {
    /// Convert from a runtime Var, reading it without taking ownership.
    ///
    /// Returns an error if the value contains:
    /// - An iterator or anonymous object - not serializable
    /// - Non-finite floats (NaN/Infinity) - could cause logic issues
    pub fn from_var(v: Var) -> Result<Self, SerializeError> {
        // Safety throughout: handles inside a live Var point at live cells.
        match v {
            Var::Clear => Ok(TypedVar::Clear),
            Var::None => Ok(TypedVar::None),
            Var::Int(n) => Ok(TypedVar::Int(n)),
            Var::Obj(o) => Ok(TypedVar::Obj(o)),
            Var::Err(e) => Ok(TypedVar::Err(e)),
            Var::Str(p) => Ok(TypedVar::Str(unsafe { p.as_ref() }.text().to_string())),
            Var::Float(p) => {
                let value = unsafe { p.as_ref() }.value();
                if !value.is_finite() {
                    return Err(SerializeError::NonFiniteFloat(value));
                }
                Ok(TypedVar::Float(value))
            }
            Var::List(p) => {
                let elements = unsafe { p.as_ref() }.elements();
                let mut typed = Vec::with_capacity(elements.len());
                for &elem in elements {
                    typed.push(TypedVar::from_var(elem)?);
                }
                Ok(TypedVar::List(typed))
            }
            Var::Map(p) => {
                let pairs = unsafe { p.as_ref() }.pairs();
                let mut typed = Vec::with_capacity(pairs.len());
                for &(k, val) in pairs {
                    typed.push((TypedVar::from_var(k)?, TypedVar::from_var(val)?));
                }
                Ok(TypedVar::Map(typed))
            }
            Var::Iter(_) => Err(SerializeError::IterNotSerializable),
            Var::Anon(_) => Err(SerializeError::AnonNotSerializable),
        }
    }

    /// Convert to a runtime Var.
    ///
    /// The result is owned: the caller must eventually `free_var` it.
    pub fn to_var(&self) -> Var {
        match self {
            TypedVar::Clear => Var::Clear,
            TypedVar::None => Var::None,
            TypedVar::Int(n) => Var::Int(*n),
            TypedVar::Obj(o) => Var::Obj(*o),
            TypedVar::Err(e) => Var::Err(*e),
            TypedVar::Str(s) => new_str(s),
            TypedVar::Float(v) => new_float(*v),
            TypedVar::List(elems) => from_vec(elems.iter().map(TypedVar::to_var).collect()),
            TypedVar::Map(pairs) => from_pairs(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_var(), v.to_var()))
                    .collect(),
            ),
        }
    }

    /// Serialize to binary format (bincode)
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        bincode::serialize(self).map_err(SerializeError::from)
    }

    /// Deserialize from binary format (bincode)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializeError> {
        bincode::deserialize(bytes).map_err(SerializeError::from)
    }

    /// Render as a scripting-language literal
    pub fn to_literal(&self) -> String {
        match self {
            TypedVar::Clear => "clear".to_string(),
            TypedVar::None => "none".to_string(),
            TypedVar::Int(n) => format!("{}", n),
            TypedVar::Obj(o) => format!("#{}", o),
            TypedVar::Err(e) => e.name().to_string(),
            TypedVar::Str(s) => format!("{:?}", s),
            TypedVar::Float(v) => format!("{:?}", v),
            TypedVar::List(elems) => {
                let parts: Vec<String> = elems.iter().map(TypedVar::to_literal).collect();
                format!("{{{}}}", parts.join(", "))
            }
            TypedVar::Map(pairs) => {
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{} -> {}", k.to_literal(), v.to_literal()))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

/// Extension trait for Var to add serialization methods
pub trait VarSerialize {
    /// Convert to serializable TypedVar
    fn to_typed(self) -> Result<TypedVar, SerializeError>;

    /// Serialize directly to bytes
    fn to_bytes(self) -> Result<Vec<u8>, SerializeError>;
}

impl VarSerialize for Var {
    fn to_typed(self) -> Result<TypedVar, SerializeError> {
        TypedVar::from_var(self)
    }

    fn to_bytes(self) -> Result<Vec<u8>, SerializeError> {
        TypedVar::from_var(self)?.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anon::new_anon;
    use crate::compare::equality;
    use crate::iter::new_iter;
    use crate::lifecycle::free_var;
    use crate::map::{mapinsert, new_map};

    #[test]
    fn test_scalar_round_trip() {
        for v in [Var::Int(42), Var::Obj(-1), Var::Err(ErrCode::Perm), Var::Clear] {
            let typed = TypedVar::from_var(v).unwrap();
            assert!(equality(v, typed.to_var(), true));
        }
    }

    #[test]
    fn test_collection_round_trip() {
        let m = mapinsert(new_map(), new_str("key"), Var::Int(42));
        let v = from_vec(vec![Var::Int(1), new_str("two"), m]);
        let typed = TypedVar::from_var(v).unwrap();
        let back = typed.to_var();
        assert!(equality(v, back, true));
        free_var(v);
        free_var(back);
    }

    #[test]
    fn test_bytes_round_trip() {
        let typed = TypedVar::Map(vec![
            (TypedVar::Str("x".to_string()), TypedVar::Int(10)),
            (TypedVar::Int(42), TypedVar::List(vec![TypedVar::Obj(2)])),
        ]);
        let bytes = typed.to_bytes().unwrap();
        assert_eq!(TypedVar::from_bytes(&bytes).unwrap(), typed);
    }

    #[test]
    fn test_iter_not_serializable() {
        let l = from_vec(vec![Var::Int(1)]);
        let it = new_iter(l);
        assert!(matches!(
            TypedVar::from_var(it),
            Err(SerializeError::IterNotSerializable)
        ));
        free_var(it);
        free_var(l);
    }

    #[test]
    fn test_anon_not_serializable() {
        let v = new_anon(2);
        assert!(matches!(
            TypedVar::from_var(v),
            Err(SerializeError::AnonNotSerializable)
        ));
    }

    #[test]
    fn test_nan_not_serializable() {
        let v = new_float(f64::NAN);
        assert!(matches!(
            TypedVar::from_var(v),
            Err(SerializeError::NonFiniteFloat(_))
        ));
        free_var(v);
    }

    #[test]
    fn test_literal_rendering() {
        let typed = TypedVar::Map(vec![(
            TypedVar::Str("k".to_string()),
            TypedVar::List(vec![TypedVar::Int(1), TypedVar::Obj(5)]),
        )]);
        assert_eq!(typed.to_literal(), "[\"k\" -> {1, #5}]");
        assert_eq!(TypedVar::Err(ErrCode::Type).to_literal(), "E_TYPE");
    }

    #[test]
    fn test_corrupted_data_returns_error() {
        assert!(TypedVar::from_bytes(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).is_err());
        assert!(TypedVar::from_bytes(&[]).is_err());
    }
}
