//! Value-level error codes
//!
//! Failed lookups and other user-reachable failures are represented as
//! typed error values (`Var::Err`) flowing normally through the value
//! system, never raised as faults. Only internal-consistency violations
//! (comparing collections, duplicating an anonymous object) abort.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes carried by `Var::Err`.
///
/// The numbering is part of the persistence format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrCode {
    None = 0,
    Type = 1,
    Div = 2,
    Perm = 3,
    PropNf = 4,
    VerbNf = 5,
    VarNf = 6,
    InvInd = 7,
    RecMove = 8,
    MaxRec = 9,
    Range = 10,
    Args = 11,
    Nacc = 12,
    InvArg = 13,
    Quota = 14,
    Float = 15,
}

impl ErrCode {
    /// All codes, in numbering order.
    pub const ALL: [ErrCode; 16] = [
        ErrCode::None,
        ErrCode::Type,
        ErrCode::Div,
        ErrCode::Perm,
        ErrCode::PropNf,
        ErrCode::VerbNf,
        ErrCode::VarNf,
        ErrCode::InvInd,
        ErrCode::RecMove,
        ErrCode::MaxRec,
        ErrCode::Range,
        ErrCode::Args,
        ErrCode::Nacc,
        ErrCode::InvArg,
        ErrCode::Quota,
        ErrCode::Float,
    ];

    /// Numeric code used by ordering and the persistence format.
    #[inline]
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Look up a code read from persistent storage.
    pub fn from_code(code: i64) -> Option<ErrCode> {
        if (0..Self::ALL.len() as i64).contains(&code) {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Scripting-level identifier, e.g. `E_PROPNF`.
    pub fn name(self) -> &'static str {
        match self {
            ErrCode::None => "E_NONE",
            ErrCode::Type => "E_TYPE",
            ErrCode::Div => "E_DIV",
            ErrCode::Perm => "E_PERM",
            ErrCode::PropNf => "E_PROPNF",
            ErrCode::VerbNf => "E_VERBNF",
            ErrCode::VarNf => "E_VARNF",
            ErrCode::InvInd => "E_INVIND",
            ErrCode::RecMove => "E_RECMOVE",
            ErrCode::MaxRec => "E_MAXREC",
            ErrCode::Range => "E_RANGE",
            ErrCode::Args => "E_ARGS",
            ErrCode::Nacc => "E_NACC",
            ErrCode::InvArg => "E_INVARG",
            ErrCode::Quota => "E_QUOTA",
            ErrCode::Float => "E_FLOAT",
        }
    }

    /// Human-readable message shown to users.
    pub fn message(self) -> &'static str {
        match self {
            ErrCode::None => "No error",
            ErrCode::Type => "Type mismatch",
            ErrCode::Div => "Division by zero",
            ErrCode::Perm => "Permission denied",
            ErrCode::PropNf => "Property not found",
            ErrCode::VerbNf => "Verb not found",
            ErrCode::VarNf => "Variable not found",
            ErrCode::InvInd => "Invalid indirection",
            ErrCode::RecMove => "Recursive move",
            ErrCode::MaxRec => "Too many verb calls",
            ErrCode::Range => "Range error",
            ErrCode::Args => "Incorrect number of arguments",
            ErrCode::Nacc => "Move refused by destination",
            ErrCode::InvArg => "Invalid argument",
            ErrCode::Quota => "Resource limit exceeded",
            ErrCode::Float => "Floating-point arithmetic error",
        }
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.message())
    }
}
