//! Compile-time constant values carried by `Constant` nodes

use crate::ids::ClassId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A primitive constant.
///
/// Equality is constant *identity*: doubles compare by bit pattern, so
/// `0.0` and `-0.0` are distinct constants while a NaN equals itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl ConstantValue {
    pub fn string(s: impl Into<String>) -> Self {
        ConstantValue::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConstantValue::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ConstantValue::Bool(_))
    }

    pub fn is_num(&self) -> bool {
        matches!(self, ConstantValue::Int(_) | ConstantValue::Double(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, ConstantValue::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ConstantValue::String(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value as a double, for mixed int/double arithmetic
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstantValue::Int(i) => Some(*i as f64),
            ConstantValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, ConstantValue::Double(d) if d.is_nan())
    }

    /// Class of the constant's runtime representation.
    ///
    /// A double constant with an integral value is still a `double`
    /// constant; whether it also counts as an `int` is decided by the
    /// constant system.
    pub fn class(&self) -> ClassId {
        match self {
            ConstantValue::Null => ClassId::NULL,
            ConstantValue::Bool(_) => ClassId::BOOL,
            ConstantValue::Int(_) => ClassId::INT,
            ConstantValue::Double(_) => ClassId::DOUBLE,
            ConstantValue::String(_) => ClassId::STRING,
        }
    }
}

impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstantValue::Null, ConstantValue::Null) => true,
            (ConstantValue::Bool(a), ConstantValue::Bool(b)) => a == b,
            (ConstantValue::Int(a), ConstantValue::Int(b)) => a == b,
            (ConstantValue::Double(a), ConstantValue::Double(b)) => a.to_bits() == b.to_bits(),
            (ConstantValue::String(a), ConstantValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstantValue {}

impl Hash for ConstantValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstantValue::Null => {}
            ConstantValue::Bool(b) => b.hash(state),
            ConstantValue::Int(i) => i.hash(state),
            ConstantValue::Double(d) => d.to_bits().hash(state),
            ConstantValue::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => f.write_str("(Null)"),
            ConstantValue::Bool(b) => write!(f, "(Bool {b})"),
            ConstantValue::Int(i) => write!(f, "(Int {i})"),
            ConstantValue::Double(d) => write!(f, "(Double {d:?})"),
            ConstantValue::String(s) => write!(f, "(String {s:?})"),
        }
    }
}
