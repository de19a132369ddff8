//! Lattice elements of the propagation

use crate::type_mask::TypeMask;
use std::fmt;
use typeprop_ir::ConstantValue;

/// Height of a value in the lattice, ordered bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Nothing,
    Constant,
    NonConstant,
}

/// What the analysis knows about a definition.
///
/// - `Nothing`: no value has reached the definition yet
/// - `Constant`: exactly one constant has reached it
/// - `NonConstant`: anything in the type mask may reach it
///
/// Values are never mutated; joining produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractValue {
    Nothing,
    Constant { value: ConstantValue, ty: TypeMask },
    NonConstant { ty: TypeMask },
}

impl AbstractValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AbstractValue::Nothing => ValueKind::Nothing,
            AbstractValue::Constant { .. } => ValueKind::Constant,
            AbstractValue::NonConstant { .. } => ValueKind::NonConstant,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, AbstractValue::Nothing)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, AbstractValue::Constant { .. })
    }

    pub fn is_non_constant(&self) -> bool {
        matches!(self, AbstractValue::NonConstant { .. })
    }

    pub fn constant(&self) -> Option<&ConstantValue> {
        match self {
            AbstractValue::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Type mask, absent for `Nothing`
    pub fn ty(&self) -> Option<&TypeMask> {
        match self {
            AbstractValue::Nothing => None,
            AbstractValue::Constant { ty, .. } | AbstractValue::NonConstant { ty } => Some(ty),
        }
    }

    pub fn is_null_constant(&self) -> bool {
        self.constant().is_some_and(ConstantValue::is_null)
    }

    pub fn is_nullable(&self) -> bool {
        self.ty().is_some_and(TypeMask::is_nullable)
    }

    pub fn bool_constant(&self) -> Option<bool> {
        self.constant().and_then(ConstantValue::as_bool)
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractValue::Nothing => f.write_str("Nothing"),
            AbstractValue::Constant { value, ty } => write!(f, "Constant({value}, {ty})"),
            AbstractValue::NonConstant { ty } => write!(f, "NonConstant({ty})"),
        }
    }
}
