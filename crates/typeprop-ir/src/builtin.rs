//! Primitive operations the back end emits directly, without dynamic dispatch

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of the value a builtin operator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinResult {
    Number,
    /// Integral result (bitwise operators)
    Integer,
    Boolean,
    String,
}

/// A JS-level primitive operation.
///
/// Builtins never throw and never call user code, so they are free of side
/// effects once their operands have been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinOperator {
    NumAdd,
    NumSubtract,
    NumMultiply,
    NumDivide,
    NumAnd,
    NumOr,
    NumXor,
    NumShl,
    NumShr,
    NumLt,
    NumLe,
    NumGt,
    NumGe,
    NumNegate,
    NumBitNot,
    StringConcatenate,
    /// JS `===`
    StrictEq,
    /// JS `==`
    LooseEq,
    /// JS `!x`; for values that are never num, string or bool this is a null check
    IsFalsy,
    /// `Math.floor(x) === x` for a value known to be a number
    IsFloor,
    /// `typeof x === "number" && Math.floor(x) === x`
    IsNumberAndFloor,
}

impl BuiltinOperator {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinOperator::NumAdd => "NumAdd",
            BuiltinOperator::NumSubtract => "NumSubtract",
            BuiltinOperator::NumMultiply => "NumMultiply",
            BuiltinOperator::NumDivide => "NumDivide",
            BuiltinOperator::NumAnd => "NumAnd",
            BuiltinOperator::NumOr => "NumOr",
            BuiltinOperator::NumXor => "NumXor",
            BuiltinOperator::NumShl => "NumShl",
            BuiltinOperator::NumShr => "NumShr",
            BuiltinOperator::NumLt => "NumLt",
            BuiltinOperator::NumLe => "NumLe",
            BuiltinOperator::NumGt => "NumGt",
            BuiltinOperator::NumGe => "NumGe",
            BuiltinOperator::NumNegate => "NumNegate",
            BuiltinOperator::NumBitNot => "NumBitNot",
            BuiltinOperator::StringConcatenate => "StringConcatenate",
            BuiltinOperator::StrictEq => "StrictEq",
            BuiltinOperator::LooseEq => "LooseEq",
            BuiltinOperator::IsFalsy => "IsFalsy",
            BuiltinOperator::IsFloor => "IsFloor",
            BuiltinOperator::IsNumberAndFloor => "IsNumberAndFloor",
        }
    }

    pub fn result(self) -> BuiltinResult {
        use BuiltinOperator::*;
        match self {
            NumAdd | NumSubtract | NumMultiply | NumDivide | NumNegate => BuiltinResult::Number,
            NumAnd | NumOr | NumXor | NumShl | NumShr | NumBitNot => BuiltinResult::Integer,
            StringConcatenate => BuiltinResult::String,
            NumLt | NumLe | NumGt | NumGe | StrictEq | LooseEq | IsFalsy | IsFloor | IsNumberAndFloor => {
                BuiltinResult::Boolean
            }
        }
    }

    /// Number of operands the operator takes
    pub fn arity(self) -> usize {
        use BuiltinOperator::*;
        match self {
            NumNegate | NumBitNot | IsFalsy | IsFloor | IsNumberAndFloor => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for BuiltinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
