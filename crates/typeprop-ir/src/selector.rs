//! Dynamic call selectors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntactic shape of a dynamic call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    Call,
    Getter,
    Setter,
    Operator,
    Index,
}

/// Name and shape of a dynamically dispatched call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub name: String,
    pub kind: SelectorKind,
    /// Number of arguments, not counting the receiver
    pub arity: usize,
}

impl Selector {
    pub fn call(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            kind: SelectorKind::Call,
            arity,
        }
    }

    pub fn getter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SelectorKind::Getter,
            arity: 0,
        }
    }

    pub fn setter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SelectorKind::Setter,
            arity: 1,
        }
    }

    /// A user-definable operator. Unary minus is named `unary-`.
    pub fn operator(name: impl Into<String>) -> Self {
        let name = name.into();
        let arity = if name == "unary-" || name == "~" { 0 } else { 1 };
        Self {
            name,
            kind: SelectorKind::Operator,
            arity,
        }
    }

    pub fn index() -> Self {
        Self {
            name: "[]".to_string(),
            kind: SelectorKind::Index,
            arity: 1,
        }
    }

    /// True for operator selectors such as `+` and `unary-`
    pub fn is_operator(&self) -> bool {
        self.kind == SelectorKind::Operator
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
