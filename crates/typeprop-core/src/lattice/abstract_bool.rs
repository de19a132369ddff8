//! Four-valued answers to static questions

use std::fmt;

/// Result of a static test such as "is this value a subtype of T".
///
/// `Nothing` is the answer for values proven not to exist (unreachable
/// code); `Maybe` is the answer whenever neither `True` nor `False` can be
/// proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbstractBool {
    True,
    False,
    Maybe,
    Nothing,
}

impl AbstractBool {
    pub fn from_bool(b: bool) -> Self {
        if b {
            AbstractBool::True
        } else {
            AbstractBool::False
        }
    }

    pub fn is_definitely_true(self) -> bool {
        self == AbstractBool::True
    }

    pub fn is_definitely_false(self) -> bool {
        self == AbstractBool::False
    }

    /// Logical and. `Nothing` dominates, then `False`.
    pub fn and(self, other: AbstractBool) -> AbstractBool {
        use AbstractBool::*;
        match (self, other) {
            (Nothing, _) | (_, Nothing) => Nothing,
            (False, _) | (_, False) => False,
            (True, True) => True,
            _ => Maybe,
        }
    }

    /// Logical or. `Nothing` dominates, then `True`.
    pub fn or(self, other: AbstractBool) -> AbstractBool {
        use AbstractBool::*;
        match (self, other) {
            (Nothing, _) | (_, Nothing) => Nothing,
            (True, _) | (_, True) => True,
            (False, False) => False,
            _ => Maybe,
        }
    }

    /// Logical negation; `Maybe` and `Nothing` are fixed points
    pub fn not(self) -> AbstractBool {
        match self {
            AbstractBool::True => AbstractBool::False,
            AbstractBool::False => AbstractBool::True,
            other => other,
        }
    }
}

impl fmt::Display for AbstractBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbstractBool::True => "true",
            AbstractBool::False => "false",
            AbstractBool::Maybe => "maybe",
            AbstractBool::Nothing => "nothing",
        };
        f.write_str(s)
    }
}
