//! Internal errors of the propagation pass
//!
//! None of these are user-facing: each one means the pass was handed a
//! malformed graph or broke one of its own invariants. The driver aborts
//! the pass for the current function when it sees one.

use crate::lattice::ValueKind;
use thiserror::Error;
use typeprop_ir::{BuiltinOperator, GraphError, NodeId};

/// Internal error aborting the pass for one function
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropagationError {
    #[error("value of {node} moved down the lattice from {old:?} to {new:?}")]
    MonotonicityViolation {
        node: NodeId,
        old: ValueKind,
        new: ValueKind,
    },

    #[error("unexpected {found} node {node} where {expected} was required")]
    UnexpectedNode {
        node: NodeId,
        found: &'static str,
        expected: &'static str,
    },

    #[error("continuation {continuation} takes {expected} argument(s) but {node} passes {found}")]
    ContinuationArity {
        node: NodeId,
        continuation: NodeId,
        expected: usize,
        found: usize,
    },

    #[error("builtin {operator} at {node} takes {expected} operand(s) but has {found}")]
    BuiltinArity {
        node: NodeId,
        operator: BuiltinOperator,
        expected: usize,
        found: usize,
    },

    #[error("graph has no root function")]
    MissingRoot,

    #[error("malformed graph: {0}")]
    MalformedGraph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, PropagationError>;
