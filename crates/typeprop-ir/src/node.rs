//! Node kinds of the CPS intermediate representation
//!
//! Every node lives in a [`crate::Graph`] arena and is addressed by
//! [`NodeId`]. A node relates to other nodes in two ways:
//!
//! - it *owns* children (bodies, continuations declared by a `LetCont`, the
//!   primitive bound by a `LetPrim`, parameters), which point back at it
//!   through their parent pointer;
//! - it *references* definitions (operands and invoked continuations),
//!   which record it in their use list.

use crate::builtin::BuiltinOperator;
use crate::constant::ConstantValue;
use crate::ids::{ElementId, NodeId};
use crate::selector::Selector;
use crate::types::DartType;
use smallvec::SmallVec;

/// Operand list of a node
pub type Operands = SmallVec<[NodeId; 2]>;

/// Node payload. Expressions own their bodies; primitives and
/// parameters are definitions referenced by other nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------
    /// Root of a function body
    FunctionDefinition {
        element: ElementId,
        this_parameter: Option<NodeId>,
        parameters: Operands,
        return_continuation: NodeId,
        body: Option<NodeId>,
    },
    /// Binds `primitive` and continues with `body`
    LetPrim { primitive: NodeId, body: NodeId },
    /// Declares local continuations visible in `body`
    LetCont { continuations: Operands, body: NodeId },
    /// Declares a mutable variable cell initialized to `initial_value`
    LetMutable {
        variable: NodeId,
        initial_value: NodeId,
        body: NodeId,
    },
    SetMutableVariable {
        variable: NodeId,
        value: NodeId,
        body: NodeId,
    },
    InvokeStatic {
        target: ElementId,
        arguments: Operands,
        continuation: NodeId,
    },
    /// Dynamic dispatch of `selector` on `receiver`
    InvokeMethod {
        receiver: NodeId,
        selector: Selector,
        arguments: Operands,
        continuation: NodeId,
    },
    ConcatenateStrings { arguments: Operands, continuation: NodeId },
    /// `value as ty`; throws when the check fails
    TypeCast {
        value: NodeId,
        ty: DartType,
        continuation: NodeId,
    },
    InvokeContinuation { continuation: NodeId, arguments: Operands },
    Branch {
        condition: NodeId,
        true_continuation: NodeId,
        false_continuation: NodeId,
    },
    Throw { value: NodeId },
    /// Marks code proven never to execute
    Unreachable,

    // ---------------------------------------------------------------------
    // Definitions
    // ---------------------------------------------------------------------
    Constant { value: ConstantValue },
    /// Function or continuation parameter. Function parameters carry the
    /// element the inference knows them by.
    Parameter { element: Option<ElementId> },
    Continuation {
        parameters: Operands,
        body: Option<NodeId>,
        is_return: bool,
    },
    MutableVariable,
    GetMutableVariable { variable: NodeId },
    GetField { object: NodeId, field: ElementId },
    /// `value is ty`
    TypeTest { value: NodeId, ty: DartType },
    Identical { left: NodeId, right: NodeId },
    ApplyBuiltinOperator { operator: BuiltinOperator, arguments: Operands },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::FunctionDefinition { .. } => "FunctionDefinition",
            NodeKind::LetPrim { .. } => "LetPrim",
            NodeKind::LetCont { .. } => "LetCont",
            NodeKind::LetMutable { .. } => "LetMutable",
            NodeKind::SetMutableVariable { .. } => "SetMutableVariable",
            NodeKind::InvokeStatic { .. } => "InvokeStatic",
            NodeKind::InvokeMethod { .. } => "InvokeMethod",
            NodeKind::ConcatenateStrings { .. } => "ConcatenateStrings",
            NodeKind::TypeCast { .. } => "TypeCast",
            NodeKind::InvokeContinuation { .. } => "InvokeContinuation",
            NodeKind::Branch { .. } => "Branch",
            NodeKind::Throw { .. } => "Throw",
            NodeKind::Unreachable => "Unreachable",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::Parameter { .. } => "Parameter",
            NodeKind::Continuation { .. } => "Continuation",
            NodeKind::MutableVariable => "MutableVariable",
            NodeKind::GetMutableVariable { .. } => "GetMutableVariable",
            NodeKind::GetField { .. } => "GetField",
            NodeKind::TypeTest { .. } => "TypeTest",
            NodeKind::Identical { .. } => "Identical",
            NodeKind::ApplyBuiltinOperator { .. } => "ApplyBuiltinOperator",
        }
    }

    /// Nodes that transfer or end control
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDefinition { .. }
                | NodeKind::LetPrim { .. }
                | NodeKind::LetCont { .. }
                | NodeKind::LetMutable { .. }
                | NodeKind::SetMutableVariable { .. }
                | NodeKind::InvokeStatic { .. }
                | NodeKind::InvokeMethod { .. }
                | NodeKind::ConcatenateStrings { .. }
                | NodeKind::TypeCast { .. }
                | NodeKind::InvokeContinuation { .. }
                | NodeKind::Branch { .. }
                | NodeKind::Throw { .. }
                | NodeKind::Unreachable
        )
    }

    /// Nodes that produce a value other nodes may reference
    pub fn is_definition(&self) -> bool {
        !self.is_expression()
    }

    /// Definitions that can be bound by a `LetPrim`
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant { .. }
                | NodeKind::GetMutableVariable { .. }
                | NodeKind::GetField { .. }
                | NodeKind::TypeTest { .. }
                | NodeKind::Identical { .. }
                | NodeKind::ApplyBuiltinOperator { .. }
        )
    }

    /// Primitives whose evaluation can be dropped or replaced by a constant
    /// without changing observable behavior
    pub fn is_pure_primitive(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant { .. }
                | NodeKind::TypeTest { .. }
                | NodeKind::Identical { .. }
                | NodeKind::ApplyBuiltinOperator { .. }
        )
    }

    /// Children owned by this node
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            NodeKind::FunctionDefinition {
                this_parameter,
                parameters,
                return_continuation,
                body,
                ..
            } => {
                out.extend(this_parameter.iter().copied());
                out.extend(parameters.iter().copied());
                out.push(*return_continuation);
                out.extend(body.iter().copied());
            }
            NodeKind::LetPrim { primitive, body } => {
                out.push(*primitive);
                out.push(*body);
            }
            NodeKind::LetCont { continuations, body } => {
                out.extend(continuations.iter().copied());
                out.push(*body);
            }
            NodeKind::LetMutable { variable, body, .. } => {
                out.push(*variable);
                out.push(*body);
            }
            NodeKind::SetMutableVariable { body, .. } => out.push(*body),
            NodeKind::Continuation { parameters, body, .. } => {
                out.extend(parameters.iter().copied());
                out.extend(body.iter().copied());
            }
            _ => {}
        }
        out
    }

    /// Definitions referenced by this node, one entry per reference
    pub fn references(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            NodeKind::LetMutable { initial_value, .. } => out.push(*initial_value),
            NodeKind::SetMutableVariable { variable, value, .. } => {
                out.push(*variable);
                out.push(*value);
            }
            NodeKind::InvokeStatic {
                arguments, continuation, ..
            } => {
                out.extend(arguments.iter().copied());
                out.push(*continuation);
            }
            NodeKind::InvokeMethod {
                receiver,
                arguments,
                continuation,
                ..
            } => {
                out.push(*receiver);
                out.extend(arguments.iter().copied());
                out.push(*continuation);
            }
            NodeKind::ConcatenateStrings { arguments, continuation } => {
                out.extend(arguments.iter().copied());
                out.push(*continuation);
            }
            NodeKind::TypeCast { value, continuation, .. } => {
                out.push(*value);
                out.push(*continuation);
            }
            NodeKind::InvokeContinuation { continuation, arguments } => {
                out.push(*continuation);
                out.extend(arguments.iter().copied());
            }
            NodeKind::Branch {
                condition,
                true_continuation,
                false_continuation,
            } => {
                out.push(*condition);
                out.push(*true_continuation);
                out.push(*false_continuation);
            }
            NodeKind::Throw { value } => out.push(*value),
            NodeKind::GetMutableVariable { variable } => out.push(*variable),
            NodeKind::GetField { object, .. } => out.push(*object),
            NodeKind::TypeTest { value, .. } => out.push(*value),
            NodeKind::Identical { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::ApplyBuiltinOperator { arguments, .. } => out.extend(arguments.iter().copied()),
            NodeKind::FunctionDefinition { .. }
            | NodeKind::LetPrim { .. }
            | NodeKind::LetCont { .. }
            | NodeKind::Unreachable
            | NodeKind::Constant { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::Continuation { .. }
            | NodeKind::MutableVariable => {}
        }
        out
    }

    /// Redirects the owned expression slot holding `old` to `new`.
    /// Returns false if `old` is not a body slot of this node.
    pub fn replace_body(&mut self, old: NodeId, new: NodeId) -> bool {
        let slot = match self {
            NodeKind::FunctionDefinition { body, .. } | NodeKind::Continuation { body, .. } => match body {
                Some(b) if *b == old => b,
                _ => return false,
            },
            NodeKind::LetPrim { body, .. }
            | NodeKind::LetCont { body, .. }
            | NodeKind::LetMutable { body, .. }
            | NodeKind::SetMutableVariable { body, .. } => {
                if *body != old {
                    return false;
                }
                body
            }
            _ => return false,
        };
        *slot = new;
        true
    }
}

/// An arena slot
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Nodes referencing this definition; a user appears once per reference
    pub uses: SmallVec<[NodeId; 4]>,
    /// Set once the node has been cut out of the graph by a rewrite
    pub detached: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            uses: SmallVec::new(),
            detached: false,
        }
    }
}
