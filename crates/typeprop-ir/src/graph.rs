//! Arena holding the nodes of one function graph
//!
//! Children are stored as indices, so replacing a subtree only updates the
//! parent's child slot. Use lists are kept per definition as small vectors
//! of user ids; adding a node registers its references, detaching a subtree
//! unregisters them.

use crate::builtin::BuiltinOperator;
use crate::constant::ConstantValue;
use crate::ids::{ElementId, NodeId};
use crate::node::{Node, NodeKind, Operands};
use crate::selector::Selector;
use crate::types::DartType;
use std::ops::Index;
use thiserror::Error;
use tracing::trace;

/// Failed graph mutation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} is not part of this graph")]
    UnknownNode(NodeId),
    #[error("node {0} has no parent")]
    NoParent(NodeId),
    #[error("node {child} is not a body of its parent {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },
    #[error("node {0} is not a primitive")]
    NotAPrimitive(NodeId),
}

/// Arena holding the nodes of one function, addressed by [`NodeId`]
#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self[id].parent
    }

    /// Live nodes referencing the definition `id`
    pub fn uses(&self, id: NodeId) -> &[NodeId] {
        &self[id].uses
    }

    /// True once `id` was cut out of the tree by a replacement
    pub fn is_detached(&self, id: NodeId) -> bool {
        self[id].detached
    }

    /// Ids of all nodes, including detached ones
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Adds a node, registering its references in the referenced
    /// definitions' use lists and claiming its owned children.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let references = kind.references();
        let children = kind.children();
        self.nodes.push(Node::new(kind));
        for def in references {
            self.nodes[def.index()].uses.push(id);
        }
        for child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    /// Sets the body of a continuation created without one (e.g. a loop
    /// header that refers to itself).
    pub fn set_continuation_body(&mut self, continuation: NodeId, new_body: NodeId) {
        if let NodeKind::Continuation { body, .. } = &mut self.nodes[continuation.index()].kind {
            *body = Some(new_body);
            self.nodes[new_body.index()].parent = Some(continuation);
        }
    }

    /// Re-establishes parent pointers for the subtree rooted at `from`
    pub fn link_parents(&mut self, from: NodeId) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            for child in self.nodes[id.index()].kind.children() {
                self.nodes[child.index()].parent = Some(id);
                stack.push(child);
            }
        }
    }

    /// Puts `new` in the place `old` occupies in its parent, re-links the
    /// inserted subtree, and detaches `old` with everything it owns.
    pub fn replace_expression(&mut self, old: NodeId, new: NodeId) -> Result<(), GraphError> {
        self.check(old)?;
        self.check(new)?;
        let parent = self.nodes[old.index()].parent.ok_or(GraphError::NoParent(old))?;
        if !self.nodes[parent.index()].kind.replace_body(old, new) {
            return Err(GraphError::ChildNotFound { parent, child: old });
        }
        trace!(%old, %new, %parent, "replaced expression");
        self.nodes[new.index()].parent = Some(parent);
        self.link_parents(new);
        self.detach_subtree(old);
        Ok(())
    }

    /// Swaps the kind of a bound primitive in place. The definition keeps
    /// its identity and use list; the references of the old kind are
    /// unregistered and those of the new kind registered.
    pub fn replace_primitive(&mut self, id: NodeId, kind: NodeKind) -> Result<(), GraphError> {
        self.check(id)?;
        if !self.nodes[id.index()].kind.is_primitive() || !kind.is_primitive() {
            return Err(GraphError::NotAPrimitive(id));
        }
        for def in self.nodes[id.index()].kind.references() {
            self.remove_use(def, id);
        }
        for def in kind.references() {
            self.nodes[def.index()].uses.push(id);
        }
        self.nodes[id.index()].kind = kind;
        Ok(())
    }

    /// Marks `root` and everything it owns as detached and removes their
    /// references from use lists. Arena slots are never freed.
    pub fn detach_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.nodes[id.index()].detached {
                continue;
            }
            self.nodes[id.index()].detached = true;
            for def in self.nodes[id.index()].kind.references() {
                self.remove_use(def, id);
            }
            stack.extend(self.nodes[id.index()].kind.children());
        }
    }

    fn remove_use(&mut self, def: NodeId, user: NodeId) {
        let uses = &mut self.nodes[def.index()].uses;
        if let Some(pos) = uses.iter().position(|&u| u == user) {
            uses.remove(pos);
        }
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    // ---------------------------------------------------------------------
    // Construction helpers
    // ---------------------------------------------------------------------

    pub fn constant(&mut self, value: ConstantValue) -> NodeId {
        self.add(NodeKind::Constant { value })
    }

    pub fn parameter(&mut self, element: Option<ElementId>) -> NodeId {
        self.add(NodeKind::Parameter { element })
    }

    pub fn continuation(&mut self, parameters: &[NodeId], body: Option<NodeId>) -> NodeId {
        self.add(NodeKind::Continuation {
            parameters: Operands::from_slice(parameters),
            body,
            is_return: false,
        })
    }

    /// The continuation a function returns to, taking the return value
    pub fn return_continuation(&mut self) -> NodeId {
        let result = self.parameter(None);
        self.add(NodeKind::Continuation {
            parameters: Operands::from_slice(&[result]),
            body: None,
            is_return: true,
        })
    }

    /// Adds the function root and makes it the graph root
    pub fn function(
        &mut self,
        element: ElementId,
        this_parameter: Option<NodeId>,
        parameters: &[NodeId],
        return_continuation: NodeId,
        body: NodeId,
    ) -> NodeId {
        let root = self.add(NodeKind::FunctionDefinition {
            element,
            this_parameter,
            parameters: Operands::from_slice(parameters),
            return_continuation,
            body: Some(body),
        });
        self.root = Some(root);
        root
    }

    pub fn let_prim(&mut self, primitive: NodeId, body: NodeId) -> NodeId {
        self.add(NodeKind::LetPrim { primitive, body })
    }

    pub fn let_cont(&mut self, continuations: &[NodeId], body: NodeId) -> NodeId {
        self.add(NodeKind::LetCont {
            continuations: Operands::from_slice(continuations),
            body,
        })
    }

    pub fn let_mutable(&mut self, variable: NodeId, initial_value: NodeId, body: NodeId) -> NodeId {
        self.add(NodeKind::LetMutable {
            variable,
            initial_value,
            body,
        })
    }

    pub fn set_mutable(&mut self, variable: NodeId, value: NodeId, body: NodeId) -> NodeId {
        self.add(NodeKind::SetMutableVariable { variable, value, body })
    }

    pub fn invoke_static(&mut self, target: ElementId, arguments: &[NodeId], continuation: NodeId) -> NodeId {
        self.add(NodeKind::InvokeStatic {
            target,
            arguments: Operands::from_slice(arguments),
            continuation,
        })
    }

    pub fn invoke_method(
        &mut self,
        receiver: NodeId,
        selector: Selector,
        arguments: &[NodeId],
        continuation: NodeId,
    ) -> NodeId {
        self.add(NodeKind::InvokeMethod {
            receiver,
            selector,
            arguments: Operands::from_slice(arguments),
            continuation,
        })
    }

    pub fn concatenate_strings(&mut self, arguments: &[NodeId], continuation: NodeId) -> NodeId {
        self.add(NodeKind::ConcatenateStrings {
            arguments: Operands::from_slice(arguments),
            continuation,
        })
    }

    pub fn type_cast(&mut self, value: NodeId, ty: DartType, continuation: NodeId) -> NodeId {
        self.add(NodeKind::TypeCast { value, ty, continuation })
    }

    pub fn invoke_continuation(&mut self, continuation: NodeId, arguments: &[NodeId]) -> NodeId {
        self.add(NodeKind::InvokeContinuation {
            continuation,
            arguments: Operands::from_slice(arguments),
        })
    }

    pub fn branch(&mut self, condition: NodeId, true_continuation: NodeId, false_continuation: NodeId) -> NodeId {
        self.add(NodeKind::Branch {
            condition,
            true_continuation,
            false_continuation,
        })
    }

    pub fn throw(&mut self, value: NodeId) -> NodeId {
        self.add(NodeKind::Throw { value })
    }

    pub fn unreachable(&mut self) -> NodeId {
        self.add(NodeKind::Unreachable)
    }

    pub fn mutable_variable(&mut self) -> NodeId {
        self.add(NodeKind::MutableVariable)
    }

    pub fn get_mutable(&mut self, variable: NodeId) -> NodeId {
        self.add(NodeKind::GetMutableVariable { variable })
    }

    pub fn get_field(&mut self, object: NodeId, field: ElementId) -> NodeId {
        self.add(NodeKind::GetField { object, field })
    }

    pub fn type_test(&mut self, value: NodeId, ty: DartType) -> NodeId {
        self.add(NodeKind::TypeTest { value, ty })
    }

    pub fn identical(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.add(NodeKind::Identical { left, right })
    }

    pub fn builtin(&mut self, operator: BuiltinOperator, arguments: &[NodeId]) -> NodeId {
        self.add(NodeKind::ApplyBuiltinOperator {
            operator,
            arguments: Operands::from_slice(arguments),
        })
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}
