//! Rewrites the graph using the facts of a finished analysis
//!
//! Only reachable code is visited. The analysis maps are frozen: nodes the
//! transform creates have no recorded value and are never folded again.
//! Every rewrite replaces one expression by a new subtree in the same slot,
//! so the evaluation of side-effecting operands is never duplicated or
//! dropped.

use super::analysis::AnalysisResult;
use super::specialize::specialize_operator;
use crate::config::PropagatorOptions;
use crate::error::{PropagationError, Result};
use crate::lattice::{AbstractBool, ConstantPropagationLattice};
use serde::Serialize;
use tracing::{debug, trace};
use typeprop_ir::{BuiltinOperator, ConstantValue, Graph, NodeId, NodeKind};

/// Rewrites performed by one transform run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Calls and concatenations replaced by a constant
    pub constants_folded: usize,
    /// Pure primitives turned into constants in place
    pub primitives_folded: usize,
    pub branches_eliminated: usize,
    pub operators_specialized: usize,
    /// Casts proven to succeed and removed
    pub casts_eliminated: usize,
    /// Casts proven to fail whose continuation was marked unreachable
    pub casts_failed: usize,
    pub type_tests_specialized: usize,
}

impl TransformStats {
    /// Sum of all rewrites
    pub fn total(&self) -> usize {
        self.constants_folded
            + self.primitives_folded
            + self.branches_eliminated
            + self.operators_specialized
            + self.casts_eliminated
            + self.casts_failed
            + self.type_tests_specialized
    }
}

/// Rewrites a graph using the facts of a finished analysis
pub struct TransformingVisitor<'a> {
    graph: &'a mut Graph,
    lattice: &'a ConstantPropagationLattice<'a>,
    analysis: &'a AnalysisResult,
    options: &'a PropagatorOptions,
    stats: TransformStats,
}

impl<'a> TransformingVisitor<'a> {
    pub fn new(
        graph: &'a mut Graph,
        lattice: &'a ConstantPropagationLattice<'a>,
        analysis: &'a AnalysisResult,
        options: &'a PropagatorOptions,
    ) -> Self {
        Self {
            graph,
            lattice,
            analysis,
            options,
            stats: TransformStats::default(),
        }
    }

    /// Walks the live graph from the root and applies every rewrite the
    /// analysis supports
    pub fn transform(mut self) -> Result<TransformStats> {
        let root = self.graph.root().ok_or(PropagationError::MissingRoot)?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.graph.is_detached(node) {
                continue;
            }
            self.visit(node, &mut stack)?;
        }
        debug!(rewrites = self.stats.total(), stats = ?self.stats, "transform finished");
        Ok(self.stats)
    }

    /// Applies the rewrites for `node` and pushes the expressions to visit
    /// next
    fn visit(&mut self, node: NodeId, stack: &mut Vec<NodeId>) -> Result<()> {
        let analysis = self.analysis;
        let kind = self.graph.kind(node).clone();
        let name = kind.name();
        match kind {
            NodeKind::FunctionDefinition { body, .. } => stack.extend(body),
            NodeKind::LetPrim { primitive, body } => {
                self.transform_primitive(primitive)?;
                stack.push(body);
            }
            NodeKind::LetCont { continuations, body } => {
                stack.push(body);
                for k in continuations {
                    if !self.analysis.is_reachable(k) {
                        continue;
                    }
                    if let NodeKind::Continuation { body: Some(b), .. } = self.graph.kind(k) {
                        stack.push(*b);
                    }
                }
            }
            NodeKind::LetMutable { body, .. } | NodeKind::SetMutableVariable { body, .. } => stack.push(body),
            NodeKind::InvokeMethod {
                receiver,
                selector,
                arguments,
                continuation,
            } => {
                if let Some(new) = self.constify_expression(node, continuation)? {
                    stack.push(new);
                    return Ok(());
                }
                if !self.options.specialize_operators {
                    return Ok(());
                }
                let values = arguments
                    .iter()
                    .map(|a| (*a, analysis.value(*a)))
                    .collect::<Vec<_>>();
                let receiver = (receiver, analysis.value(receiver));
                if let Some((operator, operands)) = specialize_operator(self.lattice, &selector, receiver, &values) {
                    trace!(%node, %selector, %operator, "specialized operator");
                    let primitive = self.graph.builtin(operator, &operands);
                    let new = self.splice_let_prim(node, primitive, continuation)?;
                    self.stats.operators_specialized += 1;
                    stack.push(new);
                }
            }
            NodeKind::ConcatenateStrings { continuation, .. } => {
                if let Some(new) = self.constify_expression(node, continuation)? {
                    stack.push(new);
                }
            }
            NodeKind::Branch {
                true_continuation,
                false_continuation,
                ..
            } => {
                if !self.options.eliminate_branches {
                    return Ok(());
                }
                let target = match (
                    self.analysis.is_reachable(true_continuation),
                    self.analysis.is_reachable(false_continuation),
                ) {
                    (true, false) => true_continuation,
                    (false, true) => false_continuation,
                    _ => return Ok(()),
                };
                let jump = self.graph.invoke_continuation(target, &[]);
                self.graph.replace_expression(node, jump)?;
                trace!(%node, %target, "branch eliminated");
                self.stats.branches_eliminated += 1;
            }
            NodeKind::TypeCast {
                value,
                ty,
                continuation,
            } => {
                if !self.options.eliminate_type_casts {
                    return Ok(());
                }
                match self.lattice.is_subtype_of(self.analysis.value(value), &ty, true) {
                    AbstractBool::True => {
                        let forward = self.graph.invoke_continuation(continuation, &[value]);
                        self.graph.replace_expression(node, forward)?;
                        trace!(%node, "cast always succeeds");
                        self.stats.casts_eliminated += 1;
                    }
                    AbstractBool::False => {
                        if self.analysis.is_reachable(continuation) {
                            return Ok(());
                        }
                        if let NodeKind::Continuation { body: Some(body), .. } = self.graph.kind(continuation) {
                            let body = *body;
                            if !matches!(self.graph.kind(body), NodeKind::Unreachable) {
                                let unreachable = self.graph.unreachable();
                                self.graph.replace_expression(body, unreachable)?;
                                trace!(%node, "cast always fails");
                                self.stats.casts_failed += 1;
                            }
                        }
                    }
                    AbstractBool::Maybe | AbstractBool::Nothing => {}
                }
            }
            NodeKind::InvokeStatic { .. }
            | NodeKind::InvokeContinuation { .. }
            | NodeKind::Throw { .. }
            | NodeKind::Unreachable => {}
            NodeKind::Constant { .. }
            | NodeKind::Parameter { .. }
            | NodeKind::Continuation { .. }
            | NodeKind::MutableVariable
            | NodeKind::GetMutableVariable { .. }
            | NodeKind::GetField { .. }
            | NodeKind::TypeTest { .. }
            | NodeKind::Identical { .. }
            | NodeKind::ApplyBuiltinOperator { .. } => {
                return Err(PropagationError::UnexpectedNode {
                    node,
                    found: name,
                    expected: "expression",
                })
            }
        }
        Ok(())
    }

    /// Replaces an expression the analysis proved constant by
    /// `LetPrim(Constant, InvokeContinuation(k, [constant]))`
    fn constify_expression(&mut self, node: NodeId, continuation: NodeId) -> Result<Option<NodeId>> {
        if !self.options.fold_constants {
            return Ok(None);
        }
        let analysis = self.analysis;
        let Some(value) = analysis.replacement(node) else {
            return Ok(None);
        };
        let constant = self.graph.constant(value.clone());
        let new = self.splice_let_prim(node, constant, continuation)?;
        trace!(%node, %value, "constified expression");
        self.stats.constants_folded += 1;
        Ok(Some(new))
    }

    /// Puts `LetPrim(primitive, InvokeContinuation(k, [primitive]))` in the
    /// place of `node`
    fn splice_let_prim(&mut self, node: NodeId, primitive: NodeId, continuation: NodeId) -> Result<NodeId> {
        let invoke = self.graph.invoke_continuation(continuation, &[primitive]);
        let let_prim = self.graph.let_prim(primitive, invoke);
        self.graph.replace_expression(node, let_prim)?;
        Ok(let_prim)
    }

    fn transform_primitive(&mut self, primitive: NodeId) -> Result<()> {
        let kind = self.graph.kind(primitive);
        if self.options.fold_constants && kind.is_pure_primitive() && !matches!(kind, NodeKind::Constant { .. }) {
            if let Some(value) = self.analysis.value(primitive).constant() {
                trace!(%primitive, %value, "folded primitive");
                self.graph.replace_primitive(
                    primitive,
                    NodeKind::Constant {
                        value: value.clone(),
                    },
                )?;
                self.stats.primitives_folded += 1;
                return Ok(());
            }
        }

        if !self.options.specialize_type_tests {
            return Ok(());
        }
        let NodeKind::TypeTest { value, ty } = self.graph.kind(primitive) else {
            return Ok(());
        };
        if !ty.is_int() || !ty.treat_as_raw() || self.analysis.value(primitive).is_nothing() {
            return Ok(());
        }
        let value = *value;
        let input = self.analysis.value(value);
        let operator = if self.lattice.is_definitely_num(input, false) {
            BuiltinOperator::IsFloor
        } else if self.lattice.is_definitely_num(input, true) {
            BuiltinOperator::IsNumberAndFloor
        } else {
            return Ok(());
        };
        trace!(%primitive, %operator, "specialized type test");
        self.graph.replace_primitive(
            primitive,
            NodeKind::ApplyBuiltinOperator {
                operator,
                arguments: [value].into_iter().collect(),
            },
        )?;
        self.stats.type_tests_specialized += 1;
        Ok(())
    }
}

/// Constant values a rewritten graph binds, in arena order. Used by tests
/// and diagnostics.
pub fn bound_constants(graph: &Graph) -> Vec<(NodeId, ConstantValue)> {
    graph
        .ids()
        .filter(|id| !graph.is_detached(*id))
        .filter_map(|id| match graph.kind(id) {
            NodeKind::Constant { value } => Some((id, value.clone())),
            _ => None,
        })
        .collect()
}
