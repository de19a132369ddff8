//! Sparse conditional propagation over the CPS graph
//!
//! The analysis keeps three pieces of state:
//!
//! - the reachable set, which only grows;
//! - a node worklist of newly reachable nodes whose transfer function has
//!   not run yet (processed last-in, first-out);
//! - a definition workset of definitions whose value changed and whose
//!   reachable users must be revisited.
//!
//! The node worklist is always drained before a definition is popped. A
//! transfer function that depends on an operand still at `Nothing` simply
//! returns; the node is revisited once the operand changes. Values only move
//! up a lattice of height three and the reachable set is bounded by the
//! graph, so the loop terminates.

use crate::constant_system::{BinaryOperator, UnaryOperator};
use crate::error::{PropagationError, Result};
use crate::lattice::{AbstractBool, AbstractValue, ConstantPropagationLattice};
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};
use typeprop_ir::{ConstantValue, Graph, NodeId, NodeKind, Operands};

static NOTHING: AbstractValue = AbstractValue::Nothing;

/// Facts computed by one analysis run, handed read-only to the transform
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    reachable: IndexSet<NodeId>,
    values: IndexMap<NodeId, AbstractValue>,
    replacements: IndexMap<NodeId, ConstantValue>,
    steps: usize,
}

impl AnalysisResult {
    /// True if the analysis proved `node` can run
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.reachable.contains(&node)
    }

    /// Reachable nodes in the order they were discovered
    pub fn reachable_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.reachable.iter().copied()
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }

    /// Final value of `node`; `Nothing` for nodes never given a value
    pub fn value(&self, node: NodeId) -> &AbstractValue {
        self.values.get(&node).unwrap_or(&NOTHING)
    }

    /// Constant an expression can be replaced with, if it was proven to
    /// compute one without observable side effects
    pub fn replacement(&self, node: NodeId) -> Option<&ConstantValue> {
        self.replacements.get(&node)
    }

    /// Folded expressions with their constants, in discovery order
    pub fn replacements(&self) -> impl Iterator<Item = (NodeId, &ConstantValue)> + '_ {
        self.replacements.iter().map(|(node, value)| (*node, value))
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }

    /// Number of transfer function runs until the fixpoint
    pub fn steps(&self) -> usize {
        self.steps
    }
}

type ValueObserver<'a> = Box<dyn FnMut(NodeId, &AbstractValue, &AbstractValue) + 'a>;

/// Worklist-driven fixpoint over one function graph. Consumed by
/// [`TypePropagationVisitor::analyze`].
pub struct TypePropagationVisitor<'a> {
    graph: &'a Graph,
    lattice: &'a ConstantPropagationLattice<'a>,
    reachable: IndexSet<NodeId>,
    node_worklist: Vec<NodeId>,
    definition_workset: IndexSet<NodeId>,
    values: IndexMap<NodeId, AbstractValue>,
    replacements: IndexMap<NodeId, ConstantValue>,
    steps: usize,
    observer: Option<ValueObserver<'a>>,
}

impl<'a> TypePropagationVisitor<'a> {
    /// A visitor with nothing reachable yet
    pub fn new(graph: &'a Graph, lattice: &'a ConstantPropagationLattice<'a>) -> Self {
        Self {
            graph,
            lattice,
            reachable: IndexSet::new(),
            node_worklist: Vec::new(),
            definition_workset: IndexSet::new(),
            values: IndexMap::new(),
            replacements: IndexMap::new(),
            steps: 0,
            observer: None,
        }
    }

    /// Calls `observer(node, old, new)` on every value change
    pub fn with_observer(mut self, observer: impl FnMut(NodeId, &AbstractValue, &AbstractValue) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Runs the fixpoint from the graph root
    pub fn analyze(mut self) -> Result<AnalysisResult> {
        let root = self.graph.root().ok_or(PropagationError::MissingRoot)?;
        self.set_reachable(root);

        loop {
            if let Some(node) = self.node_worklist.pop() {
                self.visit(node)?;
                continue;
            }
            let Some(definition) = self.definition_workset.pop() else {
                break;
            };
            let graph = self.graph;
            for &user in graph.uses(definition) {
                if self.reachable.contains(&user) {
                    self.visit(user)?;
                }
            }
        }

        // A replacement recorded early may have been invalidated by a later
        // value change.
        let values = &self.values;
        self.replacements
            .retain(|node, constant| values.get(node).and_then(AbstractValue::constant) == Some(&*constant));

        debug!(
            steps = self.steps,
            reachable = self.reachable.len(),
            values = self.values.len(),
            replacements = self.replacements.len(),
            "analysis reached fixpoint"
        );
        Ok(AnalysisResult {
            reachable: self.reachable,
            values: self.values,
            replacements: self.replacements,
            steps: self.steps,
        })
    }

    fn value(&self, node: NodeId) -> &AbstractValue {
        self.values.get(&node).unwrap_or(&NOTHING)
    }

    fn set_reachable(&mut self, node: NodeId) {
        if self.reachable.insert(node) {
            self.node_worklist.push(node);
        }
    }

    /// Joins `update` into the value of `node`. Changed definitions are
    /// queued so their users are revisited.
    fn set_value(&mut self, node: NodeId, update: AbstractValue) -> Result<()> {
        let old = self.value(node);
        let new = self.lattice.join(old, &update);
        if &new == old {
            return Ok(());
        }
        if new.kind() < old.kind() || !covers(&new, old) {
            return Err(PropagationError::MonotonicityViolation {
                node,
                old: old.kind(),
                new: new.kind(),
            });
        }
        trace!(%node, old = %old, new = %new, "value changed");
        if let Some(observer) = self.observer.as_mut() {
            observer(node, self.values.get(&node).unwrap_or(&NOTHING), &new);
        }
        self.values.insert(node, new);
        if self.graph.kind(node).is_definition() {
            self.definition_workset.insert(node);
        }
        Ok(())
    }

    /// Parameters of the continuation `k`
    fn continuation_parameters(&self, k: NodeId) -> Result<&'a Operands> {
        let graph = self.graph;
        match graph.kind(k) {
            NodeKind::Continuation { parameters, .. } => Ok(parameters),
            other => Err(PropagationError::UnexpectedNode {
                node: k,
                found: other.name(),
                expected: "Continuation",
            }),
        }
    }

    /// The single parameter of a call continuation
    fn result_parameter(&self, node: NodeId, k: NodeId) -> Result<NodeId> {
        let parameters = self.continuation_parameters(k)?;
        match parameters.as_slice() {
            [result] => Ok(*result),
            _ => Err(PropagationError::ContinuationArity {
                node,
                continuation: k,
                expected: 1,
                found: parameters.len(),
            }),
        }
    }

    fn expect_no_parameters(&self, node: NodeId, k: NodeId) -> Result<()> {
        let parameters = self.continuation_parameters(k)?;
        if parameters.is_empty() {
            Ok(())
        } else {
            Err(PropagationError::ContinuationArity {
                node,
                continuation: k,
                expected: 0,
                found: parameters.len(),
            })
        }
    }

    /// Sets the value a call produces on the call node and on the
    /// parameter of its continuation
    fn set_result(&mut self, node: NodeId, parameter: NodeId, value: AbstractValue) -> Result<()> {
        self.set_value(node, value.clone())?;
        self.set_value(parameter, value)
    }

    fn visit(&mut self, node: NodeId) -> Result<()> {
        self.steps += 1;
        let graph = self.graph;
        let lattice = self.lattice;
        let types = lattice.types();
        trace!(%node, kind = graph.kind(node).name(), "visit");

        match graph.kind(node) {
            NodeKind::FunctionDefinition {
                this_parameter,
                parameters,
                body,
                ..
            } => {
                if let Some(this) = this_parameter {
                    self.set_value(*this, lattice.non_constant(types.dynamic_type().non_nullable()))?;
                }
                for &parameter in parameters {
                    let element = match graph.kind(parameter) {
                        NodeKind::Parameter { element } => *element,
                        other => {
                            return Err(PropagationError::UnexpectedNode {
                                node: parameter,
                                found: other.name(),
                                expected: "Parameter",
                            })
                        }
                    };
                    self.set_value(parameter, lattice.non_constant(types.get_parameter_type(element)))?;
                }
                if let Some(body) = body {
                    self.set_reachable(*body);
                }
            }

            NodeKind::LetPrim { primitive, body } => {
                self.set_reachable(*body);
                self.set_reachable(*primitive);
            }

            NodeKind::LetCont { body, .. } => self.set_reachable(*body),

            NodeKind::LetMutable {
                variable,
                initial_value,
                body,
            } => {
                self.set_value(*variable, self.value(*initial_value).clone())?;
                self.set_reachable(*body);
            }

            NodeKind::SetMutableVariable { variable, value, body } => {
                self.set_value(*variable, self.value(*value).clone())?;
                self.set_reachable(*body);
            }

            NodeKind::InvokeStatic {
                target, continuation, ..
            } => {
                let result = self.result_parameter(node, *continuation)?;
                self.set_reachable(*continuation);
                self.set_value(result, lattice.non_constant(types.get_return_type(*target)))?;
            }

            NodeKind::InvokeMethod {
                receiver,
                selector,
                arguments,
                continuation,
            } => {
                let result = self.result_parameter(node, *continuation)?;
                self.set_reachable(*continuation);
                let receiver_value = self.value(*receiver);
                let Some(receiver_type) = receiver_value.ty() else {
                    return Ok(());
                };

                let folded = if !selector.is_operator() {
                    None
                } else {
                    match arguments.as_slice() {
                        [] => UnaryOperator::parse(&selector.name).and_then(|op| lattice.unary_op(op, receiver_value)),
                        [argument] => BinaryOperator::parse(&selector.name)
                            .and_then(|op| lattice.binary_op(op, receiver_value, self.value(*argument))),
                        _ => None,
                    }
                };

                let value = match folded {
                    Some(AbstractValue::Nothing) => return Ok(()),
                    Some(value) => {
                        if let Some(constant) = value.constant() {
                            self.replacements.insert(node, constant.clone());
                        }
                        value
                    }
                    None => lattice.non_constant(types.get_invoke_return_type(selector, receiver_type)),
                };
                self.set_result(node, result, value)?;
            }

            NodeKind::ConcatenateStrings {
                arguments,
                continuation,
            } => {
                let result = self.result_parameter(node, *continuation)?;
                self.set_reachable(*continuation);
                let this = &*self;
                let value = lattice.string_concat(arguments.iter().map(|a| this.value(*a)));
                if value.is_nothing() {
                    return Ok(());
                }
                if let Some(constant) = value.constant() {
                    self.replacements.insert(node, constant.clone());
                }
                self.set_result(node, result, value)?;
            }

            NodeKind::TypeCast {
                value,
                ty,
                continuation,
            } => {
                let result = self.result_parameter(node, *continuation)?;
                let input = self.value(*value);
                match lattice.is_subtype_of(input, ty, true) {
                    AbstractBool::Nothing | AbstractBool::False => {}
                    AbstractBool::True | AbstractBool::Maybe => {
                        let forwarded = input.clone();
                        self.set_reachable(*continuation);
                        self.set_value(result, forwarded)?;
                    }
                }
            }

            NodeKind::InvokeContinuation {
                continuation,
                arguments,
            } => {
                let parameters = self.continuation_parameters(*continuation)?;
                if parameters.len() != arguments.len() {
                    return Err(PropagationError::ContinuationArity {
                        node,
                        continuation: *continuation,
                        expected: parameters.len(),
                        found: arguments.len(),
                    });
                }
                self.set_reachable(*continuation);
                for (&parameter, &argument) in parameters.iter().zip(arguments.iter()) {
                    self.set_value(parameter, self.value(argument).clone())?;
                }
            }

            NodeKind::Branch {
                condition,
                true_continuation,
                false_continuation,
            } => {
                self.expect_no_parameters(node, *true_continuation)?;
                self.expect_no_parameters(node, *false_continuation)?;
                match self.value(*condition) {
                    AbstractValue::Nothing => {}
                    AbstractValue::NonConstant { .. } => {
                        self.set_reachable(*true_continuation);
                        self.set_reachable(*false_continuation);
                    }
                    AbstractValue::Constant { value, .. } => match value.as_bool() {
                        Some(true) => self.set_reachable(*true_continuation),
                        Some(false) => self.set_reachable(*false_continuation),
                        None => {
                            // A non-bool condition fails the runtime check;
                            // treat it as an unknown bool.
                            self.set_reachable(*true_continuation);
                            self.set_reachable(*false_continuation);
                            self.set_value(*condition, lattice.any_bool())?;
                        }
                    },
                }
            }

            NodeKind::Continuation { body, .. } => {
                if let Some(body) = body {
                    self.set_reachable(*body);
                }
            }

            NodeKind::Constant { value } => {
                self.set_value(node, lattice.constant(value.clone()))?;
            }

            NodeKind::GetMutableVariable { variable } => {
                self.set_value(node, self.value(*variable).clone())?;
            }

            NodeKind::GetField { field, .. } => {
                self.set_value(node, lattice.non_constant(types.get_field_type(*field)))?;
            }

            NodeKind::TypeTest { value, ty } => {
                let result = match lattice.is_subtype_of(self.value(*value), ty, false) {
                    AbstractBool::Nothing => return Ok(()),
                    AbstractBool::True => lattice.bool_constant(true),
                    AbstractBool::False => lattice.bool_constant(false),
                    AbstractBool::Maybe => lattice.any_bool(),
                };
                self.set_value(node, result)?;
            }

            NodeKind::Identical { left, right } => {
                let result = lattice.identical(self.value(*left), self.value(*right));
                if !result.is_nothing() {
                    self.set_value(node, result)?;
                }
            }

            NodeKind::ApplyBuiltinOperator { operator, arguments } => {
                if arguments.len() != operator.arity() {
                    return Err(PropagationError::BuiltinArity {
                        node,
                        operator: *operator,
                        expected: operator.arity(),
                        found: arguments.len(),
                    });
                }
                if arguments.iter().any(|a| self.value(*a).is_nothing()) {
                    return Ok(());
                }
                let ty = types.builtin_result_type(operator.result());
                self.set_value(node, lattice.non_constant(ty))?;
            }

            NodeKind::Throw { .. } | NodeKind::Unreachable | NodeKind::Parameter { .. } | NodeKind::MutableVariable => {}
        }
        Ok(())
    }
}

/// True unless both values are non-constants and `new` lost classes `old`
/// had
fn covers(new: &AbstractValue, old: &AbstractValue) -> bool {
    match (new, old) {
        (AbstractValue::NonConstant { ty: new }, AbstractValue::NonConstant { ty: old }) => new.contains_mask(old),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_system::ConstantSystem;
    use crate::type_mask::TypeMask;
    use crate::type_system::{InferenceResults, TypeMaskSystem};
    use crate::world::ClassWorld;
    use typeprop_ir::{BuiltinOperator, ClassId, DartType, ElementId, Selector};

    fn analyze(graph: &Graph, oracle: &InferenceResults) -> Result<AnalysisResult> {
        let world = ClassWorld::core();
        let constants = ConstantSystem::new();
        let types = TypeMaskSystem::new(&world, oracle, &constants);
        let lattice = ConstantPropagationLattice::new(&types, &constants);
        TypePropagationVisitor::new(graph, &lattice).analyze()
    }

    #[test]
    fn test_missing_root() {
        let graph = Graph::new();
        assert_eq!(
            analyze(&graph, &InferenceResults::new()).unwrap_err(),
            PropagationError::MissingRoot
        );
    }

    #[test]
    fn test_constant_flows_into_return() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let c = g.constant(ConstantValue::Int(7));
        let exit = g.invoke_continuation(ret, &[c]);
        let body = g.let_prim(c, exit);
        g.function(ElementId(0), None, &[], ret, body);

        let result = analyze(&g, &InferenceResults::new()).unwrap();
        let NodeKind::Continuation { parameters, .. } = g.kind(ret) else {
            panic!("not a continuation");
        };
        assert_eq!(result.value(parameters[0]).constant(), Some(&ConstantValue::Int(7)));
        assert!(result.is_reachable(ret));
        assert!(result.steps() > 0);
    }

    #[test]
    fn test_fold_records_replacement() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let three = g.constant(ConstantValue::Int(3));
        let four = g.constant(ConstantValue::Int(4));
        let r = g.parameter(None);
        let exit = g.invoke_continuation(ret, &[r]);
        let k = g.continuation(&[r], Some(exit));
        let add = g.invoke_method(three, Selector::operator("+"), &[four], k);
        let lc = g.let_cont(&[k], add);
        let lp4 = g.let_prim(four, lc);
        let lp3 = g.let_prim(three, lp4);
        g.function(ElementId(0), None, &[], ret, lp3);

        let result = analyze(&g, &InferenceResults::new()).unwrap();
        assert_eq!(result.replacement(add), Some(&ConstantValue::Int(7)));
        assert_eq!(result.value(r).constant(), Some(&ConstantValue::Int(7)));
    }

    #[test]
    fn test_non_operator_call_uses_oracle_and_is_not_replaced() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let s = g.constant(ConstantValue::string("abc"));
        let r = g.parameter(None);
        let exit = g.invoke_continuation(ret, &[r]);
        let k = g.continuation(&[r], Some(exit));
        let call = g.invoke_method(s, Selector::getter("length"), &[], k);
        let lc = g.let_cont(&[k], call);
        let body = g.let_prim(s, lc);
        g.function(ElementId(0), None, &[], ret, body);

        let oracle = InferenceResults::new().with_selector("length", TypeMask::exact(ClassId::INT));
        let result = analyze(&g, &oracle).unwrap();
        assert_eq!(result.replacement(call), None);
        assert_eq!(
            result.value(r),
            &AbstractValue::NonConstant {
                ty: TypeMask::exact(ClassId::INT)
            }
        );
    }

    #[test]
    fn test_branch_on_parameter_reaches_both_sides() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let flag = g.parameter(Some(ElementId(1)));
        let a = g.constant(ConstantValue::Int(1));
        let then_exit = g.invoke_continuation(ret, &[a]);
        let then_body = g.let_prim(a, then_exit);
        let then_k = g.continuation(&[], Some(then_body));
        let b = g.constant(ConstantValue::Int(2));
        let else_exit = g.invoke_continuation(ret, &[b]);
        let else_body = g.let_prim(b, else_exit);
        let else_k = g.continuation(&[], Some(else_body));
        let branch = g.branch(flag, then_k, else_k);
        let body = g.let_cont(&[then_k, else_k], branch);
        g.function(ElementId(0), None, &[flag], ret, body);

        let result = analyze(&g, &InferenceResults::new()).unwrap();
        assert!(result.is_reachable(then_k));
        assert!(result.is_reachable(else_k));
        let NodeKind::Continuation { parameters, .. } = g.kind(ret) else {
            panic!("not a continuation");
        };
        assert_eq!(
            result.value(parameters[0]),
            &AbstractValue::NonConstant {
                ty: TypeMask::exact(ClassId::INT)
            }
        );
    }

    #[test]
    fn test_non_bool_condition_is_widened() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let five = g.constant(ConstantValue::Int(5));
        let t = g.unreachable();
        let then_k = g.continuation(&[], Some(t));
        let e = g.unreachable();
        let else_k = g.continuation(&[], Some(e));
        let branch = g.branch(five, then_k, else_k);
        let lc = g.let_cont(&[then_k, else_k], branch);
        let body = g.let_prim(five, lc);
        g.function(ElementId(0), None, &[], ret, body);

        let result = analyze(&g, &InferenceResults::new()).unwrap();
        assert!(result.is_reachable(then_k) && result.is_reachable(else_k));
        assert!(result.value(five).is_non_constant());
    }

    #[test]
    fn test_failing_cast_leaves_continuation_unreachable() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let s = g.constant(ConstantValue::string("s"));
        let r = g.parameter(None);
        let exit = g.invoke_continuation(ret, &[r]);
        let k = g.continuation(&[r], Some(exit));
        let cast = g.type_cast(s, DartType::int(), k);
        let lc = g.let_cont(&[k], cast);
        let body = g.let_prim(s, lc);
        g.function(ElementId(0), None, &[], ret, body);

        let result = analyze(&g, &InferenceResults::new()).unwrap();
        assert!(!result.is_reachable(k));
        assert!(result.value(r).is_nothing());
    }

    #[test]
    fn test_arity_mismatch_is_an_internal_error() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let exit = g.invoke_continuation(ret, &[]);
        g.function(ElementId(0), None, &[], ret, exit);

        let err = analyze(&g, &InferenceResults::new()).unwrap_err();
        assert!(matches!(
            err,
            PropagationError::ContinuationArity {
                expected: 1,
                found: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_builtin_with_wrong_operand_count_is_rejected() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let one = g.constant(ConstantValue::Int(1));
        let add = g.builtin(BuiltinOperator::NumAdd, &[one]);
        let exit = g.invoke_continuation(ret, &[add]);
        let body = g.let_prim(add, exit);
        let body = g.let_prim(one, body);
        g.function(ElementId(0), None, &[], ret, body);

        let err = analyze(&g, &InferenceResults::new()).unwrap_err();
        assert_eq!(
            err,
            PropagationError::BuiltinArity {
                node: add,
                operator: BuiltinOperator::NumAdd,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_invoking_a_non_continuation_is_rejected() {
        let mut g = Graph::new();
        let ret = g.return_continuation();
        let c = g.constant(ConstantValue::Null);
        let exit = g.invoke_continuation(c, &[]);
        let body = g.let_prim(c, exit);
        g.function(ElementId(0), None, &[], ret, body);

        let err = analyze(&g, &InferenceResults::new()).unwrap_err();
        assert!(matches!(err, PropagationError::UnexpectedNode { found: "Constant", .. }));
    }
}
