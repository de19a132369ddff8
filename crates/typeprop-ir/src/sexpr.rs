//! S-expression rendering of a graph, for logs and tests
//!
//! Definitions are named in the order they are printed: values `v0, v1, ..`,
//! continuations `k0, k1, ..`, and the function's return continuation
//! `return`. Function parameters are named before the body.

use crate::graph::Graph;
use crate::ids::NodeId;
use crate::node::NodeKind;
use std::collections::HashMap;
use std::fmt::Write;

/// Prints a graph as an S-expression, naming values `v<N>` and
/// continuations `k<N>` in first-use order
pub struct SExpressionPrinter<'g> {
    graph: &'g Graph,
    names: HashMap<NodeId, String>,
    next_value: usize,
    next_continuation: usize,
}

impl<'g> SExpressionPrinter<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            names: HashMap::new(),
            next_value: 0,
            next_continuation: 0,
        }
    }

    /// Renders the graph from its root, or the empty string for a graph
    /// without one
    pub fn print_root(mut self) -> String {
        match self.graph.root() {
            Some(root) => self.print(root),
            None => String::new(),
        }
    }

    /// Renders the subtree at `id`
    pub fn print(&mut self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id);
        out
    }

    fn name(&mut self, id: NodeId) -> String {
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }
        let name = match self.graph.kind(id) {
            NodeKind::Continuation { is_return: true, .. } => "return".to_string(),
            NodeKind::Continuation { .. } => {
                let n = self.next_continuation;
                self.next_continuation += 1;
                format!("k{n}")
            }
            _ => {
                let n = self.next_value;
                self.next_value += 1;
                format!("v{n}")
            }
        };
        self.names.insert(id, name.clone());
        name
    }

    fn name_list(&mut self, ids: &[NodeId]) -> String {
        let names: Vec<String> = ids.iter().map(|&id| self.name(id)).collect();
        format!("({})", names.join(" "))
    }

    fn write_node(&mut self, out: &mut String, id: NodeId) {
        let kind = self.graph.kind(id).clone();
        match kind {
            NodeKind::FunctionDefinition {
                element,
                this_parameter,
                parameters,
                return_continuation,
                body,
            } => {
                let mut params = Vec::new();
                if let Some(this) = this_parameter {
                    params.push(this);
                }
                params.extend(parameters.iter().copied());
                let params = self.name_list(&params);
                let ret = self.name(return_continuation);
                let _ = write!(out, "(FunctionDefinition {element} {params} {ret} ");
                match body {
                    Some(body) => self.write_node(out, body),
                    None => out.push_str("()"),
                }
                out.push(')');
            }
            NodeKind::LetPrim { primitive, body } => {
                let name = self.name(primitive);
                let _ = write!(out, "(LetPrim ({name} ");
                self.write_node(out, primitive);
                out.push_str(") ");
                self.write_node(out, body);
                out.push(')');
            }
            NodeKind::LetCont { continuations, body } => {
                out.push_str("(LetCont (");
                for (i, &k) in continuations.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_continuation(out, k);
                }
                out.push_str(") ");
                self.write_node(out, body);
                out.push(')');
            }
            NodeKind::LetMutable {
                variable,
                initial_value,
                body,
            } => {
                let var = self.name(variable);
                let init = self.name(initial_value);
                let _ = write!(out, "(LetMutable ({var} {init}) ");
                self.write_node(out, body);
                out.push(')');
            }
            NodeKind::SetMutableVariable { variable, value, body } => {
                let var = self.name(variable);
                let value = self.name(value);
                let _ = write!(out, "(SetMutableVariable {var} {value} ");
                self.write_node(out, body);
                out.push(')');
            }
            NodeKind::InvokeStatic {
                target,
                arguments,
                continuation,
            } => {
                let args = self.name_list(&arguments);
                let k = self.name(continuation);
                let _ = write!(out, "(InvokeStatic {target} {args} {k})");
            }
            NodeKind::InvokeMethod {
                receiver,
                selector,
                arguments,
                continuation,
            } => {
                let receiver = self.name(receiver);
                let args = self.name_list(&arguments);
                let k = self.name(continuation);
                let _ = write!(out, "(InvokeMethod {receiver} {selector} {args} {k})");
            }
            NodeKind::ConcatenateStrings { arguments, continuation } => {
                let args = self.name_list(&arguments);
                let k = self.name(continuation);
                let _ = write!(out, "(ConcatenateStrings {args} {k})");
            }
            NodeKind::TypeCast { value, ty, continuation } => {
                let value = self.name(value);
                let k = self.name(continuation);
                let _ = write!(out, "(TypeCast {value} {ty} {k})");
            }
            NodeKind::InvokeContinuation { continuation, arguments } => {
                let k = self.name(continuation);
                let args = self.name_list(&arguments);
                let _ = write!(out, "(InvokeContinuation {k} {args})");
            }
            NodeKind::Branch {
                condition,
                true_continuation,
                false_continuation,
            } => {
                let condition = self.name(condition);
                let t = self.name(true_continuation);
                let f = self.name(false_continuation);
                let _ = write!(out, "(Branch {condition} {t} {f})");
            }
            NodeKind::Throw { value } => {
                let value = self.name(value);
                let _ = write!(out, "(Throw {value})");
            }
            NodeKind::Unreachable => out.push_str("(Unreachable)"),
            NodeKind::Constant { value } => {
                let _ = write!(out, "(Constant {value})");
            }
            NodeKind::Parameter { .. } | NodeKind::MutableVariable => {
                let name = self.name(id);
                out.push_str(&name);
            }
            NodeKind::Continuation { .. } => self.write_continuation(out, id),
            NodeKind::GetMutableVariable { variable } => {
                let var = self.name(variable);
                let _ = write!(out, "(GetMutableVariable {var})");
            }
            NodeKind::GetField { object, field } => {
                let object = self.name(object);
                let _ = write!(out, "(GetField {object} {field})");
            }
            NodeKind::TypeTest { value, ty } => {
                let value = self.name(value);
                let _ = write!(out, "(TypeTest {value} {ty})");
            }
            NodeKind::Identical { left, right } => {
                let left = self.name(left);
                let right = self.name(right);
                let _ = write!(out, "(Identical {left} {right})");
            }
            NodeKind::ApplyBuiltinOperator { operator, arguments } => {
                let args = self.name_list(&arguments);
                let _ = write!(out, "(ApplyBuiltinOperator {operator} {args})");
            }
        }
    }

    fn write_continuation(&mut self, out: &mut String, k: NodeId) {
        let NodeKind::Continuation { parameters, body, .. } = self.graph.kind(k).clone() else {
            let name = self.name(k);
            out.push_str(&name);
            return;
        };
        let name = self.name(k);
        let params = self.name_list(&parameters);
        let _ = write!(out, "({name} {params}");
        if let Some(body) = body {
            out.push(' ');
            self.write_node(out, body);
        }
        out.push(')');
    }
}

/// Renders the graph from its root
pub fn to_sexpr(graph: &Graph) -> String {
    SExpressionPrinter::new(graph).print_root()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantValue;
    use crate::ids::ElementId;
    use crate::selector::Selector;

    #[test]
    fn test_print_add_one() {
        let mut graph = Graph::new();
        let x = graph.parameter(Some(ElementId(1)));
        let ret = graph.return_continuation();
        let result = graph.parameter(None);
        let exit = graph.invoke_continuation(ret, &[result]);
        let k = graph.continuation(&[result], Some(exit));
        let one = graph.constant(ConstantValue::Int(1));
        let call = graph.invoke_method(x, Selector::operator("+"), &[one], k);
        let let_cont = graph.let_cont(&[k], call);
        let body = graph.let_prim(one, let_cont);
        graph.function(ElementId(0), None, &[x], ret, body);

        insta::assert_snapshot!(
            to_sexpr(&graph),
            @"(FunctionDefinition e0 (v0) return (LetPrim (v1 (Constant (Int 1))) (LetCont ((k0 (v2) (InvokeContinuation return (v2)))) (InvokeMethod v0 + (v1) k0))))"
        );
    }

    #[test]
    fn test_empty_graph_prints_nothing() {
        assert_eq!(to_sexpr(&Graph::new()), "");
    }
}
