//! # Typeprop IR
//!
//! The continuation-passing-style intermediate representation the
//! propagation pass reads and rewrites.
//!
//! A function is a tree of expressions rooted at a `FunctionDefinition`.
//! Values are produced by definitions (constants, parameters, primitives,
//! continuation parameters) and consumed by reference. Control flows only
//! through continuation invocations and branches, so every join point is an
//! explicit `Continuation` whose parameters act as phi nodes.
//!
//! ```rust
//! use typeprop_ir::{ConstantValue, ElementId, Graph, to_sexpr};
//!
//! let mut graph = Graph::new();
//! let ret = graph.return_continuation();
//! let seven = graph.constant(ConstantValue::Int(7));
//! let exit = graph.invoke_continuation(ret, &[seven]);
//! let body = graph.let_prim(seven, exit);
//! graph.function(ElementId(0), None, &[], ret, body);
//!
//! assert_eq!(
//!     to_sexpr(&graph),
//!     "(FunctionDefinition e0 () return (LetPrim (v0 (Constant (Int 7))) (InvokeContinuation return (v0))))"
//! );
//! ```

pub mod builtin;
pub mod constant;
pub mod graph;
pub mod ids;
pub mod node;
pub mod selector;
pub mod sexpr;
pub mod types;

pub use builtin::{BuiltinOperator, BuiltinResult};
pub use constant::ConstantValue;
pub use graph::{Graph, GraphError};
pub use ids::{ClassId, ElementId, NodeId};
pub use node::{Node, NodeKind, Operands};
pub use selector::{Selector, SelectorKind};
pub use sexpr::{to_sexpr, SExpressionPrinter};
pub use types::DartType;
