//! # Typeprop Core
//!
//! Sparse conditional constant and type propagation for the typeprop CPS
//! IR, followed by the rewrites the computed facts justify.
//!
//! ## Modules
//!
//! - **[`world`]** - Closed-world class hierarchy
//! - **[`type_mask`]** / **[`type_system`]** - Approximate types and the inference oracle
//! - **[`constant_system`]** - Constant folding with JS number semantics
//! - **[`lattice`]** - Abstract values and their join
//! - **[`propagation`]** - Fixpoint analysis, graph transform and the pass driver
//! - **[`config`]** - Pass options
//!
//! ## Quick Start
//!
//! ```rust
//! use typeprop_core::prelude::*;
//! use typeprop_ir::{ConstantValue, ElementId, Graph, Selector};
//!
//! // return 3 + 4;
//! let mut graph = Graph::new();
//! let ret = graph.return_continuation();
//! let three = graph.constant(ConstantValue::Int(3));
//! let four = graph.constant(ConstantValue::Int(4));
//! let sum = graph.parameter(None);
//! let exit = graph.invoke_continuation(ret, &[sum]);
//! let k = graph.continuation(&[sum], Some(exit));
//! let add = graph.invoke_method(three, Selector::operator("+"), &[four], k);
//! let body = graph.let_cont(&[k], add);
//! let body = graph.let_prim(four, body);
//! let body = graph.let_prim(three, body);
//! graph.function(ElementId(0), None, &[], ret, body);
//!
//! let world = ClassWorld::core();
//! let oracle = InferenceResults::new();
//! let propagator = TypePropagator::new(&world, &oracle, PropagatorOptions::default());
//! let stats = propagator.rewrite(&mut graph).unwrap();
//! assert_eq!(stats.transform.constants_folded, 1);
//! ```

pub mod config;
pub mod constant_system;
pub mod error;
pub mod lattice;
pub mod propagation;
pub mod type_mask;
pub mod type_system;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PropagatorOptions;
    pub use crate::error::PropagationError;
    pub use crate::lattice::{AbstractBool, AbstractValue, ConstantPropagationLattice};
    pub use crate::propagation::{AnalysisResult, PropagationStats, TypePropagator};
    pub use crate::type_mask::TypeMask;
    pub use crate::type_system::{InferenceResults, TypeMaskSystem, TypeOracle};
    pub use crate::world::ClassWorld;
}

pub use config::PropagatorOptions;
pub use constant_system::{BinaryOperator, ConstantSystem, UnaryOperator};
pub use error::{PropagationError, Result};
pub use lattice::{AbstractBool, AbstractValue, ConstantPropagationLattice, ValueKind};
pub use propagation::{
    AnalysisResult, PropagationStats, TransformStats, TransformingVisitor, TypePropagationVisitor, TypePropagator,
};
pub use type_mask::TypeMask;
pub use type_system::{InferenceResults, TypeMaskSystem, TypeOracle};
pub use world::{ClassInfo, ClassWorld, ClassWorldBuilder};
