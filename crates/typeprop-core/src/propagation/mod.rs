//! Type propagation pass
//!
//! [`TypePropagator`] analyzes a function graph with
//! [`TypePropagationVisitor`] and then rewrites it with
//! [`TransformingVisitor`]. The pass only disconnects code it proves dead;
//! a shrinking reduction must run afterwards to remove it.

mod analysis;
mod specialize;
mod transform;

pub use analysis::{AnalysisResult, TypePropagationVisitor};
pub use transform::{bound_constants, TransformStats, TransformingVisitor};

use crate::config::PropagatorOptions;
use crate::constant_system::ConstantSystem;
use crate::error::{PropagationError, Result};
use crate::lattice::ConstantPropagationLattice;
use crate::type_system::{TypeMaskSystem, TypeOracle};
use crate::world::ClassWorld;
use serde::Serialize;
use tracing::{error, info, trace};
use typeprop_ir::{to_sexpr, Graph};

/// Summary of one pass run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropagationStats {
    pub analysis_steps: usize,
    pub reachable_nodes: usize,
    pub replacements: usize,
    pub transform: TransformStats,
}

type InternalErrorHandler<'w> = Box<dyn Fn(&PropagationError) + 'w>;

/// Runs the analysis and then the transform over one function graph
pub struct TypePropagator<'w> {
    world: &'w ClassWorld,
    oracle: &'w dyn TypeOracle,
    constants: ConstantSystem,
    options: PropagatorOptions,
    on_internal_error: Option<InternalErrorHandler<'w>>,
}

impl<'w> TypePropagator<'w> {
    pub fn new(world: &'w ClassWorld, oracle: &'w dyn TypeOracle, options: PropagatorOptions) -> Self {
        Self {
            world,
            oracle,
            constants: ConstantSystem::new(),
            options,
            on_internal_error: None,
        }
    }

    /// Installs a callback told about every internal error before the pass
    /// returns it
    pub fn on_internal_error(mut self, handler: impl Fn(&PropagationError) + 'w) -> Self {
        self.on_internal_error = Some(Box::new(handler));
        self
    }

    pub fn options(&self) -> &PropagatorOptions {
        &self.options
    }

    /// Computes reachability, values and replacements without changing the
    /// graph
    pub fn analyze(&self, graph: &Graph) -> Result<AnalysisResult> {
        let types = TypeMaskSystem::new(self.world, self.oracle, &self.constants);
        let lattice = ConstantPropagationLattice::new(&types, &self.constants);
        TypePropagationVisitor::new(graph, &lattice)
            .analyze()
            .map_err(|e| self.report(e))
    }

    /// Runs the whole pass on `graph`
    pub fn rewrite(&self, graph: &mut Graph) -> Result<PropagationStats> {
        let root = graph.root().ok_or_else(|| self.report(PropagationError::MissingRoot))?;
        graph.link_parents(root);
        if self.options.trace_graphs {
            trace!(graph = %to_sexpr(graph), "before type propagation");
        }

        let types = TypeMaskSystem::new(self.world, self.oracle, &self.constants);
        let lattice = ConstantPropagationLattice::new(&types, &self.constants);
        let analysis = TypePropagationVisitor::new(graph, &lattice)
            .analyze()
            .map_err(|e| self.report(e))?;
        let transform = TransformingVisitor::new(graph, &lattice, &analysis, &self.options)
            .transform()
            .map_err(|e| self.report(e))?;

        let stats = PropagationStats {
            analysis_steps: analysis.steps(),
            reachable_nodes: analysis.reachable_count(),
            replacements: analysis.replacement_count(),
            transform,
        };
        info!(
            steps = stats.analysis_steps,
            reachable = stats.reachable_nodes,
            rewrites = stats.transform.total(),
            "type propagation done"
        );
        if self.options.trace_graphs {
            trace!(graph = %to_sexpr(graph), "after type propagation");
        }
        Ok(stats)
    }

    fn report(&self, err: PropagationError) -> PropagationError {
        error!(error = %err, "internal error in type propagation");
        if let Some(handler) = &self.on_internal_error {
            handler(&err);
        }
        err
    }
}
