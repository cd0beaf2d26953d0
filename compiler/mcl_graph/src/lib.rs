//! Reactive dataflow graph lowering and `Output()` generation: turns a
//! resolved, type-checked [`mcl_ir::ast::Prog`] into a
//! [`Graph`] of value-emitting nodes plus the resources and edges its
//! `Res`/`Edge` statements declare.
//!
//! [`lower::Lowerer`] builds the graph from expressions; [`output`] walks
//! the result to materialize resources through the `ResourceRegistry`/
//! `FieldNameMap` collaborators an embedder supplies.

mod graph;
mod lower;
mod output;

pub use graph::{CompositeKind, Edge, EdgeLabel, Graph, GraphNodeId, NodeKind};
pub use lower::Lowerer;
pub use output::{EdgeQuad, FieldAssignError, FieldNameMap, ProgOutput, ResourceRegistry, output_prog};
