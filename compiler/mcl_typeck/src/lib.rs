//! Invariant-based type unification: every AST node
//! contributes one or more [`Invariant`]s to a flat worklist, which
//! [`Solver`] runs to a fixed point over a [`TypeTable`].
//!
//! The pipeline is: [`collect::collect_invariants`] walks a resolved
//! program and produces the worklist; [`Solver::solve`] discharges it;
//! [`TypeTable::resolved`] reads back the final answer.

mod collect;
mod invariant;
mod poly;
mod solver;
mod table;

pub use collect::collect_invariants;
pub use invariant::Invariant;
pub use poly::{MemoizedPolymorphisms, Polymorphisms};
pub use solver::Solver;
pub use table::TypeTable;
