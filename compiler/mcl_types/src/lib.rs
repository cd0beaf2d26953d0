//! The type and value model: [`Type`], [`Value`],
//! and the [`Substitution`] union-find used to unify unification
//! variables. The invariant *solver* that drives unification lives one
//! layer up, in `mcl_typeck`; this crate only owns the data each side of
//! that solver operates on.

mod subst;
mod ty;
mod value;

pub use subst::{Substitution, UnificationVar};
pub use ty::{ComplexCmp, Type, TypeConflict};
pub use value::{FuncKind, FuncValue, Value, ValueError};
