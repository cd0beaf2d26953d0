//! The nine invariant kinds every AST node contributes to the solver
//!.

use mcl_ir::{Name, NodeId};
use mcl_types::Type;

/// A single constraint contributed by some AST node. Invariants reference
/// nodes by [`NodeId`] rather than borrowing `&Expr`, so the solver owns a
/// flat, self-contained worklist independent of the AST's lifetime.
#[derive(Clone, Debug)]
pub enum Invariant {
    /// `expr`'s inferred type must equal a concrete type.
    Equals(NodeId, Type),
    /// Two expressions share one type.
    Equality(NodeId, NodeId),
    /// All of `exprs` are pairwise equal.
    EqualityList(Vec<NodeId>),
    /// `list: []T` where `elem: T`.
    EqualityWrapList { list: NodeId, elem: NodeId },
    /// `map: map{K: V}` where `key: K`, `val: V`.
    EqualityWrapMap {
        map: NodeId,
        key: NodeId,
        val: NodeId,
    },
    /// `strct: struct{ord...}` where each `fields[i]: ord[i]`'s type.
    EqualityWrapStruct {
        strct: NodeId,
        ord: Vec<Name>,
        fields: Vec<(Name, NodeId)>,
    },
    /// Binds a call site to a callee signature: `func: func(ord...) out`
    /// where each argument in `args` types as the matching parameter and
    /// `out` (typically the call expression itself) types as the return.
    EqualityWrapFunc {
        func: NodeId,
        ord: Vec<Name>,
        args: Vec<(Name, NodeId)>,
        out: NodeId,
    },
    /// All of `invars` must hold.
    Conjunction(Vec<Invariant>),
    /// Exactly one alternative's conjunction holds.
    Exclusive(Vec<Invariant>),
    /// Accept any type; escape hatch for true variants.
    Any(NodeId),
}
