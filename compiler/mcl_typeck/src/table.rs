//! [`TypeTable`]: the side table mapping every AST node to its inferred
//! type, kept off the node itself (`mcl_ir::Expr`'s doc comment on
//! `type_ann`) so the AST stays an immutable value.

use mcl_ir::NodeId;
use mcl_types::{Substitution, Type};
use rustc_hash::FxHashMap;

/// Every node that has contributed or consumed an invariant gets a slot
/// here, allocated lazily the first time it's referenced.
#[derive(Clone, Default)]
pub struct TypeTable {
    vars: FxHashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }

    /// The unification variable standing in for `id`'s type, allocating a
    /// fresh one in `subst` the first time `id` is seen.
    pub fn slot(&mut self, id: NodeId, subst: &mut Substitution) -> Type {
        self.vars
            .entry(id)
            .or_insert_with(|| Type::Unification(subst.fresh()))
            .clone()
    }

    /// The type currently on record for `id`, if it has been visited.
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.vars.get(&id)
    }

    /// Directly assigns `id`'s type without going through a fresh
    /// unification cell, used by `Any` and by nodes whose type is known
    /// outright (literals).
    pub fn bind(&mut self, id: NodeId, ty: Type) {
        self.vars.insert(id, ty);
    }

    /// Every node this table has a slot for, with its type resolved as
    /// deeply as `subst` currently allows.
    pub fn resolved(&self, subst: &mut Substitution) -> Vec<(NodeId, Type)> {
        let mut ids: Vec<NodeId> = self.vars.keys().copied().collect();
        ids.sort_by_key(NodeId::raw);
        ids.into_iter()
            .map(|id| {
                let ty = self.vars.get(&id).unwrap_or_else(|| unreachable!("id came from this map's own keys"));
                (id, subst.resolve_deep(ty))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_stable_across_calls() {
        let mut table = TypeTable::new();
        let mut subst = Substitution::new();
        let id = NodeId::from_raw(1);
        let a = table.slot(id, &mut subst);
        let b = table.slot(id, &mut subst);
        assert_eq!(a, b);
    }

    #[test]
    fn bind_overrides_without_allocating() {
        let mut table = TypeTable::new();
        let mut subst = Substitution::new();
        let id = NodeId::from_raw(1);
        table.bind(id, Type::Bool);
        assert_eq!(table.slot(id, &mut subst), Type::Bool);
    }
}
