//! Tracks which [`NodeId`] a deep-copied node was copied from.
//!
//! The language this core reimplements detects recursive `include`s by
//! comparing the address of an `Include` AST node against a chain of
//! previously-included nodes. Rust node ids have no such address identity
//! once a node is deep-copied for a fresh `include` instance, so every copy
//! records, one hop at a time, the id it was copied from; [`CopyLineage::root`]
//! walks that chain back to the original node a whole lineage of copies
//! descends from.

use mcl_ir::NodeId;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct CopyLineage {
    copied_from: FxHashMap<NodeId, NodeId>,
}

impl CopyLineage {
    pub fn new() -> Self {
        CopyLineage::default()
    }

    pub fn record(&mut self, copy: NodeId, original: NodeId) {
        self.copied_from.insert(copy, original);
    }

    /// Follows the `copied_from` chain from `id` back to the first node
    /// with no recorded origin — the id the whole lineage descends from.
    pub fn root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        // Chains are only ever as deep as the include nesting in a single
        // program, so a plain loop (rather than needing cycle detection)
        // is sufficient: `record` is only ever called with a strictly
        // fresher copy id than its original.
        while let Some(&origin) = self.copied_from.get(&current) {
            current = origin;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_of_unrecorded_id_is_itself() {
        let lineage = CopyLineage::new();
        let id = NodeId::from_raw(5);
        assert_eq!(lineage.root(id), id);
    }

    #[test]
    fn root_follows_multi_hop_chain() {
        let mut lineage = CopyLineage::new();
        let original = NodeId::from_raw(0);
        let copy1 = NodeId::from_raw(10);
        let copy2 = NodeId::from_raw(20);
        lineage.record(copy1, original);
        lineage.record(copy2, copy1);
        assert_eq!(lineage.root(copy2), original);
    }
}
