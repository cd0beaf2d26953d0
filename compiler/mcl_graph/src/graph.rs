//! The reactive dataflow graph data model: nodes emit
//! values, edges carry them between nodes. Node/edge identity uses a
//! monotonic index newtype rather than pointers, the same scheme
//! `mcl_ir::NodeId` uses for AST nodes, so graph topology stays
//! deterministic across identical inputs and node ids are allocated in
//! AST-visit order.

use mcl_ir::Name;
use mcl_types::{Type, Value};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct GraphNodeId(u32);

impl GraphNodeId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompositeKind {
    List,
    Map,
    Struct,
}

/// The five node kinds a lowered expression can become.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Emits one value, never changes.
    Const(Value),
    /// Emits a fresh container whenever any input updates.
    Composite { kind: CompositeKind, arity: usize },
    /// Three inputs `c, a, b`; emits `a` or `b` per current `c`.
    If,
    /// Invokes the built-in or user function `name` names; `name` is
    /// `None` for an inline function literal invoked anonymously.
    Call { name: Option<Name>, sig: Type },
    /// Single-input relay re-emitting whatever its bound expression emits.
    /// Exists so multiple uses of a variable share one upstream node via
    /// fan-out rather than duplicating the subgraph.
    Var(Name),
}

/// An edge's argument label: plain argument names, or for list/map/struct
/// builders, `0,1,…`, `key:i`/`val:i`, or field names.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum EdgeLabel {
    Index(usize),
    Key(usize),
    Val(usize),
    Field(Name),
    Arg(Name),
    Cond,
    Then,
    Else,
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub from: GraphNodeId,
    pub to: GraphNodeId,
    pub label: EdgeLabel,
}

/// The graph built by one `Prog`/`Res` lowering. Nodes and edges are
/// append-only: lowering never removes or rewrites a node once emitted.
#[derive(Default, Debug)]
pub struct Graph {
    nodes: Vec<NodeKind>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn push_node(&mut self, kind: NodeKind) -> GraphNodeId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX graph nodes in one program is unreachable in practice"
        )]
        let id = self.nodes.len() as u32;
        self.nodes.push(kind);
        GraphNodeId(id)
    }

    pub fn push_edge(&mut self, from: GraphNodeId, to: GraphNodeId, label: EdgeLabel) {
        self.edges.push(Edge { from, to, label });
    }

    pub fn node(&self, id: GraphNodeId) -> &NodeKind {
        &self.nodes[id.0 as usize]
    }

    pub fn nodes(&self) -> &[NodeKind] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_into(&self, to: GraphNodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.to == to)
    }

    pub fn edges_from(&self, from: GraphNodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == from)
    }
}
