//! Expression-to-subgraph lowering: "every expression's
//! `graph()` returns a subgraph rooted at a node representing its value.
//! Statements do not add graph vertices of their own but aggregate
//! children's subgraphs."
//!
//! Mirrors the scope threading in `mcl_typeck::collect` (bind `Bind`/
//! `FuncDecl` names before descending, clone the scope into a fresh child
//! for `If`/`For`/`ForKv` bodies) rather than reusing a `Visitor` impl,
//! since lowering an expression must return the `GraphNodeId` its value
//! lives at rather than walk for side effects alone.

use mcl_ir::{CallExpr, Expr, ExprKind, FuncLit, IfExpr, Name, NodeId, TypeAst};
use mcl_scope::Scope;
use mcl_types::{FuncKind, FuncValue, Type, Value};
use rustc_hash::FxHashMap;

use crate::graph::{CompositeKind, EdgeLabel, Graph, GraphNodeId, NodeKind};

/// Lowers expressions into `graph`, caching each bound expression's root
/// node by its AST [`NodeId`] so every `Var` occurrence that refers to it
/// shares one upstream node instead of lowering the subgraph again
///.
pub struct Lowerer<'a> {
    graph: &'a mut Graph,
    cache: FxHashMap<NodeId, GraphNodeId>,
}

impl<'a> Lowerer<'a> {
    pub fn new(graph: &'a mut Graph) -> Self {
        Lowerer {
            graph,
            cache: FxHashMap::default(),
        }
    }

    /// Binds `Bind`/`FuncDecl` names into a child of `parent` (same two-pass
    /// shape as `mcl_scope::resolve::set_scope_inner`) and lowers every
    /// `Bind` value so later `Var` references resolve against a cached
    /// root, matching in statement order so earlier binds are visible to
    /// later ones in the block (variables in this language aren't
    /// recursive across a block).
    pub fn lower_block(&mut self, stmts: &[mcl_ir::Stmt], parent: &Scope) -> Scope {
        use mcl_ir::StmtKind;
        let mut local = parent.clone();
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Bind { name, value } => {
                    self.lower_expr(value, &local);
                    local.bind_variable(*name, value.clone());
                }
                StmtKind::FuncDecl { name, params, out, body } => {
                    let signature = Expr {
                        id: stmt.id,
                        span: stmt.span,
                        kind: ExprKind::Func(FuncLit {
                            params: params.clone(),
                            out: out.clone(),
                            body: Box::new(body.clone()),
                        }),
                        type_ann: None,
                    };
                    local.bind_function(*name, signature);
                }
                _ => {}
            }
        }
        local
    }

    pub fn lower_expr(&mut self, expr: &Expr, scope: &Scope) -> GraphNodeId {
        mcl_stack::ensure_sufficient_stack(|| self.lower_expr_inner(expr, scope))
    }

    fn lower_expr_inner(&mut self, expr: &Expr, scope: &Scope) -> GraphNodeId {
        if let Some(&cached) = self.cache.get(&expr.id) {
            return cached;
        }
        let id = match &expr.kind {
            ExprKind::Bool(b) => self.graph.push_node(NodeKind::Const(Value::Bool(*b))),
            ExprKind::Int(i) => self.graph.push_node(NodeKind::Const(Value::Int(*i))),
            ExprKind::Float(f) => self.graph.push_node(NodeKind::Const(Value::Float(*f))),
            ExprKind::Str(s) => self.graph.push_node(NodeKind::Const(Value::Str(s.clone()))),
            ExprKind::List(items) => self.composite(CompositeKind::List, items, scope, |i| EdgeLabel::Index(i)),
            ExprKind::Map(entries) => self.lower_map(entries, scope),
            ExprKind::Struct(fields) => self.lower_struct(fields, scope),
            ExprKind::Var(name) => self.lower_var(*name, scope),
            ExprKind::Call(call) => self.lower_call(call, scope),
            ExprKind::Func(func) => self.lower_func(func, scope),
            ExprKind::If(if_expr) => self.lower_if(if_expr, scope),
        };
        self.cache.insert(expr.id, id);
        id
    }

    fn composite(
        &mut self,
        kind: CompositeKind,
        items: &[Expr],
        scope: &Scope,
        label: impl Fn(usize) -> EdgeLabel,
    ) -> GraphNodeId {
        let inputs: Vec<GraphNodeId> = items.iter().map(|item| self.lower_expr(item, scope)).collect();
        let node = self.graph.push_node(NodeKind::Composite { kind, arity: inputs.len() });
        for (i, input) in inputs.into_iter().enumerate() {
            self.graph.push_edge(input, node, label(i));
        }
        node
    }

    fn lower_map(&mut self, entries: &[mcl_ir::MapEntry], scope: &Scope) -> GraphNodeId {
        let mut inputs = Vec::with_capacity(entries.len() * 2);
        for entry in entries {
            inputs.push((self.lower_expr(&entry.key, scope), EdgeLabel::Key(inputs.len() / 2)));
            inputs.push((self.lower_expr(&entry.value, scope), EdgeLabel::Val(inputs.len() / 2)));
        }
        let node = self
            .graph
            .push_node(NodeKind::Composite { kind: CompositeKind::Map, arity: entries.len() * 2 });
        for (input, label) in inputs {
            self.graph.push_edge(input, node, label);
        }
        node
    }

    fn lower_struct(&mut self, fields: &[mcl_ir::StructField], scope: &Scope) -> GraphNodeId {
        let inputs: Vec<(GraphNodeId, Name)> = fields
            .iter()
            .map(|field| (self.lower_expr(&field.value, scope), field.name))
            .collect();
        let node = self
            .graph
            .push_node(NodeKind::Composite { kind: CompositeKind::Struct, arity: fields.len() });
        for (input, name) in inputs {
            self.graph.push_edge(input, node, EdgeLabel::Field(name));
        }
        node
    }

    /// Every occurrence of a variable gets its own relay node; the single
    /// edge into it always comes from the (cached, shared) root of the
    /// expression it's bound to.
    fn lower_var(&mut self, name: Name, scope: &Scope) -> GraphNodeId {
        let relay = self.graph.push_node(NodeKind::Var(name));
        if let Some(bound) = scope.lookup_variable(name).cloned() {
            let root = self.lower_expr(&bound, scope);
            self.graph.push_edge(root, relay, EdgeLabel::Arg(name));
        } else if let Some(sig) = scope.lookup_function(name).cloned() {
            let root = self.lower_expr(&sig, scope);
            self.graph.push_edge(root, relay, EdgeLabel::Arg(name));
        }
        relay
    }

    fn lower_call(&mut self, call: &CallExpr, scope: &Scope) -> GraphNodeId {
        let param_names = scope.lookup_function(call.name).map(|sig| param_names_of(sig));
        let node = self.graph.push_node(NodeKind::Call {
            name: Some(call.name),
            sig: Type::Variant,
        });
        for (i, arg) in call.args.iter().enumerate() {
            let input = self.lower_expr(arg, scope);
            let name = param_names
                .as_ref()
                .and_then(|names| names.get(i).copied())
                .unwrap_or_else(|| positional_name(i));
            self.graph.push_edge(input, node, EdgeLabel::Arg(name));
        }
        node
    }

    /// A lambda literal's value is its signature (a `FuncValue` holds a
    /// closure over typed arguments); its body is only ever lowered by
    /// inlining at the higher-order call site that invokes it (e.g. the
    /// `GraphFn` capability `map`/`filter` use to wire a lambda directly
    /// into the graph), which is the external `FunctionLookup`
    /// collaborator's job, not this crate's. Standalone, it is an opaque
    /// constant: a graph consumer that wants to call it resolves the
    /// `Const` payload, not a subgraph.
    fn lower_func(&mut self, func: &FuncLit, _scope: &Scope) -> GraphNodeId {
        let ord: Vec<Name> = func.params.iter().map(|param| param.name).collect();
        let args: FxHashMap<Name, Type> = func
            .params
            .iter()
            .map(|param| (param.name, param.type_ann.as_ref().map_or(Type::Variant, type_ast_to_type)))
            .collect();
        let out = func.out.as_ref().map_or(Type::Variant, type_ast_to_type);
        let value = Value::Func(FuncValue {
            name: Name::EMPTY,
            ord,
            args,
            out: Box::new(out),
            kind: FuncKind::Graph,
        });
        self.graph.push_node(NodeKind::Const(value))
    }

    fn lower_if(&mut self, if_expr: &IfExpr, scope: &Scope) -> GraphNodeId {
        let cond = self.lower_expr(&if_expr.cond, scope);
        let then_id = self.lower_expr(&if_expr.then_branch, scope);
        let else_id = self.lower_expr(&if_expr.else_branch, scope);
        let node = self.graph.push_node(NodeKind::If);
        self.graph.push_edge(cond, node, EdgeLabel::Cond);
        self.graph.push_edge(then_id, node, EdgeLabel::Then);
        self.graph.push_edge(else_id, node, EdgeLabel::Else);
        node
    }
}

fn param_names_of(sig: &Expr) -> Vec<Name> {
    match &sig.kind {
        ExprKind::Func(func) => func.params.iter().map(|param| param.name).collect(),
        _ => Vec::new(),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "argument lists are small; `i` never approaches u32::MAX"
)]
fn positional_name(i: usize) -> Name {
    Name::from_raw(i as u32)
}

/// Mirrors `mcl_typeck::collect`'s conversion of the same source-written
/// annotation grammar; kept separate since graph lowering has no use for
/// the unifier's `Substitution`.
fn type_ast_to_type(ann: &TypeAst) -> Type {
    match ann {
        TypeAst::Bool => Type::Bool,
        TypeAst::Str => Type::Str,
        TypeAst::Int => Type::Int,
        TypeAst::Float => Type::Float,
        TypeAst::Variant => Type::Variant,
        TypeAst::UnificationVar(n) => Type::Unification(mcl_types::UnificationVar::from_display_index(*n)),
        TypeAst::List(elem) => Type::List(Box::new(type_ast_to_type(elem))),
        TypeAst::Map(key, val) => Type::Map(Box::new(type_ast_to_type(key)), Box::new(type_ast_to_type(val))),
        TypeAst::Struct(fields) => {
            let ord = fields.iter().map(|(name, _)| *name).collect();
            let fields = fields.iter().map(|(name, ty)| (*name, type_ast_to_type(ty))).collect();
            Type::struct_ty(ord, fields)
        }
        TypeAst::Func(args, out) => {
            let ord = args.iter().map(|(name, _)| *name).collect();
            let args = args.iter().map(|(name, ty)| (*name, type_ast_to_type(ty))).collect();
            Type::func(ord, args, type_ast_to_type(out.as_ref()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcl_ir::{NodeId, Span};

    fn int(id: u32, i: i64) -> Expr {
        Expr {
            id: NodeId::from_raw(id),
            span: Span::DUMMY,
            kind: ExprKind::Int(i),
            type_ann: None,
        }
    }

    fn var(id: u32, name: Name) -> Expr {
        Expr {
            id: NodeId::from_raw(id),
            span: Span::DUMMY,
            kind: ExprKind::Var(name),
            type_ann: None,
        }
    }

    #[test]
    fn repeated_variable_reference_shares_one_upstream_root() {
        let mut graph = Graph::new();
        let mut lowerer = Lowerer::new(&mut graph);
        let v = Name::from_raw(1);
        let mut scope = Scope::new();
        scope.bind_variable(v, int(1, 42));

        let first = lowerer.lower_expr(&var(2, v), &scope);
        let second = lowerer.lower_expr(&var(3, v), &scope);

        assert_ne!(first, second, "each reference gets its own relay node");
        assert_eq!(graph.edges_into(first).count(), 1);
        assert_eq!(graph.edges_into(second).count(), 1);
        let root_of = |relay: GraphNodeId| {
            graph
                .edges_into(relay)
                .next()
                .unwrap_or_else(|| panic!("relay {relay:?} has no incoming edge"))
                .from
        };
        assert_eq!(root_of(first), root_of(second), "both relays point at the same bound root");
    }

    #[test]
    fn list_fan_in_matches_element_count_with_index_labels() {
        let mut graph = Graph::new();
        let mut lowerer = Lowerer::new(&mut graph);
        let scope = Scope::new();
        let list = Expr {
            id: NodeId::from_raw(10),
            span: Span::DUMMY,
            kind: ExprKind::List(vec![int(11, 1), int(12, 2), int(13, 3)]),
            type_ann: None,
        };

        let node = lowerer.lower_expr(&list, &scope);

        let labels: Vec<&EdgeLabel> = graph.edges_into(node).map(|e| &e.label).collect();
        assert_eq!(labels.len(), 3);
        assert!(labels.contains(&&EdgeLabel::Index(0)));
        assert!(labels.contains(&&EdgeLabel::Index(1)));
        assert!(labels.contains(&&EdgeLabel::Index(2)));
    }

    #[test]
    fn if_wires_cond_then_else_edges() {
        let mut graph = Graph::new();
        let mut lowerer = Lowerer::new(&mut graph);
        let scope = Scope::new();
        let if_expr = Expr {
            id: NodeId::from_raw(20),
            span: Span::DUMMY,
            kind: ExprKind::If(IfExpr {
                cond: Box::new(Expr {
                    id: NodeId::from_raw(21),
                    span: Span::DUMMY,
                    kind: ExprKind::Bool(true),
                    type_ann: None,
                }),
                then_branch: Box::new(int(22, 1)),
                else_branch: Box::new(int(23, 2)),
            }),
            type_ann: None,
        };

        let node = lowerer.lower_expr(&if_expr, &scope);

        let labels: Vec<&EdgeLabel> = graph.edges_into(node).map(|e| &e.label).collect();
        assert_eq!(labels.len(), 3);
        assert!(labels.contains(&&EdgeLabel::Cond));
        assert!(labels.contains(&&EdgeLabel::Then));
        assert!(labels.contains(&&EdgeLabel::Else));
    }
}
