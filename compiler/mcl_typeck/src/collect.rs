//! Walks a resolved program and produces the flat invariant worklist
//! [`Solver`](crate::Solver) consumes. Mirrors the scope
//! threading in `mcl_scope::resolve::set_scope_inner` (bind names in
//! source order, then recurse into children with the extended scope), but
//! emits [`Invariant`]s at each node instead of expanding `include`s.

use mcl_ir::{CallExpr, Expr, ExprKind, FuncLit, IfExpr, Name, NodeId, NodeIdGen, Prog, ResEntry, Span, Stmt, StmtKind};
use mcl_scope::Scope;
use mcl_types::{Type, Value};
use rustc_hash::FxHashMap;

use crate::invariant::Invariant;
use crate::poly::Polymorphisms;

/// Walks `prog` and returns every invariant it contributes, plus a
/// `NodeId -> Span` map the solver uses to locate a conflict. `builtins`
/// supplies signatures for calls that don't resolve to a user function
/// (operators, `len`, `_collect`, ...).
#[tracing::instrument(level = "debug", skip_all)]
pub fn collect_invariants(
    prog: &Prog,
    id_gen: &NodeIdGen,
    builtins: &dyn Polymorphisms,
) -> (Vec<Invariant>, FxHashMap<NodeId, Span>) {
    let mut ctx = Ctx {
        id_gen,
        builtins,
        invariants: Vec::new(),
        spans: FxHashMap::default(),
    };
    ctx.block(&prog.body, &Scope::new());
    (ctx.invariants, ctx.spans)
}

struct Ctx<'a> {
    id_gen: &'a NodeIdGen,
    builtins: &'a dyn Polymorphisms,
    invariants: Vec<Invariant>,
    spans: FxHashMap<NodeId, Span>,
}

impl Ctx<'_> {
    fn note(&mut self, id: NodeId, span: Span) {
        self.spans.entry(id).or_insert(span);
    }

    fn push(&mut self, inv: Invariant) {
        self.invariants.push(inv);
    }

    /// Binds every `Bind`/`FuncDecl` name in `stmts` (source order, so
    /// forward references see the final binding) before walking children,
    /// the same two-pass shape `set_scope_inner` uses.
    fn block(&mut self, stmts: &[Stmt], parent: &Scope) {
        let mut local = parent.clone();
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Bind { name, value } => local.bind_variable(*name, value.clone()),
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
        for stmt in stmts {
            self.stmt(stmt, &local);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, scope: &Scope) {
        self.note(stmt.id, stmt.span);
        match &stmt.kind {
            StmtKind::Bind { value, .. } => self.expr(value, scope),
            StmtKind::Res { kind, name, entries, .. } => {
                self.expr(kind, scope);
                self.expr(name, scope);
                self.push(Invariant::Equals(kind.id, Type::Str));
                self.push(Invariant::Equals(name.id, Type::Str));
                for entry in entries {
                    self.res_entry(entry, scope);
                }
            }
            StmtKind::Edge { chain } => {
                for half in chain {
                    self.expr(&half.kind, scope);
                    self.expr(&half.name, scope);
                    self.push(Invariant::Equals(half.kind.id, Type::Str));
                    self.push(Invariant::Equals(half.name.id, Type::Str));
                }
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                self.expr(cond, scope);
                self.push(Invariant::Equals(cond.id, Type::Bool));
                self.block(then_branch, scope);
                self.block(else_branch, scope);
            }
            StmtKind::For { idx, val, container, body } => {
                self.expr(container, scope);
                let idx_id = self.id_gen.next_id();
                let elem_id = self.id_gen.next_id();
                self.push(Invariant::Equals(idx_id, Type::Int));
                self.push(Invariant::EqualityWrapList { list: container.id, elem: elem_id });
                let mut child = scope.clone();
                child.bind_variable(*idx, placeholder(idx_id, stmt.span));
                child.bind_variable(*val, placeholder(elem_id, stmt.span));
                self.block(body, &child);
            }
            StmtKind::ForKv { key, val, container, body } => {
                self.expr(container, scope);
                let key_id = self.id_gen.next_id();
                let val_id = self.id_gen.next_id();
                self.push(Invariant::EqualityWrapMap { map: container.id, key: key_id, val: val_id });
                let mut child = scope.clone();
                child.bind_variable(*key, placeholder(key_id, stmt.span));
                child.bind_variable(*val, placeholder(val_id, stmt.span));
                self.block(body, &child);
            }
            StmtKind::FuncDecl { params, out, body, .. } => self.func_signature(stmt.id, params, out, body, scope),
            StmtKind::Class { .. } => {
                // Resolved at its `include` sites; the declaration left in
                // the tree for round-tripping carries no type obligation.
            }
            StmtKind::Include { args, .. } => {
                for arg in args {
                    self.expr(arg, scope);
                }
            }
            StmtKind::Import { .. } | StmtKind::Comment(_) => {}
            StmtKind::Panic { cond } => {
                self.expr(cond, scope);
                self.push(Invariant::Equals(cond.id, Type::Bool));
            }
        }
    }

    fn res_entry(&mut self, entry: &ResEntry, scope: &Scope) {
        match entry {
            ResEntry::Field { cond, value, span, .. } => {
                self.note(value.id, *span);
                if let Some(cond) = cond {
                    self.expr(cond, scope);
                    self.push(Invariant::Equals(cond.id, Type::Bool));
                }
                self.expr(value, scope);
            }
            ResEntry::EdgeMeta { cond, half, span, .. } => {
                self.note(half.kind.id, *span);
                if let Some(cond) = cond {
                    self.expr(cond, scope);
                    self.push(Invariant::Equals(cond.id, Type::Bool));
                }
                self.expr(&half.kind, scope);
                self.expr(&half.name, scope);
                self.push(Invariant::Equals(half.kind.id, Type::Str));
                self.push(Invariant::Equals(half.name.id, Type::Str));
            }
            ResEntry::MetaProp { value, span, .. } => {
                self.note(value.id, *span);
                self.expr(value, scope);
            }
            ResEntry::MetaStruct { cond, value, span, .. } => {
                self.note(value.id, *span);
                if let Some(cond) = cond {
                    self.expr(cond, scope);
                    self.push(Invariant::Equals(cond.id, Type::Bool));
                }
                self.expr(value, scope);
            }
        }
    }

    /// Binds the declared signature to `sig_id` (the `FuncDecl`/`FuncLit`'s
    /// own node): each param that carries an explicit annotation is pinned
    /// to it, every other param and the return type are left to whatever
    /// the body's usage and `EqualityWrapFunc` call sites infer.
    fn func_signature(
        &mut self,
        sig_id: NodeId,
        params: &[mcl_ir::Param],
        out: &Option<mcl_ir::TypeAst>,
        body: &Expr,
        scope: &Scope,
    ) {
        let mut child = scope.clone();
        let mut ord = Vec::with_capacity(params.len());
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            let param_id = self.id_gen.next_id();
            if let Some(ann) = &param.type_ann {
                self.push(Invariant::Equals(param_id, type_ast_to_type(ann)));
            }
            ord.push(param.name);
            args.push((param.name, param_id));
            child.bind_variable(param.name, placeholder(param_id, param.span));
        }
        let out_id = match out {
            Some(ann) => {
                let out_id = self.id_gen.next_id();
                self.push(Invariant::Equals(out_id, type_ast_to_type(ann)));
                self.push(Invariant::Equality(body.id, out_id));
                out_id
            }
            None => body.id,
        };
        self.push(Invariant::EqualityWrapFunc { func: sig_id, ord, args, out: out_id });
        self.expr(body, &child);
    }

    fn expr(&mut self, expr: &Expr, scope: &Scope) {
        self.note(expr.id, expr.span);
        if let Some(ann) = &expr.type_ann {
            self.push(Invariant::Equals(expr.id, type_ast_to_type(ann)));
        }
        match &expr.kind {
            ExprKind::Bool(_) => self.push(Invariant::Equals(expr.id, Type::Bool)),
            ExprKind::Int(_) => self.push(Invariant::Equals(expr.id, Type::Int)),
            ExprKind::Float(_) => self.push(Invariant::Equals(expr.id, Type::Float)),
            ExprKind::Str(_) => self.push(Invariant::Equals(expr.id, Type::Str)),
            ExprKind::List(items) => {
                for item in items {
                    self.expr(item, scope);
                }
                if let Some(first) = items.first() {
                    self.push(Invariant::EqualityWrapList { list: expr.id, elem: first.id });
                    let ids: Vec<NodeId> = items.iter().map(|i| i.id).collect();
                    self.push(Invariant::EqualityList(ids));
                } else {
                    self.push(Invariant::Any(expr.id));
                }
            }
            ExprKind::Map(entries) => {
                for entry in entries {
                    self.expr(&entry.key, scope);
                    self.expr(&entry.value, scope);
                }
                if let Some(first) = entries.first() {
                    self.push(Invariant::EqualityWrapMap {
                        map: expr.id,
                        key: first.key.id,
                        val: first.value.id,
                    });
                    let keys: Vec<NodeId> = entries.iter().map(|e| e.key.id).collect();
                    let vals: Vec<NodeId> = entries.iter().map(|e| e.value.id).collect();
                    self.push(Invariant::EqualityList(keys));
                    self.push(Invariant::EqualityList(vals));
                } else {
                    self.push(Invariant::Any(expr.id));
                }
            }
            ExprKind::Struct(fields) => {
                let mut ord = Vec::with_capacity(fields.len());
                let mut field_ids = Vec::with_capacity(fields.len());
                for field in fields {
                    self.expr(&field.value, scope);
                    ord.push(field.name);
                    field_ids.push((field.name, field.value.id));
                }
                self.push(Invariant::EqualityWrapStruct { strct: expr.id, ord, fields: field_ids });
            }
            ExprKind::Var(name) => self.var(expr.id, *name, scope),
            ExprKind::Call(call) => self.call(expr.id, call, scope),
            ExprKind::Func(func) => self.func_signature(expr.id, &func.params, &func.out, &func.body, scope),
            ExprKind::If(if_expr) => self.if_expr(expr.id, if_expr, scope),
        }
    }

    fn var(&mut self, id: NodeId, name: Name, scope: &Scope) {
        if let Some(referent) = scope.lookup_variable(name) {
            self.push(Invariant::Equality(id, referent.id));
        } else if let Some(sig) = scope.lookup_function(name) {
            self.push(Invariant::Equality(id, sig.id));
        } else {
            // Resolved elsewhere (e.g. a name an external registry owns);
            // the unifier can't pin it down further than "some type".
            self.push(Invariant::Any(id));
        }
    }

    fn if_expr(&mut self, id: NodeId, if_expr: &IfExpr, scope: &Scope) {
        self.expr(&if_expr.cond, scope);
        self.expr(&if_expr.then_branch, scope);
        self.expr(&if_expr.else_branch, scope);
        self.push(Invariant::Equals(if_expr.cond.id, Type::Bool));
        self.push(Invariant::EqualityList(vec![id, if_expr.then_branch.id, if_expr.else_branch.id]));
    }

    fn call(&mut self, id: NodeId, call: &CallExpr, scope: &Scope) {
        for arg in &call.args {
            self.expr(arg, scope);
        }
        if let Some(sig) = scope.lookup_function(call.name) {
            let ExprKind::Func(FuncLit { params, .. }) = &sig.kind else {
                unreachable!("lookup_function only ever stores ExprKind::Func signatures")
            };
            let ord: Vec<Name> = params.iter().map(|p| p.name).collect();
            let args: Vec<(Name, NodeId)> = ord
                .iter()
                .zip(call.args.iter())
                .map(|(name, arg)| (*name, arg.id))
                .collect();
            self.push(Invariant::EqualityWrapFunc { func: sig.id, ord, args, out: id });
            return;
        }

        let partial_values: Vec<Option<Value>> = call.args.iter().map(literal_value).collect();
        let candidates = self.builtins.polymorphisms(call.name, &Type::Variant, &partial_values);
        let alternatives: Vec<Invariant> = candidates
            .into_iter()
            .map(|candidate| {
                let mut parts: Vec<Invariant> = candidate
                    .ord
                    .iter()
                    .zip(call.args.iter())
                    .filter_map(|(name, arg)| candidate.args.get(name).map(|ty| Invariant::Equals(arg.id, ty.clone())))
                    .collect();
                parts.push(Invariant::Equals(id, (*candidate.out).clone()));
                Invariant::Conjunction(parts)
            })
            .collect();
        if alternatives.is_empty() {
            // No registered signature at all: behaves like an unconstrained
            // external name.
            self.push(Invariant::Any(id));
        } else {
            self.push(Invariant::Exclusive(alternatives));
        }
    }
}

fn placeholder(id: NodeId, span: Span) -> Expr {
    Expr {
        id,
        span,
        kind: ExprKind::Bool(true),
        type_ann: None,
    }
}

/// Only literal expressions carry a constant value a `Polymorphisms`
/// source can prune on; anything else contributes no
/// partial value.
fn literal_value(expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Bool(b) => Some(Value::Bool(*b)),
        ExprKind::Int(i) => Some(Value::Int(*i)),
        ExprKind::Float(f) => Some(Value::Float(*f)),
        ExprKind::Str(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}

/// Converts a source-written annotation into the resolved type grammar.
/// Total: every `TypeAst` variant names a type outright, no inference
/// needed (only `Expr`s without an annotation are left to the solver).
fn type_ast_to_type(ann: &mcl_ir::TypeAst) -> Type {
    use mcl_ir::TypeAst;
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
            let ord: Vec<Name> = fields.iter().map(|(n, _)| *n).collect();
            let field_types = fields.iter().map(|(n, t)| (*n, type_ast_to_type(t))).collect();
            Type::struct_ty(ord, field_types)
        }
        TypeAst::Func(params, out) => {
            let ord: Vec<Name> = params.iter().map(|(n, _)| *n).collect();
            let args = params.iter().map(|(n, t)| (*n, type_ast_to_type(t))).collect();
            Type::func(ord, args, type_ast_to_type(out))
        }
    }
}
