//! `set_scope`: the four-step scope-resolution walk and `Include`
//! expansion.

use mcl_diagnostic::{Diagnostic, ErrorCode, Result};
use mcl_ir::{
    CallExpr, EdgeHalf, Expr, ExprKind, FuncLit, IfExpr, MapEntry, NodeId, NodeIdGen, Param,
    ResEntry, Span, Stmt, StmtKind, StructField,
};
use rustc_hash::FxHashMap;

use crate::lineage::CopyLineage;
use crate::scope::{ClassDef, Scope};
use crate::import::{self, ImportData};

/// The output of resolving one program: its statement list with every
/// `Include` expanded into a fresh copy of the referenced class's body,
/// and the classified import directives collected along the way.
pub struct ScopeResult {
    pub body: Vec<Stmt>,
    pub imports: Vec<ImportData>,
}

/// Walks `body`, threading `parent` downward. `id_gen` and
/// `lineage` are shared across the whole resolve so `Include` copies get
/// fresh, globally-unique ids whose ancestry `lineage` can trace back to
/// the class body they were copied from.
#[tracing::instrument(level = "debug", skip_all)]
pub fn set_scope(
    body: &[Stmt],
    parent: &Scope,
    id_gen: &NodeIdGen,
    lineage: &mut CopyLineage,
) -> Result<ScopeResult> {
    mcl_stack::ensure_sufficient_stack(|| set_scope_inner(body, parent, id_gen, lineage))
}

fn set_scope_inner(
    body: &[Stmt],
    parent: &Scope,
    id_gen: &NodeIdGen,
    lineage: &mut CopyLineage,
) -> Result<ScopeResult> {
    let mut local = parent.clone();
    let mut declared_at: FxHashMap<mcl_ir::Name, Span> = FxHashMap::default();
    let mut declared_classes_at: FxHashMap<mcl_ir::Name, Span> = FxHashMap::default();

    // 1. Bind names, 2. class declarations (collected in source order so
    // "prior declaration" always points at the earlier site).
    for stmt in body {
        match &stmt.kind {
            StmtKind::Bind { name, value } => {
                check_duplicate(*name, stmt.span, &mut declared_at)?;
                local.bind_variable(*name, value.clone());
            }
            StmtKind::FuncDecl { name, params, out, body: fn_body } => {
                check_duplicate(*name, stmt.span, &mut declared_at)?;
                let signature = Expr {
                    id: stmt.id,
                    span: stmt.span,
                    kind: ExprKind::Func(FuncLit {
                        params: params.clone(),
                        out: out.clone(),
                        body: Box::new(fn_body.clone()),
                    }),
                    type_ann: None,
                };
                local.bind_function(*name, signature);
            }
            StmtKind::Class { name, params, body: class_body } => {
                if let Some(prior) = declared_classes_at.get(name) {
                    return Err(duplicate_error(*name, stmt.span, *prior));
                }
                declared_classes_at.insert(*name, stmt.span);
                local.declare_class(
                    *name,
                    ClassDef {
                        params: params.clone(),
                        body: class_body.clone(),
                    },
                );
            }
            _ => {}
        }
    }

    // 3. Collect imports.
    let mut imports = Vec::new();
    for stmt in body {
        if let StmtKind::Import { raw } = &stmt.kind {
            match import::parse_import_name(raw) {
                Ok(data) => imports.push(data),
                Err(message) => {
                    return Err(Diagnostic::new(ErrorCode::ImportInvalid, message, Some(stmt.span)))
                }
            }
        }
    }

    // 4. Propagate the merged scope to non-class children, expanding
    // `Include` sites along the way.
    let mut resolved = Vec::with_capacity(body.len());
    for stmt in body {
        match &stmt.kind {
            StmtKind::Class { .. } => {
                // Class bodies are resolved at their `include` sites, not
                // pushed through here; the declaration itself still has a
                // place in the output tree so formatting round-trips.
                resolved.push(stmt.clone());
            }
            StmtKind::Include { name, args } => {
                let expanded = resolve_include(*name, args, stmt.id, stmt.span, &local, id_gen, lineage)?;
                resolved.extend(expanded);
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                let then_result = set_scope_inner(then_branch, &local, id_gen, lineage)?;
                let else_result = set_scope_inner(else_branch, &local, id_gen, lineage)?;
                resolved.push(Stmt {
                    id: stmt.id,
                    span: stmt.span,
                    kind: StmtKind::If {
                        cond: cond.clone(),
                        then_branch: then_result.body,
                        else_branch: else_result.body,
                    },
                });
            }
            StmtKind::For { idx, val, container, body: loop_body } => {
                let mut child = local.clone();
                child.bind_variable(*idx, placeholder_var(*idx, stmt.span));
                child.bind_variable(*val, placeholder_var(*val, stmt.span));
                let loop_result = set_scope_inner(loop_body, &child, id_gen, lineage)?;
                resolved.push(Stmt {
                    id: stmt.id,
                    span: stmt.span,
                    kind: StmtKind::For {
                        idx: *idx,
                        val: *val,
                        container: container.clone(),
                        body: loop_result.body,
                    },
                });
            }
            StmtKind::ForKv { key, val, container, body: loop_body } => {
                let mut child = local.clone();
                child.bind_variable(*key, placeholder_var(*key, stmt.span));
                child.bind_variable(*val, placeholder_var(*val, stmt.span));
                let loop_result = set_scope_inner(loop_body, &child, id_gen, lineage)?;
                resolved.push(Stmt {
                    id: stmt.id,
                    span: stmt.span,
                    kind: StmtKind::ForKv {
                        key: *key,
                        val: *val,
                        container: container.clone(),
                        body: loop_result.body,
                    },
                });
            }
            _ => resolved.push(stmt.clone()),
        }
    }

    Ok(ScopeResult { body: resolved, imports })
}

fn placeholder_var(name: mcl_ir::Name, span: Span) -> Expr {
    Expr {
        id: NodeId::DUMMY,
        span,
        kind: ExprKind::Var(name),
        type_ann: None,
    }
}

fn check_duplicate(
    name: mcl_ir::Name,
    span: Span,
    declared_at: &mut FxHashMap<mcl_ir::Name, Span>,
) -> Result<()> {
    if let Some(prior) = declared_at.get(&name) {
        return Err(duplicate_error(name, span, *prior));
    }
    declared_at.insert(name, span);
    Ok(())
}

fn duplicate_error(name: mcl_ir::Name, span: Span, prior: Span) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ScopeDuplicate,
        format!("duplicate declaration of name {}", name.raw()),
        Some(span),
    )
    .with_cause(Diagnostic::new(
        ErrorCode::ScopeDuplicate,
        "previously declared here",
        Some(prior),
    ))
}

#[allow(clippy::too_many_arguments)]
fn resolve_include(
    name: mcl_ir::Name,
    args: &[Expr],
    include_id: NodeId,
    include_span: Span,
    scope: &Scope,
    id_gen: &NodeIdGen,
    lineage: &mut CopyLineage,
) -> Result<Vec<Stmt>> {
    let Some(class) = scope.lookup_class(name) else {
        return Err(Diagnostic::new(
            ErrorCode::ScopeMissing,
            format!("no class named {} is in scope", name.raw()),
            Some(include_span),
        ));
    };
    if class.params.len() != args.len() {
        return Err(Diagnostic::new(
            ErrorCode::ScopeMissing,
            format!(
                "class {} expects {} argument(s), {} given",
                name.raw(),
                class.params.len(),
                args.len()
            ),
            Some(include_span),
        ));
    }

    let include_root = lineage.root(include_id);
    if scope.chain().iter().any(|prior| lineage.root(*prior) == include_root) {
        return Err(Diagnostic::new(
            ErrorCode::RecursiveClass,
            format!("recursive include of class {}", name.raw()),
            Some(include_span),
        ));
    }

    let params = class.params.clone();
    let class_body = class.body.clone();
    let copied_body = copy_stmts(&class_body, id_gen, lineage, include_id);

    let mut child = scope.clone();
    for (param, arg) in params.iter().zip(args) {
        child.bind_variable(param.name, arg.clone());
    }
    child.push_chain(include_id);
    child.declare_class(
        name,
        ClassDef {
            params,
            body: copied_body.clone(),
        },
    );

    let result = set_scope_inner(&copied_body, &child, id_gen, lineage)?;
    Ok(result.body)
}

// --- Deep copy: assigns fresh `NodeId`s to every copied node and records
// each one's lineage back to `origin` (the `include` site driving the
// copy), so a later `include` of the same class can detect recursion even
// though the copy's own ids are brand new.

fn copy_stmts(stmts: &[Stmt], id_gen: &NodeIdGen, lineage: &mut CopyLineage, origin: NodeId) -> Vec<Stmt> {
    stmts.iter().map(|stmt| copy_stmt(stmt, id_gen, lineage, origin)).collect()
}

fn copy_stmt(stmt: &Stmt, id_gen: &NodeIdGen, lineage: &mut CopyLineage, origin: NodeId) -> Stmt {
    let new_id = id_gen.next_id();
    lineage.record(new_id, origin);
    let kind = match &stmt.kind {
        StmtKind::Bind { name, value } => StmtKind::Bind {
            name: *name,
            value: copy_expr(value, id_gen, lineage, origin),
        },
        StmtKind::Res { collect, kind, name, entries } => StmtKind::Res {
            collect: *collect,
            kind: copy_expr(kind, id_gen, lineage, origin),
            name: copy_expr(name, id_gen, lineage, origin),
            entries: entries.iter().map(|e| copy_res_entry(e, id_gen, lineage, origin)).collect(),
        },
        StmtKind::Edge { chain } => StmtKind::Edge {
            chain: chain.iter().map(|half| copy_edge_half(half, id_gen, lineage, origin)).collect(),
        },
        StmtKind::If { cond, then_branch, else_branch } => StmtKind::If {
            cond: copy_expr(cond, id_gen, lineage, origin),
            then_branch: copy_stmts(then_branch, id_gen, lineage, origin),
            else_branch: copy_stmts(else_branch, id_gen, lineage, origin),
        },
        StmtKind::For { idx, val, container, body } => StmtKind::For {
            idx: *idx,
            val: *val,
            container: copy_expr(container, id_gen, lineage, origin),
            body: copy_stmts(body, id_gen, lineage, origin),
        },
        StmtKind::ForKv { key, val, container, body } => StmtKind::ForKv {
            key: *key,
            val: *val,
            container: copy_expr(container, id_gen, lineage, origin),
            body: copy_stmts(body, id_gen, lineage, origin),
        },
        StmtKind::FuncDecl { name, params, out, body } => StmtKind::FuncDecl {
            name: *name,
            params: params.clone(),
            out: out.clone(),
            body: copy_expr(body, id_gen, lineage, origin),
        },
        StmtKind::Class { name, params, body } => StmtKind::Class {
            name: *name,
            params: params.clone(),
            body: copy_stmts(body, id_gen, lineage, origin),
        },
        StmtKind::Include { name, args } => StmtKind::Include {
            name: *name,
            args: args.iter().map(|a| copy_expr(a, id_gen, lineage, origin)).collect(),
        },
        StmtKind::Import { raw } => StmtKind::Import { raw: raw.clone() },
        StmtKind::Comment(text) => StmtKind::Comment(text.clone()),
        StmtKind::Panic { cond } => StmtKind::Panic {
            cond: copy_expr(cond, id_gen, lineage, origin),
        },
    };
    Stmt {
        id: new_id,
        span: stmt.span,
        kind,
    }
}

fn copy_res_entry(entry: &ResEntry, id_gen: &NodeIdGen, lineage: &mut CopyLineage, origin: NodeId) -> ResEntry {
    match entry {
        ResEntry::Field { name, cond, value, span } => ResEntry::Field {
            name: *name,
            cond: cond.as_ref().map(|c| copy_expr(c, id_gen, lineage, origin)),
            value: copy_expr(value, id_gen, lineage, origin),
            span: *span,
        },
        ResEntry::EdgeMeta { meta, cond, half, span } => ResEntry::EdgeMeta {
            meta: *meta,
            cond: cond.as_ref().map(|c| copy_expr(c, id_gen, lineage, origin)),
            half: copy_edge_half(half, id_gen, lineage, origin),
            span: *span,
        },
        ResEntry::MetaProp { key, value, span } => ResEntry::MetaProp {
            key: *key,
            value: copy_expr(value, id_gen, lineage, origin),
            span: *span,
        },
        ResEntry::MetaStruct { cond, value, span } => ResEntry::MetaStruct {
            cond: cond.as_ref().map(|c| copy_expr(c, id_gen, lineage, origin)),
            value: copy_expr(value, id_gen, lineage, origin),
            span: *span,
        },
    }
}

fn copy_edge_half(half: &EdgeHalf, id_gen: &NodeIdGen, lineage: &mut CopyLineage, origin: NodeId) -> EdgeHalf {
    EdgeHalf {
        kind: copy_expr(&half.kind, id_gen, lineage, origin),
        name: copy_expr(&half.name, id_gen, lineage, origin),
        send: half.send,
        recv: half.recv,
        span: half.span,
    }
}

fn copy_expr(expr: &Expr, id_gen: &NodeIdGen, lineage: &mut CopyLineage, origin: NodeId) -> Expr {
    let new_id = id_gen.next_id();
    lineage.record(new_id, origin);
    let kind = match &expr.kind {
        ExprKind::Bool(b) => ExprKind::Bool(*b),
        ExprKind::Int(i) => ExprKind::Int(*i),
        ExprKind::Float(f) => ExprKind::Float(*f),
        ExprKind::Str(s) => ExprKind::Str(s.clone()),
        ExprKind::List(items) => {
            ExprKind::List(items.iter().map(|e| copy_expr(e, id_gen, lineage, origin)).collect())
        }
        ExprKind::Map(entries) => ExprKind::Map(
            entries
                .iter()
                .map(|e| MapEntry {
                    key: copy_expr(&e.key, id_gen, lineage, origin),
                    value: copy_expr(&e.value, id_gen, lineage, origin),
                })
                .collect(),
        ),
        ExprKind::Struct(fields) => ExprKind::Struct(
            fields
                .iter()
                .map(|f| StructField {
                    name: f.name,
                    value: copy_expr(&f.value, id_gen, lineage, origin),
                })
                .collect(),
        ),
        ExprKind::Var(name) => ExprKind::Var(*name),
        ExprKind::Call(call) => ExprKind::Call(CallExpr {
            name: call.name,
            args: call.args.iter().map(|a| copy_expr(a, id_gen, lineage, origin)).collect(),
        }),
        ExprKind::Func(func) => ExprKind::Func(FuncLit {
            params: clone_params(&func.params),
            out: func.out.clone(),
            body: Box::new(copy_expr(&func.body, id_gen, lineage, origin)),
        }),
        ExprKind::If(if_expr) => ExprKind::If(IfExpr {
            cond: Box::new(copy_expr(&if_expr.cond, id_gen, lineage, origin)),
            then_branch: Box::new(copy_expr(&if_expr.then_branch, id_gen, lineage, origin)),
            else_branch: Box::new(copy_expr(&if_expr.else_branch, id_gen, lineage, origin)),
        }),
    };
    Expr {
        id: new_id,
        span: expr.span,
        kind,
        type_ann: expr.type_ann.clone(),
    }
}

fn clone_params(params: &[Param]) -> Vec<Param> {
    params.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcl_ir::{Prog, StringInterner};

    fn parse(src: &str, id_gen: &NodeIdGen) -> (Prog, StringInterner) {
        let mut interner = StringInterner::new();
        let prog = mcl_parse::parse_with_id_gen(src, None, &mut interner, id_gen)
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        (prog, interner)
    }

    #[test]
    fn duplicate_bind_is_scope_duplicate() {
        let id_gen = NodeIdGen::new();
        let (prog, _) = parse("$x = 1\n$x = 2", &id_gen);
        let mut lineage = CopyLineage::new();
        let err = set_scope(&prog.body, &Scope::new(), &id_gen, &mut lineage).unwrap_err();
        assert_eq!(err.code, ErrorCode::ScopeDuplicate);
        assert_eq!(err.causes.len(), 1);
    }

    #[test]
    fn include_of_undeclared_class_is_scope_missing() {
        let id_gen = NodeIdGen::new();
        let (prog, _) = parse("include nope", &id_gen);
        let mut lineage = CopyLineage::new();
        let err = set_scope(&prog.body, &Scope::new(), &id_gen, &mut lineage).unwrap_err();
        assert_eq!(err.code, ErrorCode::ScopeMissing);
    }

    /// A class that includes itself is rejected with `RecursiveClass`
    /// rather than recursing forever.
    #[test]
    fn directly_recursive_class_is_rejected() {
        let id_gen = NodeIdGen::new();
        let (prog, _) = parse("class c1 { include c1 }\ninclude c1", &id_gen);
        let mut lineage = CopyLineage::new();
        let err = set_scope(&prog.body, &Scope::new(), &id_gen, &mut lineage).unwrap_err();
        assert_eq!(err.code, ErrorCode::RecursiveClass);
    }

    #[test]
    fn include_expands_class_body_with_fresh_ids() {
        let id_gen = NodeIdGen::new();
        let (prog, _) = parse("class c1 { $x = 1 }\ninclude c1", &id_gen);
        let mut lineage = CopyLineage::new();
        let result = set_scope(&prog.body, &Scope::new(), &id_gen, &mut lineage)
            .unwrap_or_else(|e| panic!("set_scope failed: {e}"));
        // class decl retained, include expanded in place
        assert_eq!(result.body.len(), 2);
        assert!(matches!(result.body[1].kind, StmtKind::Bind { .. }));
    }

    #[test]
    fn include_with_wrong_arity_is_scope_missing() {
        let id_gen = NodeIdGen::new();
        let (prog, _) = parse("class c1($a) { $x = $a }\ninclude c1", &id_gen);
        let mut lineage = CopyLineage::new();
        let err = set_scope(&prog.body, &Scope::new(), &id_gen, &mut lineage).unwrap_err();
        assert_eq!(err.code, ErrorCode::ScopeMissing);
    }
}
