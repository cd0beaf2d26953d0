//! Rewrites every `Str` literal containing `${...}` into a
//! `Call("_operator", "+", ..)` concatenation tree.
//!
//! Runs as a second pass over the parsed AST: the lexer decodes escapes but
//! leaves `${...}` untouched (see `mcl_ir::TokenKind::Str`), so this is the
//! only place that grammar is interpreted.

use crate::split::{split_interpolated, Segment};
use mcl_diagnostic::{Diagnostic, ErrorCode, Result};
use mcl_ir::{
    CallExpr, EdgeHalf, Expr, ExprKind, FuncLit, IfExpr, MapEntry, NodeIdGen, Prog, ResEntry,
    Span, Stmt, StmtKind, StringInterner, StructField,
};

/// Expands every interpolated string literal in `prog`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn interpolate_prog(prog: Prog, interner: &mut StringInterner, ids: &NodeIdGen) -> Result<Prog> {
    let body = interpolate_stmts(prog.body, interner, ids)?;
    tracing::debug!(stmt_count = body.len(), "interpolated program");
    Ok(Prog { body, ..prog })
}

fn interpolate_stmts(
    stmts: Vec<Stmt>,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<Vec<Stmt>> {
    stmts
        .into_iter()
        .map(|s| interpolate_stmt(s, interner, ids))
        .collect()
}

fn interpolate_stmt(stmt: Stmt, interner: &mut StringInterner, ids: &NodeIdGen) -> Result<Stmt> {
    let Stmt { id, span, kind } = stmt;
    let kind = match kind {
        StmtKind::Bind { name, value } => StmtKind::Bind {
            name,
            value: interpolate_expr(value, interner, ids)?,
        },
        StmtKind::Res {
            collect,
            kind,
            name,
            entries,
        } => StmtKind::Res {
            collect,
            kind: interpolate_expr(kind, interner, ids)?,
            name: interpolate_expr(name, interner, ids)?,
            entries: entries
                .into_iter()
                .map(|e| interpolate_res_entry(e, interner, ids))
                .collect::<Result<_>>()?,
        },
        StmtKind::Edge { chain } => StmtKind::Edge {
            chain: chain
                .into_iter()
                .map(|h| interpolate_edge_half(h, interner, ids))
                .collect::<Result<_>>()?,
        },
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => StmtKind::If {
            cond: interpolate_expr(cond, interner, ids)?,
            then_branch: interpolate_stmts(then_branch, interner, ids)?,
            else_branch: interpolate_stmts(else_branch, interner, ids)?,
        },
        StmtKind::For {
            idx,
            val,
            container,
            body,
        } => StmtKind::For {
            idx,
            val,
            container: interpolate_expr(container, interner, ids)?,
            body: interpolate_stmts(body, interner, ids)?,
        },
        StmtKind::ForKv {
            key,
            val,
            container,
            body,
        } => StmtKind::ForKv {
            key,
            val,
            container: interpolate_expr(container, interner, ids)?,
            body: interpolate_stmts(body, interner, ids)?,
        },
        StmtKind::FuncDecl {
            name,
            params,
            out,
            body,
        } => StmtKind::FuncDecl {
            name,
            params,
            out,
            body: interpolate_expr(body, interner, ids)?,
        },
        StmtKind::Class { name, params, body } => StmtKind::Class {
            name,
            params,
            body: interpolate_stmts(body, interner, ids)?,
        },
        StmtKind::Include { name, args } => StmtKind::Include {
            name,
            args: interpolate_exprs(args, interner, ids)?,
        },
        StmtKind::Panic { cond } => StmtKind::Panic {
            cond: interpolate_expr(cond, interner, ids)?,
        },
        StmtKind::Import { raw } => StmtKind::Import { raw },
        StmtKind::Comment(text) => StmtKind::Comment(text),
    };
    Ok(Stmt { id, span, kind })
}

fn interpolate_res_entry(
    entry: ResEntry,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<ResEntry> {
    Ok(match entry {
        ResEntry::Field {
            name,
            cond,
            value,
            span,
        } => ResEntry::Field {
            name,
            cond: interpolate_opt_expr(cond, interner, ids)?,
            value: interpolate_expr(value, interner, ids)?,
            span,
        },
        ResEntry::EdgeMeta {
            meta,
            cond,
            half,
            span,
        } => ResEntry::EdgeMeta {
            meta,
            cond: interpolate_opt_expr(cond, interner, ids)?,
            half: interpolate_edge_half(half, interner, ids)?,
            span,
        },
        ResEntry::MetaProp { key, value, span } => ResEntry::MetaProp {
            key,
            value: interpolate_expr(value, interner, ids)?,
            span,
        },
        ResEntry::MetaStruct { cond, value, span } => ResEntry::MetaStruct {
            cond: interpolate_opt_expr(cond, interner, ids)?,
            value: interpolate_expr(value, interner, ids)?,
            span,
        },
    })
}

fn interpolate_edge_half(
    half: EdgeHalf,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<EdgeHalf> {
    Ok(EdgeHalf {
        kind: interpolate_expr(half.kind, interner, ids)?,
        name: interpolate_expr(half.name, interner, ids)?,
        send: half.send,
        recv: half.recv,
        span: half.span,
    })
}

fn interpolate_opt_expr(
    expr: Option<Expr>,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<Option<Expr>> {
    expr.map(|e| interpolate_expr(e, interner, ids)).transpose()
}

fn interpolate_exprs(
    exprs: Vec<Expr>,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<Vec<Expr>> {
    exprs
        .into_iter()
        .map(|e| interpolate_expr(e, interner, ids))
        .collect()
}

fn interpolate_expr(expr: Expr, interner: &mut StringInterner, ids: &NodeIdGen) -> Result<Expr> {
    mcl_stack::ensure_sufficient_stack(|| interpolate_expr_inner(expr, interner, ids))
}

fn interpolate_expr_inner(
    expr: Expr,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<Expr> {
    if let ExprKind::Str(text) = &expr.kind {
        if text.contains("${") {
            return expand_str(expr.span, text, interner, ids);
        }
    }

    let Expr {
        id,
        span,
        kind,
        type_ann,
    } = expr;
    let kind = match kind {
        ExprKind::Bool(b) => ExprKind::Bool(b),
        ExprKind::Int(n) => ExprKind::Int(n),
        ExprKind::Float(f) => ExprKind::Float(f),
        ExprKind::Str(s) => ExprKind::Str(s),
        ExprKind::Var(name) => ExprKind::Var(name),
        ExprKind::List(items) => ExprKind::List(interpolate_exprs(items, interner, ids)?),
        ExprKind::Map(entries) => ExprKind::Map(
            entries
                .into_iter()
                .map(|MapEntry { key, value }| {
                    Ok(MapEntry {
                        key: interpolate_expr(key, interner, ids)?,
                        value: interpolate_expr(value, interner, ids)?,
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExprKind::Struct(fields) => ExprKind::Struct(
            fields
                .into_iter()
                .map(|StructField { name, value }| {
                    Ok(StructField {
                        name,
                        value: interpolate_expr(value, interner, ids)?,
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExprKind::Call(CallExpr { name, args }) => ExprKind::Call(CallExpr {
            name,
            args: interpolate_exprs(args, interner, ids)?,
        }),
        ExprKind::Func(FuncLit { params, out, body }) => ExprKind::Func(FuncLit {
            params,
            out,
            body: Box::new(interpolate_expr(*body, interner, ids)?),
        }),
        ExprKind::If(IfExpr {
            cond,
            then_branch,
            else_branch,
        }) => ExprKind::If(IfExpr {
            cond: Box::new(interpolate_expr(*cond, interner, ids)?),
            then_branch: Box::new(interpolate_expr(*then_branch, interner, ids)?),
            else_branch: Box::new(interpolate_expr(*else_branch, interner, ids)?),
        }),
    };
    Ok(Expr {
        id,
        span,
        kind,
        type_ann,
    })
}

/// Expands one interpolated string body into a literal, a single embedded
/// expression, or a left-associative `+` concatenation tree of both. Every
/// generated node takes `span`, the containing string's position, so
/// every node produced by interpolation inherits the source position of
/// the containing string.
fn expand_str(
    span: Span,
    text: &str,
    interner: &mut StringInterner,
    ids: &NodeIdGen,
) -> Result<Expr> {
    let segments = split_interpolated(text).map_err(|_offset| {
        Diagnostic::new(
            ErrorCode::InterpUnclosedExpr,
            "unterminated `${` in interpolated string",
            Some(span),
        )
    })?;

    let mut pieces = Vec::with_capacity(segments.len());
    for segment in segments {
        let piece = match segment {
            Segment::Literal(text) => str_lit(ids, span, text),
            Segment::Expr(src) => {
                let parsed = mcl_parse::parse_expr_str(&src, interner, ids).map_err(|cause| {
                    Diagnostic::new(
                        ErrorCode::InterpInvalidExpr,
                        format!("invalid interpolated expression `${{{src}}}`"),
                        Some(span),
                    )
                    .with_cause(cause)
                })?;
                let expanded = interpolate_expr(parsed, interner, ids)?;
                respan(expanded, span)
            }
        };
        pieces.push(piece);
    }

    let mut iter = pieces.into_iter();
    let mut result = iter
        .next()
        .unwrap_or_else(|| str_lit(ids, span, String::new()));
    for piece in iter {
        result = concat(ids, interner, span, result, piece);
    }
    Ok(result)
}

fn str_lit(ids: &NodeIdGen, span: Span, text: String) -> Expr {
    Expr {
        id: ids.next_id(),
        span,
        kind: ExprKind::Str(text),
        type_ann: None,
    }
}

fn concat(ids: &NodeIdGen, interner: &mut StringInterner, span: Span, left: Expr, right: Expr) -> Expr {
    let name = interner.intern("_operator");
    Expr {
        id: ids.next_id(),
        span,
        kind: ExprKind::Call(CallExpr {
            name,
            args: vec![str_lit(ids, span, "+".to_string()), left, right],
        }),
        type_ann: None,
    }
}

/// Overrides every node's span in `expr`, recursively, to `span`.
fn respan(expr: Expr, span: Span) -> Expr {
    let kind = match expr.kind {
        ExprKind::Bool(b) => ExprKind::Bool(b),
        ExprKind::Int(n) => ExprKind::Int(n),
        ExprKind::Float(f) => ExprKind::Float(f),
        ExprKind::Str(s) => ExprKind::Str(s),
        ExprKind::Var(name) => ExprKind::Var(name),
        ExprKind::List(items) => ExprKind::List(items.into_iter().map(|e| respan(e, span)).collect()),
        ExprKind::Map(entries) => ExprKind::Map(
            entries
                .into_iter()
                .map(|MapEntry { key, value }| MapEntry {
                    key: respan(key, span),
                    value: respan(value, span),
                })
                .collect(),
        ),
        ExprKind::Struct(fields) => ExprKind::Struct(
            fields
                .into_iter()
                .map(|StructField { name, value }| StructField {
                    name,
                    value: respan(value, span),
                })
                .collect(),
        ),
        ExprKind::Call(CallExpr { name, args }) => ExprKind::Call(CallExpr {
            name,
            args: args.into_iter().map(|e| respan(e, span)).collect(),
        }),
        ExprKind::Func(FuncLit { params, out, body }) => ExprKind::Func(FuncLit {
            params,
            out,
            body: Box::new(respan(*body, span)),
        }),
        ExprKind::If(IfExpr {
            cond,
            then_branch,
            else_branch,
        }) => ExprKind::If(IfExpr {
            cond: Box::new(respan(*cond, span)),
            then_branch: Box::new(respan(*then_branch, span)),
            else_branch: Box::new(respan(*else_branch, span)),
        }),
    };
    Expr {
        id: expr.id,
        span,
        kind,
        type_ann: expr.type_ann,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use mcl_ir::Pos;

    fn dummy_span() -> Span {
        Span::point(Pos::START)
    }

    fn lit(s: &str) -> Expr {
        Expr {
            id: mcl_ir::NodeId::DUMMY,
            span: dummy_span(),
            kind: ExprKind::Str(s.to_string()),
            type_ann: None,
        }
    }

    #[test]
    fn plain_string_is_left_untouched() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let result = interpolate_expr(lit("no interpolation here"), &mut interner, &ids).unwrap();
        match result.kind {
            ExprKind::Str(s) => assert_eq!(s, "no interpolation here"),
            _ => panic!("expected Str"),
        }
    }

    #[test]
    fn single_embedded_var_is_not_wrapped_in_concat() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let result = interpolate_expr(lit("${foo}"), &mut interner, &ids).unwrap();
        match result.kind {
            ExprKind::Var(_) => {}
            other => panic!("expected a bare Var, got {other:?}"),
        }
    }

    #[test]
    fn mixed_literal_and_expr_builds_concat_call() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let result = interpolate_expr(lit("hi ${name}!"), &mut interner, &ids).unwrap();
        match result.kind {
            ExprKind::Call(CallExpr { name, args }) => {
                assert_eq!(interner.resolve(name), "_operator");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected a Call tree, got {other:?}"),
        }
    }

    #[test]
    fn generated_nodes_inherit_the_containing_strings_span() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let span = Span::new(Pos::new(5, 2, None), Pos::new(5, 20, None));
        let expr = Expr {
            id: ids.next_id(),
            span,
            kind: ExprKind::Str("hi ${name}!".to_string()),
            type_ann: None,
        };
        let result = interpolate_expr(expr, &mut interner, &ids).unwrap();
        assert_eq!(result.span, span);
        if let ExprKind::Call(CallExpr { args, .. }) = &result.kind {
            for arg in args {
                assert_eq!(arg.span, span);
            }
        } else {
            panic!("expected a Call tree");
        }
    }

    #[test]
    fn unterminated_interpolation_is_reported() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let err = interpolate_expr(lit("hi ${name"), &mut interner, &ids).unwrap_err();
        assert_eq!(err.code, ErrorCode::InterpUnclosedExpr);
    }

    #[test]
    fn invalid_embedded_expression_is_reported() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let err = interpolate_expr(lit("${)(}"), &mut interner, &ids).unwrap_err();
        assert_eq!(err.code, ErrorCode::InterpInvalidExpr);
        assert_eq!(err.causes.len(), 1);
    }

    #[test]
    fn dotted_path_parses_as_a_single_variable() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let result = interpolate_expr(lit("${pkg.foo}"), &mut interner, &ids).unwrap();
        match result.kind {
            ExprKind::Var(name) => assert_eq!(interner.resolve(name), "pkg.foo"),
            other => panic!("expected a dotted Var, got {other:?}"),
        }
    }

    #[test]
    fn interpolation_nested_inside_a_list_literal_is_expanded() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let expr = Expr {
            id: ids.next_id(),
            span: dummy_span(),
            kind: ExprKind::List(vec![lit("${x}"), lit("plain")]),
            type_ann: None,
        };
        let result = interpolate_expr(expr, &mut interner, &ids).unwrap();
        if let ExprKind::List(items) = result.kind {
            assert!(matches!(items[0].kind, ExprKind::Var(_)));
            assert!(matches!(items[1].kind, ExprKind::Str(_)));
        } else {
            panic!("expected a List");
        }
    }

    #[test]
    fn full_pipeline_rewrites_a_bind_statements_string() {
        let mut interner = StringInterner::new();
        let ids = NodeIdGen::new();
        let prog = mcl_parse::parse_with_id_gen(
            "$name = \"world\"\n$greeting = \"hello ${name}\"\n",
            None,
            &mut interner,
            &ids,
        )
        .unwrap();
        let prog = interpolate_prog(prog, &mut interner, &ids).unwrap();
        let StmtKind::Bind { value, .. } = &prog.body[1].kind else {
            panic!("expected the second statement to be a Bind");
        };
        match &value.kind {
            ExprKind::Call(CallExpr { name, args }) => {
                assert_eq!(interner.resolve(*name), "_operator");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected a concat Call tree, got {other:?}"),
        }
    }
}
