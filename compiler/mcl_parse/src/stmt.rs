//! Statement parsing.

use crate::cursor::Cursor;
use crate::error;
use crate::expr::parse_expr;
use crate::res::{parse_edge_half, parse_res_entry};
use crate::ty;
use mcl_diagnostic::Result;
use mcl_ir::{CallExpr, Expr, ExprKind, Name, Param, ResEntry, Stmt, StmtKind, TokenKind};

pub fn parse_block(cursor: &mut Cursor<'_>) -> Result<Vec<Stmt>> {
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::unexpected(cursor, "`{`"));
    }
    let mut stmts = Vec::new();
    loop {
        if cursor.check(&TokenKind::RBrace) {
            break;
        }
        if cursor.at_eof() {
            return Err(error::unexpected(cursor, "`}`"));
        }
        stmts.push(parse_stmt(cursor)?);
    }
    cursor.bump(); // '}'
    Ok(stmts)
}

pub fn parse_stmt(cursor: &mut Cursor<'_>) -> Result<Stmt> {
    mcl_stack::ensure_sufficient_stack(|| parse_stmt_inner(cursor))
}

fn parse_stmt_inner(cursor: &mut Cursor<'_>) -> Result<Stmt> {
    let start = cursor.span();
    if let TokenKind::Comment(text) = cursor.peek().clone() {
        cursor.bump();
        return Ok(Stmt {
            id: cursor.next_id(),
            span: start,
            kind: StmtKind::Comment(text),
        });
    }
    cursor.skip_comments();
    let start = cursor.span();
    match cursor.peek().clone() {
        TokenKind::Var(name) => parse_bind(cursor, start, name),
        TokenKind::KwIf => parse_if(cursor, start),
        TokenKind::KwFor => parse_for(cursor, start),
        TokenKind::KwForKv => parse_forkv(cursor, start),
        TokenKind::KwFunc => parse_func_decl(cursor, start),
        TokenKind::KwClass => parse_class(cursor, start),
        TokenKind::KwInclude => parse_include(cursor, start),
        TokenKind::KwImport => parse_import(cursor, start),
        TokenKind::KwPanic => parse_panic(cursor, start),
        TokenKind::KwCollect => parse_collect(cursor, start),
        TokenKind::Ident(_) | TokenKind::CapIdent(_) => parse_res_or_edge(cursor, start),
        _ => Err(error::unexpected(cursor, "statement")),
    }
}

fn finish(cursor: &mut Cursor<'_>, start: mcl_ir::Span, kind: StmtKind) -> Stmt {
    Stmt {
        id: cursor.next_id(),
        span: start.to(cursor.prev_span()),
        kind,
    }
}

fn parse_bind(cursor: &mut Cursor<'_>, start: mcl_ir::Span, name: Name) -> Result<Stmt> {
    cursor.bump(); // $name
    if cursor.check(&TokenKind::EqEq) {
        return Err(error::additional_equals(cursor));
    }
    if !cursor.eat(&TokenKind::Eq) {
        return Err(error::unexpected(cursor, "`=`"));
    }
    let value = parse_expr(cursor)?;
    Ok(finish(cursor, start, StmtKind::Bind { name, value }))
}

fn parse_if(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'if'
    let cond = parse_expr(cursor)?;
    let then_branch = parse_block(cursor)?;
    let else_branch = if cursor.eat(&TokenKind::KwElse) {
        if cursor.check(&TokenKind::KwIf) {
            vec![parse_if(cursor, cursor.span())?]
        } else {
            parse_block(cursor)?
        }
    } else {
        Vec::new()
    };
    Ok(finish(
        cursor,
        start,
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        },
    ))
}

fn parse_for(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'for'
    let idx = expect_var(cursor)?;
    if !cursor.eat(&TokenKind::Comma) {
        return Err(error::unexpected(cursor, "`,`"));
    }
    let val = expect_var(cursor)?;
    if !cursor.eat(&TokenKind::KwIn) {
        return Err(error::unexpected(cursor, "`in`"));
    }
    let container = parse_expr(cursor)?;
    let body = parse_block(cursor)?;
    Ok(finish(
        cursor,
        start,
        StmtKind::For {
            idx,
            val,
            container,
            body,
        },
    ))
}

fn parse_forkv(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'forkv'
    let key = expect_var(cursor)?;
    if !cursor.eat(&TokenKind::Comma) {
        return Err(error::unexpected(cursor, "`,`"));
    }
    let val = expect_var(cursor)?;
    if !cursor.eat(&TokenKind::KwIn) {
        return Err(error::unexpected(cursor, "`in`"));
    }
    let container = parse_expr(cursor)?;
    let body = parse_block(cursor)?;
    Ok(finish(
        cursor,
        start,
        StmtKind::ForKv {
            key,
            val,
            container,
            body,
        },
    ))
}

fn expect_var(cursor: &mut Cursor<'_>) -> Result<Name> {
    cursor.skip_comments();
    match cursor.peek().clone() {
        TokenKind::Var(name) => {
            cursor.bump();
            Ok(name)
        }
        _ => Err(error::unexpected(cursor, "variable")),
    }
}

fn parse_params(cursor: &mut Cursor<'_>) -> Result<Vec<Param>> {
    if !cursor.eat(&TokenKind::LParen) {
        return Err(error::unexpected(cursor, "`(`"));
    }
    let mut params = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RParen) {
            break;
        }
        let span = cursor.span();
        let name = expect_var(cursor)?;
        cursor.skip_comments();
        let type_ann = if ty::starts_type(cursor.peek()) {
            Some(ty::parse_type_ast(cursor)?)
        } else {
            None
        };
        params.push(Param {
            name,
            type_ann,
            span,
        });
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RParen) {
        return Err(error::unexpected(cursor, "`)`"));
    }
    Ok(params)
}

fn parse_func_decl(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'func'
    let name = match cursor.peek().clone() {
        TokenKind::Ident(n) => {
            cursor.bump();
            n
        }
        _ => return Err(error::unexpected(cursor, "function name")),
    };
    let params = parse_params(cursor)?;
    cursor.skip_comments();
    let out = if ty::starts_type(cursor.peek()) {
        Some(ty::parse_type_ast(cursor)?)
    } else {
        None
    };
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::unexpected(cursor, "`{`"));
    }
    let body = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::unexpected(cursor, "`}`"));
    }
    Ok(finish(
        cursor,
        start,
        StmtKind::FuncDecl {
            name,
            params,
            out,
            body,
        },
    ))
}

fn parse_class(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'class'
    let name = match cursor.peek().clone() {
        TokenKind::Ident(n) => {
            cursor.bump();
            n
        }
        _ => return Err(error::unexpected(cursor, "class name")),
    };
    let params = if cursor.check(&TokenKind::LParen) {
        parse_params(cursor)?
    } else {
        Vec::new()
    };
    let body = parse_block(cursor)?;
    Ok(finish(
        cursor,
        start,
        StmtKind::Class { name, params, body },
    ))
}

fn parse_include(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'include'
    let name = match cursor.peek().clone() {
        TokenKind::Ident(n) => {
            cursor.bump();
            n
        }
        _ => return Err(error::unexpected(cursor, "class name")),
    };
    let args = if cursor.eat(&TokenKind::LParen) {
        let mut args = Vec::new();
        loop {
            cursor.skip_comments();
            if cursor.check(&TokenKind::RParen) {
                break;
            }
            args.push(parse_expr(cursor)?);
            if !cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        if !cursor.eat(&TokenKind::RParen) {
            return Err(error::unexpected(cursor, "`)`"));
        }
        args
    } else {
        Vec::new()
    };
    Ok(finish(cursor, start, StmtKind::Include { name, args }))
}

/// Import names are parsed here only as raw text (classification via
/// `parse_import_name` is a pure function of that text run later by
/// `mcl_scope::import`, not re-parsed token-by-token).
fn parse_import(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'import'
    let raw = match cursor.peek().clone() {
        TokenKind::Str(s) => {
            cursor.bump();
            s
        }
        _ => return Err(error::unexpected(cursor, "import path string")),
    };
    Ok(finish(cursor, start, StmtKind::Import { raw }))
}

fn parse_panic(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'panic'
    if !cursor.eat(&TokenKind::LParen) {
        return Err(error::unexpected(cursor, "`(`"));
    }
    let cond = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::RParen) {
        return Err(error::unexpected(cursor, "`)`"));
    }
    Ok(finish(cursor, start, StmtKind::Panic { cond }))
}

/// `collect K E { body }` lowers to a `Res` with `collect = true` and an
/// injected synthetic field `Call("_collect", kind_literal, E)`.
/// `K` is the resource kind to collect; `E` is the exported-resource
/// name/filter expression, reused verbatim both as the statement's own
/// `name` and as the second argument to the synthetic `_collect` call.
fn parse_collect(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    cursor.bump(); // 'collect'
    let kind_span = cursor.span();
    let kind_name = match cursor.peek().clone() {
        TokenKind::Ident(n) | TokenKind::CapIdent(n) => {
            cursor.bump();
            n
        }
        _ => return Err(error::unexpected(cursor, "resource kind")),
    };
    let kind_text = cursor.resolve(kind_name).to_string();
    let kind = str_lit(cursor, kind_span, &kind_text);
    let name = parse_expr(cursor)?;
    let mut entries = parse_res_body(cursor)?;

    let collect_name = cursor.intern("_collect");
    let collect_span = name.span;
    let collect_value = Expr {
        id: cursor.next_id(),
        span: collect_span,
        kind: ExprKind::Call(CallExpr {
            name: collect_name,
            args: vec![str_lit(cursor, kind_span, &kind_text), name.clone()],
        }),
        type_ann: None,
    };
    let synthetic_name = cursor.intern("_collect");
    entries.push(ResEntry::Field {
        name: synthetic_name,
        cond: None,
        value: collect_value,
        span: collect_span,
    });

    Ok(finish(
        cursor,
        start,
        StmtKind::Res {
            collect: true,
            kind,
            name,
            entries,
        },
    ))
}

fn str_lit(cursor: &mut Cursor<'_>, span: mcl_ir::Span, s: &str) -> Expr {
    Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Str(s.to_string()),
        type_ann: None,
    }
}

fn parse_res_body(cursor: &mut Cursor<'_>) -> Result<Vec<ResEntry>> {
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::unexpected(cursor, "`{`"));
    }
    let mut entries = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RBrace) {
            break;
        }
        entries.push(parse_res_entry(cursor)?);
    }
    cursor.bump(); // '}'
    Ok(entries)
}

/// Dispatches a statement starting with a kind-looking identifier: a
/// resource (`Kind "name" { .. }`) or an edge chain (`Kind["a"] -> ..`),
/// disambiguated purely by whether `[` immediately follows the kind
///. Both lower-case and capitalized identifiers are
/// accepted as a resource kind (scenario S2 writes `test`, S5 writes
/// `Test`; the grammar does not actually require capitalization, only the
/// convention does).
fn parse_res_or_edge(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    if cursor.peek_at(1) == &TokenKind::LBracket {
        return parse_edge_chain(cursor, start);
    }
    let kind_name = match cursor.peek().clone() {
        TokenKind::Ident(n) | TokenKind::CapIdent(n) => n,
        _ => return Err(error::unexpected(cursor, "resource kind")),
    };
    let kind_text = cursor.resolve(kind_name).to_string();
    cursor.bump();
    let kind = str_lit(cursor, start, &kind_text);
    let name = parse_expr(cursor)?;
    let entries = parse_res_body(cursor)?;
    Ok(finish(
        cursor,
        start,
        StmtKind::Res {
            collect: false,
            kind,
            name,
            entries,
        },
    ))
}

fn parse_edge_chain(cursor: &mut Cursor<'_>, start: mcl_ir::Span) -> Result<Stmt> {
    let mut chain = vec![parse_edge_half(cursor)?];
    while cursor.eat(&TokenKind::Arrow) {
        chain.push(parse_edge_half(cursor)?);
    }
    if chain.len() >= 2 {
        let any_send_recv = chain.iter().any(|h| h.send.is_some() || h.recv.is_some());
        if any_send_recv && chain.len() != 2 {
            return Err(error::unexpected(
                cursor,
                "a send/recv edge to have exactly two halves",
            ));
        }
        if any_send_recv {
            let (a, b) = (&chain[0], &chain[1]);
            if a.send.is_some() != b.recv.is_some() || a.recv.is_some() != b.send.is_some() {
                return Err(error::unexpected(
                    cursor,
                    "send/recv symmetric on both halves",
                ));
            }
        }
    }
    Ok(finish(cursor, start, StmtKind::Edge { chain }))
}
