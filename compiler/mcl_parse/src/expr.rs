//! Expression parsing and the operator/indexing/arrow/`in` lowerings.

use crate::cursor::Cursor;
use crate::error;
use crate::ty;
use mcl_diagnostic::Result;
use mcl_ir::{CallExpr, Expr, ExprKind, FuncLit, IfExpr, MapEntry, Param, Span, StructField, TokenKind};

pub fn parse_expr(cursor: &mut Cursor<'_>) -> Result<Expr> {
    mcl_stack::ensure_sufficient_stack(|| parse_or_and(cursor))
}

fn call(cursor: &mut Cursor<'_>, span: Span, op: &str, mut args: Vec<Expr>) -> Expr {
    let name = cursor.intern("_operator");
    let mut call_args = vec![str_lit(cursor, span, op)];
    call_args.append(&mut args);
    Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Call(CallExpr {
            name,
            args: call_args,
        }),
        type_ann: None,
    }
}

fn str_lit(cursor: &mut Cursor<'_>, span: Span, s: &str) -> Expr {
    Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Str(s.to_string()),
        type_ann: None,
    }
}

fn named_call(cursor: &mut Cursor<'_>, span: Span, name: &str, args: Vec<Expr>) -> Expr {
    let name = cursor.intern(name);
    Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Call(CallExpr { name, args }),
        type_ann: None,
    }
}

fn parse_or_and(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let mut lhs = parse_comparison(cursor)?;
    loop {
        cursor.skip_comments();
        let op = match cursor.peek() {
            TokenKind::Pipe2 => "||",
            TokenKind::Amp2 => "&&",
            _ => break,
        };
        cursor.bump();
        let rhs = parse_comparison(cursor)?;
        let span = lhs.span.to(rhs.span);
        lhs = call(cursor, span, op, vec![lhs, rhs]);
    }
    Ok(lhs)
}

fn parse_comparison(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let lhs = parse_additive(cursor)?;
    cursor.skip_comments();
    let op = match cursor.peek() {
        TokenKind::EqEq => "==",
        TokenKind::NotEq => "!=",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::LtEq => "<=",
        TokenKind::GtEq => ">=",
        _ => return Ok(lhs),
    };
    cursor.bump();
    let rhs = parse_additive(cursor)?;
    let span = lhs.span.to(rhs.span);
    Ok(call(cursor, span, op, vec![lhs, rhs]))
}

fn parse_additive(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let mut lhs = parse_multiplicative(cursor)?;
    loop {
        cursor.skip_comments();
        let op = match cursor.peek() {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            _ => break,
        };
        cursor.bump();
        let rhs = parse_multiplicative(cursor)?;
        let span = lhs.span.to(rhs.span);
        lhs = call(cursor, span, op, vec![lhs, rhs]);
    }
    Ok(lhs)
}

fn parse_multiplicative(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let mut lhs = parse_unary(cursor)?;
    loop {
        cursor.skip_comments();
        let op = match cursor.peek() {
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            _ => break,
        };
        cursor.bump();
        let rhs = parse_unary(cursor)?;
        let span = lhs.span.to(rhs.span);
        lhs = call(cursor, span, op, vec![lhs, rhs]);
    }
    Ok(lhs)
}

/// Unary `!` and `-`. A `-` immediately followed by an integer/float
/// literal folds directly into a negative literal (`-42` parses as
/// `Int(-42)`, not a `Call("_operator", "-", ..)`) rather than going
/// through the general operator lowering.
fn parse_unary(cursor: &mut Cursor<'_>) -> Result<Expr> {
    cursor.skip_comments();
    let start = cursor.span();
    if cursor.check(&TokenKind::Bang) {
        cursor.bump();
        let operand = parse_unary(cursor)?;
        let span = start.to(operand.span);
        return Ok(call(cursor, span, "!", vec![operand]));
    }
    if cursor.check(&TokenKind::Minus) {
        cursor.skip_comments();
        if let TokenKind::Int(_) | TokenKind::Float(_) = cursor.peek_at(1).clone() {
            cursor.bump(); // '-'
            let lit_span = cursor.span();
            let folded = match cursor.bump().kind {
                TokenKind::Int(i) => ExprKind::Int(-i),
                TokenKind::Float(f) => ExprKind::Float(-f),
                _ => unreachable!("peeked Int/Float above"),
            };
            let span = start.to(lit_span);
            return Ok(Expr {
                id: cursor.next_id(),
                span,
                kind: folded,
                type_ann: None,
            });
        }
        cursor.bump();
        let operand = parse_unary(cursor)?;
        let span = start.to(operand.span);
        return Ok(call(cursor, span, "-", vec![operand]));
    }
    parse_in(cursor)
}

/// `a in b`. Bound between unary and postfix: looser than
/// `a[b]`/`a->f`, tighter than `*`/`+`. `spec.md` §4.2 lists `in` as the
/// tightest-binding operator, nested between indexing/arrow and parens,
/// but taken literally that ordering would make `in`'s own operands
/// parse only as parenthesized expressions (indexing and arrow sit
/// *inside* it, not around it) — unworkable, since `a[b] in c` and
/// `a in b->f` both need to parse without parens. Placing `in` one level
/// looser than postfix, so it takes already-indexed/arrowed operands on
/// both sides, is the reading that actually parses those forms.
fn parse_in(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let lhs = parse_postfix(cursor)?;
    cursor.skip_comments();
    if cursor.check(&TokenKind::KwIn) {
        cursor.bump();
        let rhs = parse_postfix(cursor)?;
        let span = lhs.span.to(rhs.span);
        return Ok(named_call(cursor, span, "_contains", vec![lhs, rhs]));
    }
    Ok(lhs)
}

fn parse_postfix(cursor: &mut Cursor<'_>) -> Result<Expr> {
    let mut base = parse_primary(cursor)?;
    loop {
        cursor.skip_comments();
        match cursor.peek() {
            TokenKind::LBracket => {
                cursor.bump();
                let index = parse_expr(cursor)?;
                if !cursor.eat(&TokenKind::RBracket) {
                    return Err(error::unexpected(cursor, "`]`"));
                }
                let span = base.span.to(cursor.prev_span());
                if cursor.check(&TokenKind::Pipe2) {
                    cursor.bump();
                    let default = parse_comparison(cursor)?;
                    let span = span.to(default.span);
                    base = named_call(
                        cursor,
                        span,
                        "_lookup_default",
                        vec![base, index, default],
                    );
                } else {
                    base = named_call(cursor, span, "_lookup", vec![base, index]);
                }
            }
            TokenKind::Arrow => {
                cursor.bump();
                let field_span = cursor.span();
                let field = match cursor.peek().clone() {
                    TokenKind::Ident(name) => {
                        cursor.bump();
                        cursor.resolve(name).to_string()
                    }
                    _ => return Err(error::unexpected(cursor, "field name")),
                };
                let field_expr = str_lit(cursor, field_span, &field);
                let span = base.span.to(field_span);
                if cursor.check(&TokenKind::Pipe2) {
                    cursor.bump();
                    let default = parse_comparison(cursor)?;
                    let span = span.to(default.span);
                    base = named_call(
                        cursor,
                        span,
                        "_struct_lookup_default",
                        vec![base, field_expr, default],
                    );
                } else {
                    base = named_call(cursor, span, "_struct_lookup", vec![base, field_expr]);
                }
            }
            _ => break,
        }
    }
    Ok(base)
}

fn parse_primary(cursor: &mut Cursor<'_>) -> Result<Expr> {
    cursor.skip_comments();
    let start = cursor.span();
    match cursor.peek().clone() {
        TokenKind::KwTrue => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Bool(true),
                type_ann: None,
            })
        }
        TokenKind::KwFalse => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Bool(false),
                type_ann: None,
            })
        }
        TokenKind::Int(i) => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Int(i),
                type_ann: None,
            })
        }
        TokenKind::Float(f) => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Float(f),
                type_ann: None,
            })
        }
        TokenKind::Str(s) => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Str(s),
                type_ann: None,
            })
        }
        TokenKind::Var(name) => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Var(name),
                type_ann: None,
            })
        }
        TokenKind::LParen => {
            cursor.bump();
            let inner = parse_expr(cursor)?;
            if !cursor.eat(&TokenKind::RParen) {
                return Err(error::unexpected(cursor, "`)`"));
            }
            Ok(inner)
        }
        TokenKind::LBracket => parse_list(cursor, start),
        TokenKind::Ident(name) if cursor.resolve(name) == "map" && is_map_literal(cursor) => {
            parse_map(cursor, start)
        }
        TokenKind::Ident(name) if cursor.resolve(name) == "struct" && is_struct_literal(cursor) => {
            parse_struct(cursor, start)
        }
        TokenKind::Ident(name) if cursor.peek_at(1) == &TokenKind::LParen => {
            parse_call(cursor, start, name)
        }
        TokenKind::Ident(name) => {
            cursor.bump();
            Ok(Expr {
                id: cursor.next_id(),
                span: start,
                kind: ExprKind::Var(name),
                type_ann: None,
            })
        }
        TokenKind::KwFunc => parse_lambda(cursor, start),
        TokenKind::KwIf => parse_if_expr(cursor, start),
        TokenKind::KwPanic if cursor.peek_at(1) == &TokenKind::LParen => {
            // `panic(e)` as an expression position is never produced by the
            // statement-level sugar; only reachable if a caller embeds it
            // inside a larger expression, which the grammar does not do.
            Err(error::unexpected(cursor, "expression"))
        }
        _ => Err(error::unexpected(cursor, "expression")),
    }
}

fn is_map_literal(cursor: &Cursor<'_>) -> bool {
    cursor.peek_at(1) == &TokenKind::LBrace
}

fn is_struct_literal(cursor: &Cursor<'_>) -> bool {
    cursor.peek_at(1) == &TokenKind::LBrace
}

fn parse_list(cursor: &mut Cursor<'_>, start: Span) -> Result<Expr> {
    cursor.bump(); // '['
    let mut items = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RBracket) {
            break;
        }
        items.push(parse_expr(cursor)?);
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RBracket) {
        return Err(error::unexpected(cursor, "`]`"));
    }
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::List(items),
        type_ann: None,
    })
}

fn parse_map(cursor: &mut Cursor<'_>, start: Span) -> Result<Expr> {
    cursor.bump(); // 'map'
    cursor.bump(); // '{'
    let mut entries = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RBrace) {
            break;
        }
        let key = parse_expr(cursor)?;
        if !cursor.eat(&TokenKind::FatArrow) {
            return Err(error::unexpected(cursor, "`=>`"));
        }
        let value = parse_expr(cursor)?;
        entries.push(MapEntry { key, value });
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::unexpected(cursor, "`}`"));
    }
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Map(entries),
        type_ann: None,
    })
}

fn parse_struct(cursor: &mut Cursor<'_>, start: Span) -> Result<Expr> {
    cursor.bump(); // 'struct'
    cursor.bump(); // '{'
    let mut fields = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RBrace) {
            break;
        }
        let name = match cursor.peek().clone() {
            TokenKind::Ident(name) => {
                cursor.bump();
                name
            }
            _ => return Err(error::unexpected(cursor, "field name")),
        };
        if !cursor.eat(&TokenKind::FatArrow) {
            return Err(error::unexpected(cursor, "`=>`"));
        }
        let value = parse_expr(cursor)?;
        fields.push(StructField { name, value });
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::unexpected(cursor, "`}`"));
    }
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Struct(fields),
        type_ann: None,
    })
}

fn parse_call(cursor: &mut Cursor<'_>, start: Span, name: mcl_ir::Name) -> Result<Expr> {
    cursor.bump(); // ident
    cursor.bump(); // '('
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
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Call(CallExpr { name, args }),
        type_ann: None,
    })
}

fn parse_lambda(cursor: &mut Cursor<'_>, start: Span) -> Result<Expr> {
    cursor.bump(); // 'func'
    if !cursor.eat(&TokenKind::LParen) {
        return Err(error::unexpected(cursor, "`(`"));
    }
    let mut params = Vec::new();
    loop {
        cursor.skip_comments();
        if cursor.check(&TokenKind::RParen) {
            break;
        }
        let param_span = cursor.span();
        let name = match cursor.peek().clone() {
            TokenKind::Var(name) => {
                cursor.bump();
                name
            }
            TokenKind::Ident(name) => {
                cursor.bump();
                name
            }
            _ => return Err(error::unexpected(cursor, "parameter name")),
        };
        cursor.skip_comments();
        let type_ann = if ty::starts_type(cursor.peek()) {
            Some(ty::parse_type_ast(cursor)?)
        } else {
            None
        };
        params.push(Param {
            name,
            type_ann,
            span: param_span,
        });
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RParen) {
        return Err(error::unexpected(cursor, "`)`"));
    }
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
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Func(FuncLit {
            params,
            out,
            body: Box::new(body),
        }),
        type_ann: None,
    })
}

fn parse_if_expr(cursor: &mut Cursor<'_>, start: Span) -> Result<Expr> {
    cursor.bump(); // 'if'
    let cond = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::unexpected(cursor, "`{`"));
    }
    let then_branch = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::unexpected(cursor, "`}`"));
    }
    if !cursor.eat(&TokenKind::KwElse) {
        return Err(error::unexpected(cursor, "`else`"));
    }
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::unexpected(cursor, "`{`"));
    }
    let else_branch = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::unexpected(cursor, "`}`"));
    }
    let span = start.to(cursor.prev_span());
    Ok(Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::If(IfExpr {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }),
        type_ann: None,
    })
}
