//! Resource body entries and edge chains.

use crate::cursor::Cursor;
use crate::error;
use crate::expr::parse_expr;
use mcl_diagnostic::Result;
use mcl_ir::{EdgeHalf, EdgeMetaKind, Expr, ExprKind, Name, ResEntry, TokenKind};

/// Parses `Kind["name"]`, optionally followed by `.send`/`.recv`.
pub fn parse_edge_half(cursor: &mut Cursor<'_>) -> Result<EdgeHalf> {
    cursor.skip_comments();
    let start = cursor.span();
    let kind_name = match cursor.peek().clone() {
        TokenKind::Ident(n) | TokenKind::CapIdent(n) => {
            cursor.bump();
            n
        }
        _ => return Err(error::unexpected(cursor, "resource kind")),
    };
    let kind = str_expr(cursor, start, kind_name);
    if !cursor.eat(&TokenKind::LBracket) {
        return Err(error::unexpected(cursor, "`[`"));
    }
    let name = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::RBracket) {
        return Err(error::unexpected(cursor, "`]`"));
    }
    let (send, recv) = parse_send_recv_suffix(cursor)?;
    let span = start.to(cursor.prev_span());
    Ok(EdgeHalf {
        kind,
        name,
        send,
        recv,
        span,
    })
}

fn parse_send_recv_suffix(cursor: &mut Cursor<'_>) -> Result<(Option<Name>, Option<Name>)> {
    cursor.skip_comments();
    // `.send` / `.recv` lexes as part of a dotted identifier only when
    // immediately preceded by another identifier; after `]` there is none,
    // so it surfaces as a bare `.` (Error token) followed by an Ident. We
    // instead require the source to write `half.send`/`half.recv` with no
    // space so the lexer never sees a leading dot in isolation: accept it
    // here as an `Ident` beginning with `.`-stripped text is not produced,
    // so detect the two-token `Error, Ident` shape directly.
    if cursor.check(&TokenKind::Error) {
        cursor.bump();
        let name = match cursor.peek().clone() {
            TokenKind::Ident(n) => {
                cursor.bump();
                n
            }
            _ => return Err(error::unexpected(cursor, "`send` or `recv`")),
        };
        let text = cursor.resolve(name).to_string();
        return match text.as_str() {
            "send" => Ok((Some(name), None)),
            "recv" => Ok((None, Some(name))),
            _ => Err(error::unexpected(cursor, "`send` or `recv`")),
        };
    }
    Ok((None, None))
}

fn str_expr(cursor: &mut Cursor<'_>, span: mcl_ir::Span, name: Name) -> Expr {
    let text = cursor.resolve(name).to_string();
    Expr {
        id: cursor.next_id(),
        span,
        kind: ExprKind::Str(text),
        type_ann: None,
    }
}

/// One entry inside a resource body: `name => expr,`, the conditional
/// `name => cond ?: expr,`, an edge-meta entry, `Meta:key => expr,`, or
/// `Meta => struct{..},`. The leading `Meta` identifier compares
/// case-insensitively.
pub fn parse_res_entry(cursor: &mut Cursor<'_>) -> Result<ResEntry> {
    cursor.skip_comments();
    let start = cursor.span();
    let name = match cursor.peek().clone() {
        TokenKind::Ident(n) => n,
        _ => return Err(error::res_field_invalid(cursor)),
    };
    let text = cursor.resolve(name).to_string();

    if text.eq_ignore_ascii_case("meta") {
        cursor.bump();
        if cursor.check(&TokenKind::Colon) {
            cursor.bump();
            let key = match cursor.peek().clone() {
                TokenKind::Ident(k) => {
                    cursor.bump();
                    k
                }
                _ => return Err(error::res_field_invalid(cursor)),
            };
            if !cursor.eat(&TokenKind::FatArrow) {
                return Err(error::unexpected(cursor, "`=>`"));
            }
            let value = parse_expr(cursor)?;
            expect_comma(cursor)?;
            let span = start.to(cursor.prev_span());
            return Ok(ResEntry::MetaProp {
                key,
                value,
                span,
            });
        }
        if !cursor.eat(&TokenKind::FatArrow) {
            return Err(error::unexpected(cursor, "`=>`"));
        }
        let (cond, value) = parse_value_or_conditional(cursor)?;
        expect_comma(cursor)?;
        let span = start.to(cursor.prev_span());
        return Ok(ResEntry::MetaStruct { cond, value, span });
    }

    if let Some(meta) = edge_meta_kind(&text) {
        cursor.bump();
        if !cursor.eat(&TokenKind::FatArrow) {
            return Err(error::unexpected(cursor, "`=>`"));
        }
        let (cond, half) = parse_edge_half_or_conditional(cursor)?;
        expect_comma(cursor)?;
        let span = start.to(cursor.prev_span());
        return Ok(ResEntry::EdgeMeta {
            meta,
            cond,
            half,
            span,
        });
    }

    cursor.bump();
    if !cursor.eat(&TokenKind::FatArrow) {
        if cursor.check(&TokenKind::EqEq) {
            return Err(error::additional_equals(cursor));
        }
        return Err(error::unexpected(cursor, "`=>`"));
    }
    let (cond, value) = parse_value_or_conditional(cursor)?;
    expect_comma(cursor)?;
    let span = start.to(cursor.prev_span());
    Ok(ResEntry::Field {
        name,
        cond,
        value,
        span,
    })
}

fn edge_meta_kind(text: &str) -> Option<EdgeMetaKind> {
    match text {
        "Before" => Some(EdgeMetaKind::Before),
        "After" => Some(EdgeMetaKind::After),
        "Notify" => Some(EdgeMetaKind::Notify),
        "Listen" => Some(EdgeMetaKind::Listen),
        _ => None,
    }
}

/// Parses `expr` or `cond ?: expr`, disambiguated by whether a `?:` token
/// follows the first parsed expression.
fn parse_value_or_conditional(cursor: &mut Cursor<'_>) -> Result<(Option<Expr>, Expr)> {
    let first = parse_expr(cursor)?;
    cursor.skip_comments();
    if cursor.check(&TokenKind::QuestionColon) {
        cursor.bump();
        let value = parse_expr(cursor)?;
        Ok((Some(first), value))
    } else {
        Ok((None, first))
    }
}

fn parse_edge_half_or_conditional(cursor: &mut Cursor<'_>) -> Result<(Option<Expr>, EdgeHalf)> {
    // An edge-meta value is itself an `EdgeHalf`, which does not parse as
    // a general expression, so the conditional form is detected by
    // speculatively checking for a leading boolean expression followed by
    // `?:` only when the next tokens cannot start an `EdgeHalf` (i.e. the
    // lookahead is not `Kind[`).
    if is_edge_half_start(cursor) {
        return Ok((None, parse_edge_half(cursor)?));
    }
    let cond = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::QuestionColon) {
        return Err(error::unexpected(cursor, "`?:`"));
    }
    let half = parse_edge_half(cursor)?;
    Ok((Some(cond), half))
}

fn is_edge_half_start(cursor: &Cursor<'_>) -> bool {
    matches!(cursor.peek(), TokenKind::Ident(_) | TokenKind::CapIdent(_))
        && cursor.peek_at(1) == &TokenKind::LBracket
}

fn expect_comma(cursor: &mut Cursor<'_>) -> Result<()> {
    if cursor.eat(&TokenKind::Comma) {
        Ok(())
    } else {
        Err(error::expecting_comma(cursor))
    }
}
