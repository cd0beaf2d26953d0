//! Parses the explicit type-annotation grammar into
//! [`mcl_ir::TypeAst`].
//!
//! These are source-written annotations only (`func(a str) bool`, a class
//! parameter's `$x int`, or the rare round-tripped `?N`); the *resolved*
//! `mcl_types::Type` the unifier produces is a different type with its own
//! canonical `Display`/parse (see `mcl_types::ty::Type`).

use crate::cursor::Cursor;
use crate::error;
use mcl_diagnostic::Result;
use mcl_ir::{TokenKind, TypeAst};

pub fn parse_type_ast(cursor: &mut Cursor<'_>) -> Result<TypeAst> {
    cursor.skip_comments();
    match cursor.peek().clone() {
        TokenKind::LBracket => {
            cursor.bump();
            if !cursor.eat(&TokenKind::RBracket) {
                return Err(error::set_type_invalid(cursor));
            }
            let elem = parse_type_ast(cursor)?;
            Ok(TypeAst::List(Box::new(elem)))
        }
        TokenKind::Ident(name) => {
            let text = cursor.resolve(name).to_string();
            cursor.bump();
            match text.as_str() {
                "bool" => Ok(TypeAst::Bool),
                "str" => Ok(TypeAst::Str),
                "int" => Ok(TypeAst::Int),
                "float" => Ok(TypeAst::Float),
                "variant" => Ok(TypeAst::Variant),
                "map" => parse_map_type(cursor),
                "struct" => parse_struct_type(cursor),
                "func" => parse_func_type(cursor),
                _ => Err(error::set_type_invalid(cursor)),
            }
        }
        TokenKind::Error => {
            // `?N` — only ever produced by re-lexing a printed inferred
            // type; the lexer has no dedicated token for bare `?`.
            Err(error::set_type_invalid(cursor))
        }
        _ => Err(error::set_type_invalid(cursor)),
    }
}

fn parse_map_type(cursor: &mut Cursor<'_>) -> Result<TypeAst> {
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::set_type_invalid(cursor));
    }
    let key = parse_type_ast(cursor)?;
    if !cursor.eat(&TokenKind::Colon) {
        return Err(error::set_type_invalid(cursor));
    }
    let val = parse_type_ast(cursor)?;
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::set_type_invalid(cursor));
    }
    Ok(TypeAst::Map(Box::new(key), Box::new(val)))
}

fn parse_struct_type(cursor: &mut Cursor<'_>) -> Result<TypeAst> {
    if !cursor.eat(&TokenKind::LBrace) {
        return Err(error::set_type_invalid(cursor));
    }
    let mut fields = Vec::new();
    while !cursor.check(&TokenKind::RBrace) {
        let name = expect_ident(cursor)?;
        let ty = parse_type_ast(cursor)?;
        fields.push((name, ty));
        if !cursor.eat(&TokenKind::Semicolon) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RBrace) {
        return Err(error::set_type_invalid(cursor));
    }
    Ok(TypeAst::Struct(fields))
}

fn parse_func_type(cursor: &mut Cursor<'_>) -> Result<TypeAst> {
    if !cursor.eat(&TokenKind::LParen) {
        return Err(error::set_type_invalid(cursor));
    }
    let mut args = Vec::new();
    while !cursor.check(&TokenKind::RParen) {
        let name = expect_ident(cursor)?;
        let ty = parse_type_ast(cursor)?;
        args.push((name, ty));
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    if !cursor.eat(&TokenKind::RParen) {
        return Err(error::set_type_invalid(cursor));
    }
    let out = parse_type_ast(cursor)?;
    Ok(TypeAst::Func(args, Box::new(out)))
}

fn expect_ident(cursor: &mut Cursor<'_>) -> Result<mcl_ir::Name> {
    cursor.skip_comments();
    match cursor.peek().clone() {
        TokenKind::Ident(name) => {
            cursor.bump();
            Ok(name)
        }
        _ => Err(error::set_type_invalid(cursor)),
    }
}

/// True if the upcoming token can start a type annotation, used by callers
/// deciding whether an optional `: T` / bare `T` suffix is present.
pub fn starts_type(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Ident(_) | TokenKind::LBracket)
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests {
    use super::*;
    use mcl_ir::{NodeIdGen, StringInterner};

    fn parse(src: &str) -> TypeAst {
        let mut interner = StringInterner::new();
        let tokens = mcl_lexer::lex(src, &mut interner).expect("lexes");
        let ids = NodeIdGen::new();
        let mut cursor = Cursor::new(tokens, &mut interner, &ids);
        parse_type_ast(&mut cursor).expect("parses")
    }

    #[test]
    fn parses_scalar_types() {
        assert_eq!(parse("bool"), TypeAst::Bool);
        assert_eq!(parse("str"), TypeAst::Str);
        assert_eq!(parse("int"), TypeAst::Int);
        assert_eq!(parse("float"), TypeAst::Float);
        assert_eq!(parse("variant"), TypeAst::Variant);
    }

    #[test]
    fn parses_list_type() {
        assert_eq!(parse("[]str"), TypeAst::List(Box::new(TypeAst::Str)));
    }

    #[test]
    fn parses_map_type() {
        assert_eq!(
            parse("map{str: int}"),
            TypeAst::Map(Box::new(TypeAst::Str), Box::new(TypeAst::Int))
        );
    }

    #[test]
    fn parses_func_type() {
        let ty = parse("func(a str, b int) bool");
        match ty {
            TypeAst::Func(args, out) => {
                assert_eq!(args.len(), 2);
                assert_eq!(*out, TypeAst::Bool);
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }
}
