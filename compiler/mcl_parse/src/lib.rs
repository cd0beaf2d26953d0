//! Parser: token stream to AST.
//!
//! A hand-written recursive-descent parser rather than a generated LALR
//! table: the core's own invariants (contextual error tokens, the
//! resource-body mini-grammar, operator-to-`Call` lowering) are easier to
//! express and test as ordinary Rust control flow than as grammar actions
//! threaded through a generated table, and this crate's reference style
//! (`mcl_lexer`, hand-rolled rather than `logos`-driven) already made that
//! call for the lexer.

mod cursor;
mod error;
mod expr;
mod program;
mod res;
mod stmt;
mod ty;

pub use ty::parse_type_ast;

use mcl_diagnostic::Result;
use mcl_ir::{Expr, MultiFileMap, NodeIdGen, Prog, StringInterner};

/// Parse one complete program from already-lexed tokens.
///
/// `interner` must be the same interner used to lex `source`'s tokens, so
/// that `Name`s embedded in tokens resolve correctly while the parser
/// builds string literals for resource kinds (a resource statement's
/// leading identifier becomes a `Str` kind expression) and deep-copies
/// dotted identifiers.
pub fn parse(source: &str, interner: &mut StringInterner) -> Result<Prog> {
    parse_with_file_map(source, None, interner)
}

pub fn parse_with_file_map(
    source: &str,
    file_map: Option<&MultiFileMap>,
    interner: &mut StringInterner,
) -> Result<Prog> {
    let id_gen = NodeIdGen::new();
    parse_with_id_gen(source, file_map, interner, &id_gen)
}

/// Parses with a caller-supplied [`NodeIdGen`], so a pipeline driver that
/// later deep-copies `Include` bodies (`mcl_scope`) can keep allocating ids
/// from the same counter the parse used, rather than risk two independent
/// generators both starting at zero and handing out colliding ids.
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse_with_id_gen(
    source: &str,
    file_map: Option<&MultiFileMap>,
    interner: &mut StringInterner,
    id_gen: &NodeIdGen,
) -> Result<Prog> {
    let tokens = mcl_lexer::Lexer::new(source, file_map, interner).lex()?;
    let mut parser = cursor::Cursor::new(tokens, interner, id_gen);
    let prog = program::parse_program(&mut parser)?;
    tracing::debug!(stmt_count = prog.body.len(), "parsed program");
    Ok(prog)
}

/// Parses a single, free-standing expression rather than a whole program:
/// the entry point `mcl_interp` calls for the `${...}` segments it pulls out
/// of an interpolated string literal. `source` must be
/// exactly one expression; anything left over after parsing it is a
/// [`mcl_diagnostic::ErrorCode::ParseError`].
pub fn parse_expr_str(
    source: &str,
    interner: &mut StringInterner,
    id_gen: &NodeIdGen,
) -> Result<Expr> {
    let tokens = mcl_lexer::Lexer::new(source, None, interner).lex()?;
    let mut cursor = cursor::Cursor::new(tokens, interner, id_gen);
    let parsed = expr::parse_expr(&mut cursor)?;
    cursor.skip_comments();
    if !cursor.at_eof() {
        return Err(error::unexpected(&cursor, "end of expression"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests;
