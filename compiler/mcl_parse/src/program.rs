//! Top-level `prog = stmt*` production.

use crate::cursor::Cursor;
use crate::stmt::parse_stmt;
use mcl_diagnostic::Result;
use mcl_ir::Prog;

pub fn parse_program(cursor: &mut Cursor<'_>) -> Result<Prog> {
    let start = cursor.span();
    let mut body = Vec::new();
    while !cursor.at_eof() {
        body.push(parse_stmt(cursor)?);
    }
    let span = start.to(cursor.span());
    Ok(Prog {
        id: cursor.next_id(),
        span,
        body,
    })
}
