//! Decodes string-literal escape sequences.
//!
//! Only `\n \t \\ \"` are legal escape sequences; any other backslash
//! sequence is a lex error.

use mcl_diagnostic::{Diagnostic, ErrorCode};
use mcl_ir::Span;

/// Decode the body of a double-quoted string literal (no surrounding
/// quotes) into its runtime value.
pub fn cook_string(raw: &str, span: Span) -> Result<String, Diagnostic> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(Diagnostic::new(
                    ErrorCode::LexInvalidEscape,
                    format!("invalid escape sequence `\\{other}`"),
                    Some(span),
                ))
            }
            None => {
                return Err(Diagnostic::new(
                    ErrorCode::LexUnterminatedString,
                    "dangling `\\` at end of string literal",
                    Some(span),
                ))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use mcl_ir::{Pos, Span};

    fn dummy() -> Span {
        Span::point(Pos::START)
    }

    #[test]
    fn decodes_supported_escapes() {
        assert_eq!(cook_string(r"a\nb\tc\\d\"e", dummy()).unwrap(), "a\nb\tc\\d\"e");
    }

    #[test]
    fn rejects_unsupported_escape() {
        let err = cook_string(r"a\qb", dummy()).unwrap_err();
        assert_eq!(err.code, ErrorCode::LexInvalidEscape);
    }

    #[test]
    fn rejects_dangling_backslash() {
        let err = cook_string("a\\", dummy()).unwrap_err();
        assert_eq!(err.code, ErrorCode::LexUnterminatedString);
    }
}
