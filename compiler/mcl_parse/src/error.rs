//! Diagnostic constructors shared by the parser's productions.

use crate::cursor::Cursor;
use mcl_diagnostic::{Diagnostic, ErrorCode};
use mcl_ir::TokenKind;

pub fn unexpected(cursor: &Cursor<'_>, expected: &str) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ParseError,
        format!("expected {expected}, found `{}`", cursor.peek()),
        Some(cursor.span()),
    )
}

/// Resource bodies require a trailing comma after every
/// field, including the last. Missing it on the final field is reported
/// with its own code, at the offending value's position, rather than the
/// generic `ParseError`.
pub fn expecting_comma(cursor: &Cursor<'_>) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ParseExpectingComma,
        "expected a trailing comma after this resource field",
        Some(cursor.prev_span()),
    )
}

/// `==` appearing where a binding's `=` was expected (a common typo
/// called out as its own named error).
pub fn additional_equals(cursor: &Cursor<'_>) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ParseAdditionalEquals,
        "unexpected `==`; did you mean `=`?",
        Some(cursor.span()),
    )
}

pub fn res_field_invalid(cursor: &Cursor<'_>) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ParseResFieldInvalid,
        "invalid resource body entry",
        Some(cursor.span()),
    )
}

pub fn set_type_invalid(cursor: &Cursor<'_>) -> Diagnostic {
    Diagnostic::new(
        ErrorCode::ParseSetType,
        "invalid type annotation",
        Some(cursor.span()),
    )
}

pub fn is_kind_token(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Ident(_) | TokenKind::CapIdent(_))
}
