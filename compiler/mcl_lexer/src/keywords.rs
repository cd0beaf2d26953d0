//! The keyword table.
//!
//! Only the words the grammar always reserves are classified here.
//! `Before`/`After`/`Notify`/`Listen`/`Meta` are *contextual* keywords:
//! they are ordinary identifiers to the lexer and are recognized by
//! `mcl_parse` only while parsing a resource body entry, which is the only
//! place they carry any meaning (and the only place `Meta`'s
//! case-insensitive match applies). Reserving them globally would make
//! `$before = 5` illegal, which the grammar never asks for.

use mcl_ir::TokenKind;

/// Look up `ident` as a keyword, if it is one.
pub fn lookup(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "for" => TokenKind::KwFor,
        "forkv" => TokenKind::KwForKv,
        "in" => TokenKind::KwIn,
        "func" => TokenKind::KwFunc,
        "class" => TokenKind::KwClass,
        "include" => TokenKind::KwInclude,
        "import" => TokenKind::KwImport,
        "panic" => TokenKind::KwPanic,
        "collect" => TokenKind::KwCollect,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_identifier_is_not_a_keyword() {
        assert_eq!(lookup("foobar"), None);
        assert_eq!(lookup("before"), None);
        assert_eq!(lookup("Meta"), None);
    }

    #[test]
    fn control_keywords_match_exactly() {
        assert_eq!(lookup("if"), Some(TokenKind::KwIf));
        assert_eq!(lookup("forkv"), Some(TokenKind::KwForKv));
    }
}
