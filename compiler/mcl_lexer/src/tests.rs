use super::*;
use mcl_ir::{StringInterner, TokenKind};

fn kinds(src: &str) -> Vec<TokenKind> {
    let mut interner = StringInterner::new();
    lex(src, &mut interner)
        .expect("lexes")
        .as_slice()
        .iter()
        .map(|t| t.kind.clone())
        .collect()
}

#[test]
fn lexes_simple_assignment() {
    let ks = kinds("$rewsna = -42");
    assert!(matches!(ks[0], TokenKind::Var(_)));
    assert_eq!(ks[1], TokenKind::Eq);
    assert_eq!(ks[2], TokenKind::Minus);
    assert_eq!(ks[3], TokenKind::Int(42));
    assert_eq!(ks[4], TokenKind::Eof);
}

#[test]
fn lexes_dotted_var_path() {
    let ks = kinds("$pkg.foo.bar");
    let mut interner = StringInterner::new();
    let toks = lex("$pkg.foo.bar", &mut interner).unwrap();
    match &toks.as_slice()[0].kind {
        TokenKind::Var(n) => assert_eq!(interner.resolve(*n), "pkg.foo.bar"),
        other => panic!("expected Var, got {other:?}"),
    }
    assert_eq!(ks.len(), 2);
}

#[test]
fn rejects_dot_immediately_after_dollar() {
    let mut interner = StringInterner::new();
    let toks = lex("$.pkg.foo", &mut interner);
    assert!(toks.is_err());
}

#[test]
fn integer_literal_at_boundary_is_valid() {
    let ks = kinds("9223372036854775807");
    assert_eq!(ks[0], TokenKind::Int(i64::MAX));
}

#[test]
fn integer_literal_one_past_boundary_overflows() {
    let mut interner = StringInterner::new();
    let err = lex("9223372036854775808", &mut interner).unwrap_err();
    assert_eq!(err.code, mcl_diagnostic::ErrorCode::LexIntegerOverflow);
}

#[test]
fn integer_literal_with_underscores() {
    let mut interner = StringInterner::new();
    let err = lex("9_223_372_036_854_775_808", &mut interner).unwrap_err();
    assert_eq!(err.code, mcl_diagnostic::ErrorCode::LexIntegerOverflow);
}

#[test]
fn lexes_string_escapes() {
    let ks = kinds(r#""a\nb\t\"c\\""#);
    assert_eq!(ks[0], TokenKind::Str("a\nb\t\"c\\".to_string()));
}

#[test]
fn rejects_unsupported_string_escape() {
    let mut interner = StringInterner::new();
    let err = lex(r#""a\qb""#, &mut interner).unwrap_err();
    assert_eq!(err.code, mcl_diagnostic::ErrorCode::LexInvalidEscape);
}

#[test]
fn lexes_operators_and_punctuation() {
    let ks = kinds("-> => ?: || && == != <= >=");
    assert_eq!(
        ks,
        vec![
            TokenKind::Arrow,
            TokenKind::FatArrow,
            TokenKind::QuestionColon,
            TokenKind::Pipe2,
            TokenKind::Amp2,
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_cap_ident_as_resource_kind() {
    let mut interner = StringInterner::new();
    let toks = lex("Test", &mut interner).unwrap();
    match &toks.as_slice()[0].kind {
        TokenKind::CapIdent(n) => assert_eq!(interner.resolve(*n), "Test"),
        other => panic!("expected CapIdent, got {other:?}"),
    }
}

#[test]
fn keywords_take_priority_over_identifiers() {
    let ks = kinds("if forkv collect panic");
    assert_eq!(
        ks,
        vec![
            TokenKind::KwIf,
            TokenKind::KwForKv,
            TokenKind::KwCollect,
            TokenKind::KwPanic,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comment_runs_to_end_of_line() {
    let ks = kinds("# hello\n$x = 1");
    assert!(matches!(ks[0], TokenKind::Comment(_)));
}

#[test]
fn unknown_byte_is_error_token() {
    let ks = kinds("@");
    assert_eq!(ks[0], TokenKind::Error);
}

#[test]
fn stray_dot_after_ident_is_error_token() {
    // `foo.c1.` — trailing dot not followed by an identifier start.
    let ks = kinds("foo.c1.");
    assert!(matches!(ks[0], TokenKind::Ident(_)));
    assert_eq!(ks[1], TokenKind::Error);
}

#[test]
fn float_literal_with_exponent() {
    let ks = kinds("1.5e10");
    assert_eq!(ks[0], TokenKind::Float(1.5e10));
}
