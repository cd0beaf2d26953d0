//! Token kinds produced by the lexer and consumed by the parser.

use crate::{Name, Span};
use std::fmt;

/// A single lexical token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Kinds of tokens the lexer can produce.
///
/// Literal payloads are fully decoded (string escapes resolved, integers and
/// floats parsed) by the time the lexer hands a token to the parser — see
/// `mcl_lexer`'s contracts on overflow and escape validity.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decoded string literal body (escapes already resolved). Interpolation
    /// (`${...}`) is *not* resolved here — that is `mcl_interp`'s job, run
    /// as a second pass over the parsed AST.
    Str(String),

    /// Bare identifier, e.g. `foo`, `foo.bar`.
    Ident(Name),
    /// Capitalized identifier, used for resource kinds, e.g. `File`, `Test`.
    CapIdent(Name),
    /// Dollar-prefixed variable reference, e.g. `$foo`.
    Var(Name),

    // Keywords
    KwIf,
    KwElse,
    KwFor,
    KwForKv,
    KwIn,
    KwFunc,
    KwClass,
    KwInclude,
    KwImport,
    KwPanic,
    KwCollect,
    KwTrue,
    KwFalse,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Arrow,     // ->
    FatArrow,  // =>
    QuestionColon, // ?:
    Pipe2,     // ||
    Amp2,      // &&
    Bang,      // !

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Eq,       // =
    EqEq,     // ==
    NotEq,    // !=
    Lt,
    Gt,
    LtEq,
    GtEq,

    Comment(String),
    Eof,
    /// Sentinel for bytes the lexer could not classify; the parser rejects
    /// any stream containing one of these.
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Bool(b) => return write!(f, "{b}"),
            TokenKind::Int(i) => return write!(f, "{i}"),
            TokenKind::Float(x) => return write!(f, "{x}"),
            TokenKind::Str(_) => "string literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::CapIdent(_) => "capitalized identifier",
            TokenKind::Var(_) => "variable",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwFor => "for",
            TokenKind::KwForKv => "forkv",
            TokenKind::KwIn => "in",
            TokenKind::KwFunc => "func",
            TokenKind::KwClass => "class",
            TokenKind::KwInclude => "include",
            TokenKind::KwImport => "import",
            TokenKind::KwPanic => "panic",
            TokenKind::KwCollect => "collect",
            TokenKind::KwTrue => "true",
            TokenKind::KwFalse => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "->",
            TokenKind::FatArrow => "=>",
            TokenKind::QuestionColon => "?:",
            TokenKind::Pipe2 => "||",
            TokenKind::Amp2 => "&&",
            TokenKind::Bang => "!",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Comment(_) => "comment",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "unrecognized byte",
        };
        write!(f, "{s}")
    }
}

/// An owned, randomly-indexable stream of tokens.
///
/// The parser consumes this with a cursor rather than an iterator so that it
/// can look ahead arbitrarily far (needed to disambiguate e.g. a resource
/// body from a block expression) without re-lexing.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenList { tokens }
    }

    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }
}
