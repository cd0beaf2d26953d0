//! The lexer proper: a hand-rolled scanner over `&str` source.
//!
//! No SIMD/sentinel tricks here — the front end this crate belongs to is
//! a cooperative, single-pass compiler, not an incremental
//! one under tight per-keystroke latency budgets, so a straightforward
//! `char`-at-a-time scan is the simpler, equally idiomatic choice.

use crate::cooker::cook_string;
use crate::keywords;
use mcl_diagnostic::{Diagnostic, ErrorCode};
use mcl_ir::{MultiFileMap, Name, Pos, Span, StringInterner, Token, TokenKind, TokenList};

/// Scans one source stream (possibly a multi-file concatenation) into a
/// [`TokenList`].
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    interner: &'a mut StringInterner,
    file_map: Option<&'a MultiFileMap>,
    line: u32,
    col: u32,
    filename: Option<Name>,
}

impl<'a> Lexer<'a> {
    pub fn new(
        source: &'a str,
        file_map: Option<&'a MultiFileMap>,
        interner: &'a mut StringInterner,
    ) -> Self {
        let filename = file_map.and_then(|m| m.resolve(1).0);
        Lexer {
            chars: source.chars().peekable(),
            interner,
            file_map,
            line: 1,
            col: 1,
            filename,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col, self.filename)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
            if let Some(map) = self.file_map {
                self.filename = map.resolve(self.line).0;
            }
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn eat_if(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn lex(mut self) -> Result<TokenList, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, Span::point(start)));
                break;
            };
            let kind = if c == '#' {
                self.lex_comment()
            } else if c == '"' {
                self.lex_string(start)?
            } else if c == '$' {
                self.lex_var(start)?
            } else if c.is_ascii_digit() {
                self.lex_number(start)?
            } else if is_ident_start(c) {
                self.lex_ident()
            } else {
                self.lex_punct(start)?
            };
            let end = self.pos();
            tokens.push(Token::new(kind, Span::new(start, end)));
        }
        tracing::debug!(token_count = tokens.len(), "lexed source");
        Ok(TokenList::new(tokens))
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_comment(&mut self) -> TokenKind {
        let mut text = String::new();
        self.bump(); // '#'
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        TokenKind::Comment(text)
    }

    fn lex_string(&mut self, start: Pos) -> Result<TokenKind, Diagnostic> {
        self.bump(); // opening quote
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    raw.push('\\');
                    match self.bump() {
                        Some(c) => raw.push(c),
                        None => {
                            return Err(Diagnostic::new(
                                ErrorCode::LexUnterminatedString,
                                "unterminated string literal",
                                Some(Span::new(start, self.pos())),
                            ))
                        }
                    }
                }
                Some(c) => raw.push(c),
                None => {
                    return Err(Diagnostic::new(
                        ErrorCode::LexUnterminatedString,
                        "unterminated string literal",
                        Some(Span::new(start, self.pos())),
                    ))
                }
            }
        }
        let span = Span::new(start, self.pos());
        let decoded = cook_string(&raw, span)?;
        Ok(TokenKind::Str(decoded))
    }

    /// Scans a dotted identifier path starting at the current position,
    /// which must already be `is_ident_start`. A trailing/doubled `.` is
    /// *not* consumed (`class foo.c1. {}` is rejected one layer up, by
    /// the parser seeing a stray `.` it cannot classify).
    fn lex_dotted_ident(&mut self) -> String {
        let mut text = String::new();
        text.push(self.bump().unwrap_or_else(|| unreachable!("caller checked is_ident_start")));
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                text.push(c);
                self.bump();
            } else if c == '.' && self.peek2().is_some_and(is_ident_start) {
                text.push('.');
                self.bump();
                text.push(self.bump().unwrap_or_else(|| unreachable!("peek2 checked")));
            } else {
                break;
            }
        }
        text
    }

    fn lex_ident(&mut self) -> TokenKind {
        let is_cap = self.peek().is_some_and(|c| c.is_ascii_uppercase());
        let text = self.lex_dotted_ident();
        if !is_cap {
            if let Some(kw) = keywords::lookup(&text) {
                return kw;
            }
        }
        let name = self.interner.intern(&text);
        if is_cap {
            TokenKind::CapIdent(name)
        } else {
            TokenKind::Ident(name)
        }
    }

    fn lex_var(&mut self, start: Pos) -> Result<TokenKind, Diagnostic> {
        self.bump(); // '$'
        if !self.peek().is_some_and(is_ident_start) {
            return Err(Diagnostic::new(
                ErrorCode::ParseError,
                "expected identifier after `$`",
                Some(Span::new(start, self.pos())),
            ));
        }
        let text = self.lex_dotted_ident();
        Ok(TokenKind::Var(self.interner.intern(&text)))
    }

    fn lex_number(&mut self, start: Pos) -> Result<TokenKind, Diagnostic> {
        let mut digits = String::new();
        self.collect_digits(&mut digits);
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            digits.push('.');
            self.bump();
            self.collect_digits(&mut digits);
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut clone = self.chars.clone();
            clone.next();
            let exp_ok = match clone.peek() {
                Some('+') | Some('-') => clone
                    .clone()
                    .nth(1)
                    .is_some_and(|c: char| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exp_ok {
                is_float = true;
                digits.push(self.bump().unwrap_or_else(|| unreachable!("peeked 'e'/'E'")));
                if matches!(self.peek(), Some('+') | Some('-')) {
                    digits.push(self.bump().unwrap_or_else(|| unreachable!("peeked sign")));
                }
                self.collect_digits(&mut digits);
            }
        }
        let span = Span::new(start, self.pos());
        if is_float {
            let value: f64 = digits
                .parse()
                .map_err(|_| Diagnostic::new(ErrorCode::LexFloatOverflow, "invalid float literal", Some(span)))?;
            if value.is_infinite() {
                return Err(Diagnostic::new(
                    ErrorCode::LexFloatOverflow,
                    "float literal out of range",
                    Some(span),
                ));
            }
            Ok(TokenKind::Float(value))
        } else {
            let value: u128 = digits
                .parse()
                .map_err(|_| Diagnostic::new(ErrorCode::LexIntegerOverflow, "invalid integer literal", Some(span)))?;
            if value > i64::MAX as u128 {
                return Err(Diagnostic::new(
                    ErrorCode::LexIntegerOverflow,
                    "integer literal out of range [-2^63, 2^63-1]",
                    Some(span),
                ));
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "value was just range-checked against i64::MAX above"
            )]
            Ok(TokenKind::Int(value as i64))
        }
    }

    fn collect_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.bump();
            } else if c == '_' && self.peek2().is_some_and(|n| n.is_ascii_digit()) {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_punct(&mut self, start: Pos) -> Result<TokenKind, Diagnostic> {
        let c = self.bump().unwrap_or_else(|| unreachable!("caller checked peek"));
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => {
                if self.eat_if('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '!' => {
                if self.eat_if('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '=' => {
                if self.eat_if('=') {
                    TokenKind::EqEq
                } else if self.eat_if('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Eq
                }
            }
            '<' => {
                if self.eat_if('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat_if('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat_if('&') {
                    TokenKind::Amp2
                } else {
                    return Ok(TokenKind::Error);
                }
            }
            '|' => {
                if self.eat_if('|') {
                    TokenKind::Pipe2
                } else {
                    return Ok(TokenKind::Error);
                }
            }
            '?' => {
                if self.eat_if(':') {
                    TokenKind::QuestionColon
                } else {
                    return Ok(TokenKind::Error);
                }
            }
            _ => {
                let _ = start;
                TokenKind::Error
            }
        };
        Ok(kind)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience entry point lexing a single, single-file source string.
pub fn lex(source: &str, interner: &mut StringInterner) -> Result<TokenList, Diagnostic> {
    Lexer::new(source, None, interner).lex()
}
