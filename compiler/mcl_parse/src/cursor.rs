//! Parser state: a random-access cursor over the token list plus the
//! shared interner and node-id allocator every production needs.

use mcl_ir::{Name, NodeId, NodeIdGen, Span, StringInterner, Token, TokenKind, TokenList};

pub struct Cursor<'a> {
    tokens: TokenList,
    pos: usize,
    pub interner: &'a mut StringInterner,
    pub ids: &'a NodeIdGen,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: TokenList, interner: &'a mut StringInterner, ids: &'a NodeIdGen) -> Self {
        Cursor {
            tokens,
            pos: 0,
            interner,
            ids,
        }
    }

    pub fn next_id(&self) -> NodeId {
        self.ids.next_id()
    }

    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.interner.resolve(name)
    }

    fn tok_at(&self, idx: usize) -> &Token {
        self.tokens
            .get(idx)
            .unwrap_or_else(|| self.tokens.get(self.tokens.len() - 1).unwrap_or_else(|| unreachable!("token list is never empty: lexer always emits Eof")))
    }

    pub fn peek(&self) -> &TokenKind {
        &self.tok_at(self.pos).kind
    }

    pub fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tok_at(self.pos + offset).kind
    }

    pub fn span(&self) -> Span {
        self.tok_at(self.pos).span
    }

    pub fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.span()
        } else {
            self.tok_at(self.pos - 1).span
        }
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// Advance past the current token (including any comments), returning
    /// the token skipped over.
    pub fn bump(&mut self) -> Token {
        let tok = self.tok_at(self.pos).clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Skip any run of `Comment` tokens; comments are not part of the AST
    ///.
    pub fn skip_comments(&mut self) {
        while matches!(self.peek(), TokenKind::Comment(_)) {
            self.bump();
        }
    }

    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        self.skip_comments();
        if std::mem::discriminant(self.peek()) == std::mem::discriminant(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn check(&mut self, kind: &TokenKind) -> bool {
        self.skip_comments();
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }
}
