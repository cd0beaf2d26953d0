//! Error codes for every compiler diagnostic.
//!
//! The exported set covers every named compiler error
//! (`ParseError`, `UnifyConflict`, …); lexer diagnostics get their own
//! variants in the same style so every error raised by any stage has a
//! stable, matchable code rather than a bare string.

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexer errors
    LexIntegerOverflow,
    LexFloatOverflow,
    LexInvalidEscape,
    LexUnterminatedString,
    LexUnknownByte,

    // Parser errors
    ParseError,
    ParseAdditionalEquals,
    ParseExpectingComma,
    ParseResFieldInvalid,
    ParseSetType,

    // Interpolation errors
    InterpUnclosedExpr,
    InterpInvalidExpr,

    // Scope errors
    ScopeDuplicate,
    ScopeMissing,
    RecursiveClass,
    ImportInvalid,

    // Unification errors
    UnifyConflict,
    UnifyAmbiguous,

    // Output/graph-lowering errors
    OutputOverflow,
    OutputTypeMismatch,
    OutputUnknownField,
}

impl ErrorCode {
    /// The phase this code belongs to, used only for grouping in reports.
    pub fn phase(self) -> &'static str {
        match self {
            ErrorCode::LexIntegerOverflow
            | ErrorCode::LexFloatOverflow
            | ErrorCode::LexInvalidEscape
            | ErrorCode::LexUnterminatedString
            | ErrorCode::LexUnknownByte => "lex",

            ErrorCode::ParseError
            | ErrorCode::ParseAdditionalEquals
            | ErrorCode::ParseExpectingComma
            | ErrorCode::ParseResFieldInvalid
            | ErrorCode::ParseSetType => "parse",

            ErrorCode::InterpUnclosedExpr | ErrorCode::InterpInvalidExpr => "interpolate",

            ErrorCode::ScopeDuplicate
            | ErrorCode::ScopeMissing
            | ErrorCode::RecursiveClass
            | ErrorCode::ImportInvalid => "scope",

            ErrorCode::UnifyConflict | ErrorCode::UnifyAmbiguous => "unify",

            ErrorCode::OutputOverflow
            | ErrorCode::OutputTypeMismatch
            | ErrorCode::OutputUnknownField => "output",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
