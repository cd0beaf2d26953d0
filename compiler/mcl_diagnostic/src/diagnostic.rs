//! The `Diagnostic` value every stage returns on failure.

use crate::ErrorCode;
use mcl_ir::Span;
use std::fmt;

/// One diagnostic: a code, a human-readable message, the span it is
/// attributed to, and any causes it wraps.
///
/// Parse errors cite row/col/filename, scope errors cite the offending
/// name and its prior declaration site, and unification errors cite the
/// conflicting pair of expressions/types.
/// Rather than growing bespoke fields for each of those, this models "the
/// prior declaration" / "the other half of the conflict" uniformly as a
/// wrapped `cause` diagnostic pointing at the other site, so every stage
/// reports through one shape.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub span: Option<Span>,
    pub causes: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            span,
            causes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Diagnostic) -> Self {
        self.causes.push(cause);
        self
    }

    #[must_use]
    pub fn with_causes(mut self, causes: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.causes.extend(causes);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(
                f,
                "{} at {}:{}: {}",
                self.code,
                span.start_row(),
                span.start_col(),
                self.message
            )?,
            None => write!(f, "{}: {}", self.code, self.message)?,
        }
        for cause in &self.causes {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
