//! Diagnostic records and the sink analyses accumulate them into.

use crate::ast::Location;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The kind of defect a diagnostic reports.
///
/// The first seven variants are the sound core analyses (spec §7); the
/// rest originate in the front end (lexing, parsing, name/type binding)
/// and carry no soundness claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Unreachable,
    MissingReturn,
    UseBeforeDef,
    DeadStore,
    DivisionByZero,
    PossibleDivisionByZero,
    ConstantOverflow,
    LexError,
    ParseError,
    UndeclaredVariable,
    TypeMismatch,
    DuplicateDeclaration,
    ArityMismatch,
    UnknownFunction,
}

impl DiagnosticKind {
    /// Default severity for this kind when the caller doesn't already know it.
    pub fn default_severity(self) -> Severity {
        use DiagnosticKind::*;
        match self {
            Unreachable | DeadStore | PossibleDivisionByZero | ConstantOverflow => Severity::Warning,
            MissingReturn
            | UseBeforeDef
            | DivisionByZero
            | LexError
            | ParseError
            | UndeclaredVariable
            | TypeMismatch
            | DuplicateDeclaration
            | ArityMismatch
            | UnknownFunction => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiagnosticKind::Unreachable => "unreachable",
            DiagnosticKind::MissingReturn => "missing-return",
            DiagnosticKind::UseBeforeDef => "use-before-def",
            DiagnosticKind::DeadStore => "dead-store",
            DiagnosticKind::DivisionByZero => "division-by-zero",
            DiagnosticKind::PossibleDivisionByZero => "possible-division-by-zero",
            DiagnosticKind::ConstantOverflow => "constant-overflow",
            DiagnosticKind::LexError => "lex-error",
            DiagnosticKind::ParseError => "parse-error",
            DiagnosticKind::UndeclaredVariable => "undeclared-variable",
            DiagnosticKind::TypeMismatch => "type-mismatch",
            DiagnosticKind::DuplicateDeclaration => "duplicate-declaration",
            DiagnosticKind::ArityMismatch => "arity-mismatch",
            DiagnosticKind::UnknownFunction => "unknown-function",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            severity: kind.default_severity(),
            kind,
            message: message.into(),
            location,
        }
    }
}

/// Stable ordering: (line, column, kind) — see spec §6. There is exactly
/// one file per analyzer run, so `file` collapses out of the sort tuple.
impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.location.line, self.location.column, self.kind).cmp(&(
            other.location.line,
            other.location.column,
            other.kind,
        ))
    }
}

/// Accumulates diagnostics for a single analyzer run.
///
/// Owned exclusively by the pipeline invocation (or, during a single
/// analysis pass, by that pass); never shared or locked (spec §5/§9).
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn report(&mut self, kind: DiagnosticKind, location: Location, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, location, message));
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Consume the sink, returning diagnostics sorted per spec §6.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort();
        self.diagnostics
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
