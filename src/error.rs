//! Internal-invariant errors.
//!
//! These signal a programmer error in the front end or core (a malformed
//! AST reaching the CFG builder, an analysis invoked on an inconsistent
//! CFG) — never a property of the analyzed MiniC program. Source-level
//! defects are reported as [`crate::diagnostics::Diagnostic`]s instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("lex error at {loc}: {message}")]
    Lex { loc: crate::ast::Location, message: String },

    #[error("parse error at {loc}: {message}")]
    Parse { loc: crate::ast::Location, message: String },

    #[error("CFG builder invariant violated in function '{function}': {message}")]
    MalformedCfg { function: String, message: String },

    #[error("unknown function '{0}' resolved past the binder")]
    UnresolvedFunction(String),
}
