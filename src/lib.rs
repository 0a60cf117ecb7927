//! MiniC static analyzer: a control-flow graph and fixed-point dataflow
//! engine over a small C-like language, plus the front end needed to drive
//! it from a single source file.
//!
//! The analysis core — `cfg` and `dataflow` — is the part of this crate
//! with a soundness claim (spec.md §1, §7). `lexer`, `parser`, and
//! `symbols` are collaborators: they produce the typed, resolved AST the
//! core consumes and carry no such claim themselves.

#![allow(dead_code)]

pub mod ast;
pub mod cfg;
pub mod cli;
pub mod dataflow;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod symbols;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use pipeline::{analyze, AnalysisReport};
