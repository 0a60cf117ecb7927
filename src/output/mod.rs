//! Diagnostic rendering (SPEC_FULL §6/§9 "output formatting"), adapted from
//! the teacher's terminal color and severity-prefix helpers.

use crate::diagnostics::{Diagnostic, Severity};
use crate::error::InternalError;
use crate::cli::OutputFormat;
use serde::Serialize;
use std::io::IsTerminal;

pub const RED: &str = "\x1b[0;31m";
pub const YELLOW: &str = "\x1b[1;33m";
pub const BOLD: &str = "\x1b[1m";
pub const NC: &str = "\x1b[0m";

/// Exit codes per spec.md §6.
pub const EXIT_OK: i32 = 0;
pub const EXIT_WITH_ERRORS: i32 = 1;
pub const EXIT_INVOCATION_ERROR: i32 = 2;

#[inline]
fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
    }
}

pub fn error(msg: &str) {
    let (color, reset) = if is_terminal() { (RED, NC) } else { ("", "") };
    eprintln!("{}error:{} {}", color, reset, msg);
}

#[derive(Debug, Serialize)]
struct LocationJson {
    file: String,
    line: usize,
    column: usize,
}

/// Stable JSON shape for a single diagnostic (spec.md §6).
#[derive(Debug, Serialize)]
struct DiagnosticJson {
    severity: String,
    kind: String,
    message: String,
    location: LocationJson,
}

impl DiagnosticJson {
    fn from_diagnostic(file: &str, diagnostic: &Diagnostic) -> Self {
        DiagnosticJson {
            severity: diagnostic.severity.to_string(),
            kind: diagnostic.kind.to_string(),
            message: diagnostic.message.clone(),
            location: LocationJson {
                file: file.to_string(),
                line: diagnostic.location.line,
                column: diagnostic.location.column,
            },
        }
    }
}

/// Renders `diagnostics` (already stable-sorted by the pipeline) to stdout
/// in the requested format, plus a one-line summary on stderr for the
/// human format.
pub fn render(file: &str, diagnostics: &[Diagnostic], format: OutputFormat) {
    match format {
        OutputFormat::Human => render_human(file, diagnostics),
        OutputFormat::Json => render_json(file, diagnostics),
    }
}

fn render_human(file: &str, diagnostics: &[Diagnostic]) {
    let terminal = is_terminal();
    for diagnostic in diagnostics {
        let (color, reset) = if terminal { (severity_color(diagnostic.severity), NC) } else { ("", "") };
        println!(
            "{}:{}:{}: {}{}{}: {} [{}]",
            file,
            diagnostic.location.line,
            diagnostic.location.column,
            color,
            diagnostic.severity,
            reset,
            diagnostic.message,
            diagnostic.kind,
        );
    }

    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diagnostics.len() - errors;
    let (bold, reset) = if terminal { (BOLD, NC) } else { ("", "") };
    if diagnostics.is_empty() {
        eprintln!("{}{}: no issues found{}", bold, file, reset);
    } else {
        eprintln!("{}{}: {} error(s), {} warning(s){}", bold, file, errors, warnings, reset);
    }
}

fn render_json(file: &str, diagnostics: &[Diagnostic]) {
    let records: Vec<DiagnosticJson> = diagnostics.iter().map(|d| DiagnosticJson::from_diagnostic(file, d)).collect();
    println!("{}", serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string()));
}

/// Surfaces a front-end `InternalError` (a lex/parse failure that stopped
/// the pipeline before it produced an AST) the way spec.md §6 requires:
/// an invocation-error exit code, with the same severity/location shape
/// as a diagnostic so `--output json` stays uniform.
pub fn render_internal_error(file: &str, err: &InternalError, format: OutputFormat) {
    let (message, loc) = match err {
        InternalError::Lex { loc, message } => (message.clone(), Some(*loc)),
        InternalError::Parse { loc, message } => (message.clone(), Some(*loc)),
        InternalError::MalformedCfg { function, message } => (format!("internal error in '{}': {}", function, message), None),
        InternalError::UnresolvedFunction(name) => (format!("internal error: unresolved function '{}'", name), None),
    };

    match format {
        OutputFormat::Human => {
            if let Some(loc) = loc {
                error(&format!("{}:{}:{}: {}", file, loc.line, loc.column, message));
            } else {
                error(&message);
            }
        }
        OutputFormat::Json => {
            let record = DiagnosticJson {
                severity: "error".to_string(),
                kind: "invocation-error".to_string(),
                message,
                location: LocationJson {
                    file: file.to_string(),
                    line: loc.map(|l| l.line).unwrap_or(0),
                    column: loc.map(|l| l.column).unwrap_or(0),
                },
            };
            println!("{}", serde_json::to_string_pretty(&vec![record]).unwrap_or_else(|_| "[]".to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn diagnostic_json_carries_stable_shape() {
        let diag = Diagnostic::new(DiagnosticKind::DeadStore, Location::new(3, 5), "value never read");
        let json = DiagnosticJson::from_diagnostic("prog.minic", &diag);
        let rendered = serde_json::to_string(&json).unwrap();
        assert!(rendered.contains("\"severity\":\"warning\""));
        assert!(rendered.contains("\"kind\":\"dead-store\""));
        assert!(rendered.contains("\"line\":3"));
        assert!(rendered.contains("\"column\":5"));
        assert!(rendered.contains("\"file\":\"prog.minic\""));
    }
}
