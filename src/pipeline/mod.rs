//! Pipeline driver (SPEC_FULL §2.8): a pure function from source bytes to a
//! diagnostic sequence, composing the front end, the CFG builder, and the
//! core analyses. Owns no state across calls — every `AnalysisReport` is
//! self-contained, matching spec.md §5/§9's "no global mutable state".

use crate::ast::Function;
use crate::cfg;
use crate::dataflow::{definite_assignment, live_variables, reachability, return_path, zero_analysis};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::InternalError;
use crate::parser;

/// Diagnostics from one call to [`analyze`]. `internal_error` is set only
/// when the front end hit something that stopped it from producing an AST
/// at all (spec.md §7: a malformed-input signal, not a diagnosable defect) —
/// the CLI maps that to exit code 2 while `diagnostics` alone drives
/// exit code 0/1.
pub struct AnalysisReport {
    pub diagnostics: Vec<Diagnostic>,
    pub internal_error: Option<InternalError>,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        self.internal_error.is_some() || self.diagnostics.iter().any(|d| d.severity == crate::diagnostics::Severity::Error)
    }
}

/// Runs the full pipeline over `source`: lex, parse + bind + plain
/// name/type check, then build a CFG and run every core analysis per
/// function that came out of the front end clean. Never aborts partway
/// through a function list — one run reports every defect it finds
/// (spec.md §7).
pub fn analyze(source: &str) -> AnalysisReport {
    let parsed = match parser::parse(source) {
        Ok(p) => p,
        Err(err) => return AnalysisReport { diagnostics: Vec::new(), internal_error: Some(err) },
    };

    let mut sink = DiagnosticSink::new();
    for diag in parsed.diagnostics.as_slice() {
        sink.push(diag.clone());
    }

    for function in &parsed.program.functions {
        if parsed.function_errors.contains(&function.name) {
            continue;
        }
        let symbols = &parsed.symbols[&function.name];
        match cfg::build(function, symbols) {
            Ok(graph) => analyze_function(function, &graph, symbols, &mut sink),
            Err(err) => return AnalysisReport { diagnostics: sink.into_sorted(), internal_error: Some(err) },
        }
    }

    AnalysisReport { diagnostics: sink.into_sorted(), internal_error: None }
}

fn analyze_function(function: &Function, graph: &cfg::Cfg, symbols: &crate::symbols::SymbolTable, sink: &mut DiagnosticSink) {
    let Some(entry) = cfg::find_entry(graph) else { return };
    let Some(exit) = cfg::find_exit(graph) else { return };

    for diag in reachability::check(graph) {
        sink.push(diag);
    }
    if let Some(diag) = return_path::check(graph, function) {
        sink.push(diag);
    }
    for diag in definite_assignment::check(graph, entry, exit, symbols) {
        sink.push(diag);
    }
    for diag in live_variables::check(graph, entry, exit, symbols, function) {
        sink.push(diag);
    }
    for diag in zero_analysis::check(graph, entry, exit) {
        sink.push(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn empty_function_body_is_missing_return() {
        let report = analyze("int main() { }");
        assert!(report.internal_error.is_none());
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::MissingReturn));
    }

    #[test]
    fn scenario_use_before_def_through_a_partial_if() {
        let report = analyze("int main() { int x; if (1==1) { x = 1; } print(x); return 0; }");
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::UseBeforeDef));
    }

    #[test]
    fn scenario_unreachable_after_return() {
        let report = analyze("int main() { return 0; int x = 5; return x; }");
        let unreachable: Vec<_> = report.diagnostics.iter().filter(|d| d.kind == DiagnosticKind::Unreachable).collect();
        assert_eq!(unreachable.len(), 1);
    }

    #[test]
    fn scenario_dead_store_on_overwrite() {
        let report = analyze("int main() { int x = 10; x = 20; print(x); return 0; }");
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::DeadStore));
    }

    #[test]
    fn scenario_possible_division_by_zero_is_intraprocedural() {
        let report = analyze("int div(int a, int b) { return a / b; } int main() { return div(1, 0); }");
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::PossibleDivisionByZero));
        assert!(!report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn scenario_definite_division_by_zero() {
        let report = analyze("int main() { int x = 0; return 10 / x; }");
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn scenario_guarded_division_is_clean() {
        let report = analyze("int main() { int x = 5; if (x) { return 10 / x; } return 0; }");
        assert!(!report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero || d.kind == DiagnosticKind::PossibleDivisionByZero));
    }

    #[test]
    fn scenario_missing_return_on_partial_if() {
        let report = analyze("int f(int a) { if (a > 0) { return 1; } }");
        assert!(report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::MissingReturn));
    }

    #[test]
    fn boundary_overflowing_literal_is_flagged_but_max_i32_is_not() {
        let overflow = analyze("int main() { print(2147483648); return 0; }");
        assert!(overflow.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ConstantOverflow));

        let ok = analyze("int main() { print(2147483647); return 0; }");
        assert!(!ok.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ConstantOverflow));
    }

    #[test]
    fn while_true_return_has_no_missing_return_or_unreachable() {
        let report = analyze("int main() { while (true) { return 0; } }");
        assert!(!report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::MissingReturn));
        assert!(!report.diagnostics.iter().any(|d| d.kind == DiagnosticKind::Unreachable));
    }

    #[test]
    fn running_the_pipeline_twice_is_idempotent() {
        let src = "int main() { int x; if (x > 0) { x = 1; } print(x); return 0; }";
        let first = analyze(src).diagnostics;
        let second = analyze(src).diagnostics;
        assert_eq!(first, second);
    }
}
