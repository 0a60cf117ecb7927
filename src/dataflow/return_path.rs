//! Return-path completeness (SPEC §4.4), phrased as CFG reachability: a
//! function is missing a return if some *feasible* path falls through into
//! the exit block instead of reaching it via an explicit `return`.
//!
//! "Feasible" here must account for constant-condition folding the same
//! way `dataflow::reachability` does: `while (true) { return 0; }` seals its
//! header's structurally-present `False` edge to an `after` block that
//! falls through to `exit`, but that edge is infeasible (the condition
//! always folds to `true`), so plain graph reachability would wrongly
//! count `after` as a reachable fall-through predecessor of `exit`.

use crate::ast::Function;
use crate::cfg::analysis::{find_entry, find_exit, incoming_edges};
use crate::cfg::{Cfg, EdgeType};
use crate::dataflow::reachability::reachable_with_folding;
use crate::diagnostics::{Diagnostic, DiagnosticKind};

pub fn check(cfg: &Cfg, function: &Function) -> Option<Diagnostic> {
    let entry = find_entry(cfg)?;
    let exit = find_exit(cfg)?;
    let reachable = reachable_with_folding(cfg, entry);

    let falls_through = incoming_edges(cfg, exit)
        .into_iter()
        .any(|(pred, kind)| reachable.contains(&pred) && matches!(kind, EdgeType::Fallthrough));

    if falls_through {
        Some(Diagnostic::new(
            DiagnosticKind::MissingReturn,
            function.end_loc,
            format!("function '{}' does not return a value on every path", function.name),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::builder::build;
    use crate::parser::parse;

    fn check_source(src: &str) -> Option<Diagnostic> {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors());
        let f = &out.program.functions[0];
        let cfg = build(f, &out.symbols[&f.name]).unwrap();
        check(&cfg, f)
    }

    #[test]
    fn unconditional_return_is_complete() {
        assert!(check_source("int main() { return 1; }").is_none());
    }

    #[test]
    fn both_if_branches_returning_is_complete() {
        assert!(check_source("int main() { if (true) { return 1; } else { return 2; } }").is_none());
    }

    #[test]
    fn missing_else_branch_return_is_flagged() {
        assert!(check_source("int main() { if (true) { return 1; } print(0); }").is_some());
    }

    #[test]
    fn falling_off_the_end_is_flagged() {
        assert!(check_source("int main() { int x = 1; }").is_some());
    }

    #[test]
    fn while_true_with_return_is_complete() {
        assert!(check_source("int main() { while (true) { return 0; } }").is_none());
    }
}
