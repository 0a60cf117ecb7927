//! Unreachable code detection (SPEC §4.3).
//!
//! Graph reachability from `entry`, sharpened by constant-condition folding
//! (§4.6): a `Branch` whose condition folds to a known truth value prunes
//! the infeasible edge before the DFS runs, so e.g. `if (false) { S }`
//! reports `S` as unreachable even though the CFG has a structural edge
//! into its block. `cfg::reachability::find_reachable` stays pure graph
//! reachability (no folding) — the dataflow engine's worklist bounds
//! iteration to it, and folding there would risk pruning a block the other
//! "must"/"may" analyses still need to see.

use crate::cfg::analysis::find_entry;
use crate::cfg::{Cfg, EdgeType, Terminator};
use crate::dataflow::constant_fold::{self, ConstValue, FoldResult};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;

/// Truthiness of a folded condition, treating a nonzero `int` the same as
/// `true` — MiniC allows a bare `int` condition (spec.md §8 scenario 6).
fn folded_truth(expr: &crate::ast::Expr) -> Option<bool> {
    match constant_fold::fold(expr) {
        FoldResult::Value(ConstValue::Bool(b)) => Some(b),
        FoldResult::Value(ConstValue::Int(v)) => Some(v != 0),
        _ => None,
    }
}

fn feasible_successors(cfg: &Cfg, n: NodeIndex) -> Vec<NodeIndex> {
    if let Terminator::Branch { cond, .. } = &cfg[n].terminator {
        if let Some(truth) = folded_truth(cond) {
            let kept = if truth { EdgeType::TrueBranch } else { EdgeType::FalseBranch };
            return cfg
                .edges_directed(n, Direction::Outgoing)
                .filter(|e| *e.weight() == kept)
                .map(|e| e.target())
                .collect();
        }
    }
    cfg.neighbors_directed(n, Direction::Outgoing).collect()
}

/// Reachability from `from`, pruning the infeasible edge out of any branch
/// whose condition folds to a known truth value. Shared with
/// `dataflow::return_path`, which needs the same feasible-path notion of
/// "reachable" to decide which fall-through predecessors of `exit` count.
pub fn reachable_with_folding(cfg: &Cfg, from: NodeIndex) -> HashSet<NodeIndex> {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        for succ in feasible_successors(cfg, n) {
            stack.push(succ);
        }
    }
    seen
}

/// Reports one `Unreachable` diagnostic per block with statements that no
/// feasible path from `entry` reaches, at the block's first statement.
pub fn check(cfg: &Cfg) -> Vec<Diagnostic> {
    let Some(entry) = find_entry(cfg) else {
        return Vec::new();
    };
    let reachable = reachable_with_folding(cfg, entry);

    let mut diagnostics: Vec<Diagnostic> = cfg
        .node_indices()
        .filter(|n| !reachable.contains(n) && !cfg[*n].statements.is_empty())
        .map(|n| {
            let loc = cfg[n].statements[0].loc();
            Diagnostic::new(DiagnosticKind::Unreachable, loc, "this code can never be reached")
        })
        .collect();
    diagnostics.sort();
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::builder::build;
    use crate::parser::parse;

    fn check_source(src: &str) -> Vec<Diagnostic> {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
        let f = &out.program.functions[0];
        let cfg = build(f, &out.symbols[&f.name]).unwrap();
        check(&cfg)
    }

    #[test]
    fn code_after_return_is_reported() {
        let diags = check_source("int main() { return 1; int x = 5; return x; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Unreachable);
    }

    #[test]
    fn constant_false_branch_is_pruned_even_though_graph_reachable() {
        let diags = check_source("int main() { if (false) { print(1); } return 0; }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn constant_true_branch_keeps_the_else_unreachable() {
        let diags = check_source("int main() { if (true) { print(1); } else { print(2); } return 0; }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn while_true_has_no_unreachable_body() {
        let diags = check_source("int main() { while (true) { return 0; } }");
        assert!(diags.is_empty());
    }

    #[test]
    fn straight_line_code_is_clean() {
        assert!(check_source("int main() { int x = 1; return x; }").is_empty());
    }
}
