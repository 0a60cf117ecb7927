//! Definite assignment / use-before-def (SPEC §4.5).
//!
//! Forward "must" analysis: the fact at a block is the set of symbols
//! definitely assigned on every path reaching it. `None` stands for "no path
//! has reached this block yet" (the lattice's true bottom, the identity
//! element for intersection) so the first real predecessor's set isn't
//! needlessly intersected away before a second one arrives.

use crate::ast::SymbolId;
use crate::cfg::{BasicBlock, Cfg, StmtUnit};
use crate::dataflow::{solve, Analysis, Direction, Lattice};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::SymbolTable;
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedSet(pub Option<BTreeSet<SymbolId>>);

impl Lattice for AssignedSet {
    fn bottom() -> Self {
        AssignedSet(None)
    }

    fn join(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (None, x) | (x, None) => AssignedSet(x.clone()),
            (Some(a), Some(b)) => AssignedSet(Some(a.intersection(b).copied().collect())),
        }
    }
}

fn apply_stmt(stmt: &StmtUnit, running: &mut BTreeSet<SymbolId>) {
    match stmt {
        StmtUnit::VarDecl { symbol, init: Some(_), .. } => {
            running.insert(*symbol);
        }
        StmtUnit::VarDecl { init: None, .. } => {}
        StmtUnit::Assign { symbol, .. } => {
            running.insert(*symbol);
        }
        StmtUnit::Print { .. } => {}
    }
}

fn apply_block(block: &BasicBlock, running: &mut BTreeSet<SymbolId>) {
    for stmt in &block.statements {
        apply_stmt(stmt, running);
    }
}

struct DefiniteAssignment {
    params: BTreeSet<SymbolId>,
}

impl Analysis for DefiniteAssignment {
    type Fact = AssignedSet;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn boundary_fact(&self) -> Self::Fact {
        AssignedSet(Some(self.params.clone()))
    }

    fn transfer(&self, block: NodeIndex, cfg: &Cfg, fact: &Self::Fact) -> Self::Fact {
        let mut running = fact.0.clone().unwrap_or_default();
        apply_block(&cfg[block], &mut running);
        AssignedSet(Some(running))
    }
}

/// Runs the analysis and reports `UseBeforeDef` for every read of a symbol
/// not yet definitely assigned on some path reaching it.
pub fn check(cfg: &Cfg, entry: NodeIndex, exit: NodeIndex, symbols: &SymbolTable) -> Vec<Diagnostic> {
    let analysis = DefiniteAssignment { params: symbols.param_ids().into_iter().collect() };
    let solution = solve(&analysis, cfg, entry, exit);

    let mut diagnostics = Vec::new();
    for block in cfg.node_indices() {
        let Some(mut running) = solution.in_fact(block).0.clone() else {
            continue; // unreachable; covered by the Unreachable check instead
        };
        for stmt in &cfg[block].statements {
            let uses = match stmt {
                StmtUnit::VarDecl { init: Some(e), .. } => e.uses(),
                StmtUnit::VarDecl { init: None, .. } => Vec::new(),
                StmtUnit::Assign { value, .. } => value.uses(),
                StmtUnit::Print { value, .. } => value.uses(),
            };
            for used in uses {
                if !running.contains(&used) {
                    if let Some(sym) = symbols.get(used) {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::UseBeforeDef,
                            stmt.loc(),
                            format!("'{}' is read before it is definitely assigned on this path", sym.name),
                        ));
                    }
                }
            }
            apply_stmt(stmt, &mut running);
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::builder::build;
    use crate::cfg::{find_entry, find_exit};
    use crate::parser::parse;

    fn check_source(src: &str) -> Vec<Diagnostic> {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
        let f = &out.program.functions[0];
        let cfg = build(f, &out.symbols[&f.name]).unwrap();
        let entry = find_entry(&cfg).unwrap();
        let exit = find_exit(&cfg).unwrap();
        check(&cfg, entry, exit, &out.symbols[&f.name])
    }

    #[test]
    fn simple_declare_then_use_is_clean() {
        assert!(check_source("int main() { int x = 1; return x; }").is_empty());
    }

    #[test]
    fn use_before_init_is_flagged() {
        let diags = check_source("int main() { int x; return x; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UseBeforeDef);
    }

    #[test]
    fn assigned_on_only_one_branch_is_flagged_after_merge() {
        let diags = check_source("int main() { int x; if (true) { x = 1; } return x; }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn assigned_on_both_branches_is_clean() {
        let diags = check_source("int main() { int x; if (true) { x = 1; } else { x = 2; } return x; }");
        assert!(diags.is_empty());
    }

    #[test]
    fn parameters_are_assigned_at_entry() {
        assert!(check_source("int identity(int a) { return a; }").is_empty());
    }
}
