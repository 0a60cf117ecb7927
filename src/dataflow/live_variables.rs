//! Live variables / dead stores (SPEC §4.7).
//!
//! Backward "may" analysis: a symbol is live before a point if some path
//! from there reads it before it is next overwritten. A store (an
//! initialized `VarDecl` or an `Assign`) whose target isn't live immediately
//! afterward is reported as `DeadStore`. Per the resolved Open Question in
//! DESIGN.md, a parameter that is never read anywhere in the function is
//! flagged the same way, at its declaration site.

use crate::ast::{Function, SymbolId};
use crate::cfg::{Cfg, StmtUnit, Terminator};
use crate::dataflow::{solve, Analysis, Direction, Lattice};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::symbols::SymbolTable;
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSet(pub BTreeSet<SymbolId>);

impl Lattice for LiveSet {
    fn bottom() -> Self {
        LiveSet(BTreeSet::new())
    }

    fn join(&self, other: &Self) -> Self {
        LiveSet(self.0.union(&other.0).copied().collect())
    }
}

struct LiveVariables;

impl Analysis for LiveVariables {
    type Fact = LiveSet;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    fn transfer(&self, block: NodeIndex, cfg: &Cfg, fact: &Self::Fact) -> Self::Fact {
        let mut live = fact.0.clone();
        terminator_uses(&cfg[block].terminator, &mut live);
        for stmt in cfg[block].statements.iter().rev() {
            kill_and_use(stmt, &mut live);
        }
        LiveSet(live)
    }
}

fn terminator_uses(terminator: &Terminator, live: &mut BTreeSet<SymbolId>) {
    match terminator {
        Terminator::Branch { cond, .. } => live.extend(cond.uses()),
        Terminator::Return { value: Some(v), .. } => live.extend(v.uses()),
        Terminator::Return { value: None, .. } | Terminator::Goto { .. } | Terminator::Exit => {}
    }
}

fn kill_and_use(stmt: &StmtUnit, live: &mut BTreeSet<SymbolId>) {
    match stmt {
        StmtUnit::VarDecl { symbol, init: Some(e), .. } => {
            live.remove(symbol);
            live.extend(e.uses());
        }
        StmtUnit::VarDecl { init: None, .. } => {}
        StmtUnit::Assign { symbol, value, .. } => {
            live.remove(symbol);
            live.extend(value.uses());
        }
        StmtUnit::Print { value, .. } => live.extend(value.uses()),
    }
}

pub fn check(cfg: &Cfg, entry: NodeIndex, exit: NodeIndex, symbols: &SymbolTable, function: &Function) -> Vec<Diagnostic> {
    let solution = solve(&LiveVariables, cfg, entry, exit);

    let mut diagnostics = Vec::new();

    let live_at_entry = solution.out_fact(entry).0.clone();
    for param in &function.params {
        if !live_at_entry.contains(&param.symbol) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DeadStore,
                param.loc,
                format!("parameter '{}' is never read", param.name),
            ));
        }
    }

    let reachable = crate::cfg::reachability::find_reachable(cfg, entry);
    for block in reachable {
        let mut live = solution.out_fact(block).0.clone();
        terminator_uses(&cfg[block].terminator, &mut live);
        for stmt in cfg[block].statements.iter().rev() {
            let (target, loc) = match stmt {
                StmtUnit::VarDecl { symbol, init: Some(_), loc, .. } => (Some(*symbol), *loc),
                StmtUnit::Assign { symbol, loc, .. } => (Some(*symbol), *loc),
                StmtUnit::VarDecl { init: None, .. } | StmtUnit::Print { .. } => (None, stmt.loc()),
            };
            if let Some(symbol) = target {
                if !live.contains(&symbol) {
                    if let Some(sym) = symbols.get(symbol) {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::DeadStore,
                            loc,
                            format!("value stored in '{}' is never read", sym.name),
                        ));
                    }
                }
            }
            kill_and_use(stmt, &mut live);
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
        check(&cfg, entry, exit, &out.symbols[&f.name], f)
    }

    #[test]
    fn used_value_is_not_a_dead_store() {
        assert!(check_source("int main() { int x = 1; return x; }").is_empty());
    }

    #[test]
    fn overwritten_before_use_is_a_dead_store() {
        let diags = check_source("int main() { int x = 1; x = 2; return x; }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::DeadStore);
    }

    #[test]
    fn unused_parameter_is_flagged() {
        let diags = check_source("int f(int a) { return 0; }");
        assert!(diags.iter().any(|d| d.message.contains('a')));
    }

    #[test]
    fn store_read_only_on_one_branch_is_still_live() {
        let diags = check_source("int main() { int x = 1; if (true) { print(x); } return 0; }");
        assert!(diags.is_empty());
    }
}
