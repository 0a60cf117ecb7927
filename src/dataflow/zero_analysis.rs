//! Path-sensitive zero/non-zero analysis (SPEC §4.8).
//!
//! Forward analysis tracking, per `int` symbol, whether its value is known
//! to be zero, known to be nonzero, both (`MaybeZero`, the join of the two),
//! or not yet known (`Bottom`). Branches on a direct comparison against the
//! literal `0` refine the fact differently along the `TrueBranch` and
//! `FalseBranch` edges — e.g. after `if (x != 0)`, `x` is `NonZero` inside
//! the `then` block and `Zero` inside the `else` block. This is what lets a
//! division guarded by such a check avoid a `PossibleDivisionByZero` warning.
//!
//! Also reports `ConstantOverflow` (SPEC §4.6): the same constant folding
//! used to sharpen zero/non-zero facts for literal operands also detects
//! when a fully-constant expression's value falls outside `i32`.

use crate::ast::{BinaryOp, Expr, SymbolId, Type, UnaryOp};
use crate::cfg::{reachability, Cfg, EdgeType, StmtUnit, Terminator};
use crate::dataflow::constant_fold::{self, ConstValue, FoldResult};
use crate::dataflow::{solve, Analysis, Direction, Lattice};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroState {
    Bottom,
    Zero,
    NonZero,
    MaybeZero,
}

impl ZeroState {
    fn join(self, other: Self) -> Self {
        use ZeroState::*;
        match (self, other) {
            (Bottom, x) | (x, Bottom) => x,
            (a, b) if a == b => a,
            _ => MaybeZero,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZeroFact(pub HashMap<SymbolId, ZeroState>);

impl Lattice for ZeroFact {
    fn bottom() -> Self {
        ZeroFact(HashMap::new())
    }

    fn join(&self, other: &Self) -> Self {
        let mut out = self.0.clone();
        for (&symbol, &state) in &other.0 {
            out.entry(symbol).and_modify(|cur| *cur = cur.join(state)).or_insert(state);
        }
        ZeroFact(out)
    }
}

/// Evaluates `expr`'s zero/non-zero state given what's currently known.
/// Constant-folds first so literal arithmetic is precise; falls back to a
/// handful of sign-preserving rules (negation, multiplication by a known
/// zero) for everything else.
fn eval(expr: &Expr, state: &HashMap<SymbolId, ZeroState>) -> ZeroState {
    match constant_fold::fold(expr) {
        FoldResult::Value(ConstValue::Int(v)) => {
            if v == 0 {
                ZeroState::Zero
            } else {
                ZeroState::NonZero
            }
        }
        FoldResult::Value(ConstValue::Bool(_)) | FoldResult::Overflow | FoldResult::DivisionByZero => ZeroState::MaybeZero,
        FoldResult::NotConstant => match expr {
            Expr::Var { symbol, .. } => state.get(symbol).copied().unwrap_or(ZeroState::MaybeZero),
            Expr::Unary { op: UnaryOp::Neg, operand, .. } => eval(operand, state),
            Expr::Binary { op: BinaryOp::Mul, lhs, rhs, .. } => {
                let l = eval(lhs, state);
                let r = eval(rhs, state);
                if l == ZeroState::Zero || r == ZeroState::Zero {
                    ZeroState::Zero
                } else {
                    ZeroState::MaybeZero
                }
            }
            _ => ZeroState::MaybeZero,
        },
    }
}

/// A `Var` compared directly against the literal `0`, in either order.
fn var_vs_zero(a: &Expr, b: &Expr) -> Option<SymbolId> {
    match (a, b) {
        (Expr::Var { symbol, .. }, Expr::IntLit { value: 0, .. }) => Some(*symbol),
        _ => None,
    }
}

fn narrow(cond: &Expr, taken: bool, map: &mut HashMap<SymbolId, ZeroState>) {
    match cond {
        // A bare `int` used as a condition (`if (x)`, `while (x)`): true
        // means nonzero, false means zero.
        Expr::Var { symbol, .. } => {
            map.insert(*symbol, if taken { ZeroState::NonZero } else { ZeroState::Zero });
        }
        Expr::Unary { op: UnaryOp::Not, operand, .. } => narrow(operand, !taken, map),
        Expr::Binary { op, lhs, rhs, .. } if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
            let Some(symbol) = var_vs_zero(lhs, rhs).or_else(|| var_vs_zero(rhs, lhs)) else {
                return;
            };
            let equals_zero_on_true = *op == BinaryOp::Eq;
            let state = if taken == equals_zero_on_true { ZeroState::Zero } else { ZeroState::NonZero };
            map.insert(symbol, state);
        }
        // Short-circuit semantics: `a && b`'s true edge only happens when
        // both operands are true, so both narrow; its false edge could come
        // from either operand alone, so neither narrows. `a || b` is the
        // mirror image.
        Expr::Binary { op: BinaryOp::And, lhs, rhs, .. } if taken => {
            narrow(lhs, true, map);
            narrow(rhs, true, map);
        }
        Expr::Binary { op: BinaryOp::Or, lhs, rhs, .. } if !taken => {
            narrow(lhs, false, map);
            narrow(rhs, false, map);
        }
        _ => {}
    }
}

struct ZeroAnalysis;

impl Analysis for ZeroAnalysis {
    type Fact = ZeroFact;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    fn transfer(&self, block: NodeIndex, cfg: &Cfg, fact: &Self::Fact) -> Self::Fact {
        let mut map = fact.0.clone();
        for stmt in &cfg[block].statements {
            match stmt {
                // An uninitialized declaration leaves its symbol absent from
                // the map (spec.md §4.8: "uninitialized ... variables are
                // absent, not UNKNOWN") rather than inserting `MaybeZero` —
                // a never-assigned divisor is a `UseBeforeDef` (§4.5), not a
                // `PossibleDivisionByZero`, so the zero analysis stays silent.
                StmtUnit::VarDecl { symbol, ty, init: Some(e), .. } => {
                    if *ty == Type::Int {
                        map.insert(*symbol, eval(e, &map));
                    }
                }
                StmtUnit::VarDecl { init: None, .. } => {}
                StmtUnit::Assign { symbol, value, .. } => {
                    map.insert(*symbol, eval(value, &map));
                }
                StmtUnit::Print { .. } => {}
            }
        }
        ZeroFact(map)
    }

    fn edge_transfer(&self, source: NodeIndex, cfg: &Cfg, edge: EdgeType, fact: &Self::Fact) -> Self::Fact {
        let mut map = fact.0.clone();
        if let Terminator::Branch { cond, .. } = &cfg[source].terminator {
            match edge {
                EdgeType::TrueBranch => narrow(cond, true, &mut map),
                EdgeType::FalseBranch => narrow(cond, false, &mut map),
                _ => {}
            }
        }
        ZeroFact(map)
    }
}

fn check_root(expr: &Expr, map: &HashMap<SymbolId, ZeroState>, diagnostics: &mut Vec<Diagnostic>) {
    if let FoldResult::Overflow = constant_fold::fold(expr) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::ConstantOverflow,
            expr.loc(),
            "constant expression does not fit in a 32-bit int".to_string(),
        ));
    }
    scan_divisions(expr, map, diagnostics);
}

fn scan_divisions(expr: &Expr, map: &HashMap<SymbolId, ZeroState>, diagnostics: &mut Vec<Diagnostic>) {
    match expr {
        Expr::IntLit { .. } | Expr::BoolLit { .. } | Expr::Var { .. } => {}
        Expr::Unary { operand, .. } => scan_divisions(operand, map, diagnostics),
        Expr::Call { args, .. } => {
            for arg in args {
                scan_divisions(arg, map, diagnostics);
            }
        }
        Expr::Binary { op, lhs, rhs, loc } => {
            scan_divisions(lhs, map, diagnostics);
            scan_divisions(rhs, map, diagnostics);
            if matches!(op, BinaryOp::Div | BinaryOp::Mod) {
                match eval(rhs, map) {
                    ZeroState::Zero => diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DivisionByZero,
                        *loc,
                        "divisor is always zero on this path".to_string(),
                    )),
                    ZeroState::NonZero => {}
                    ZeroState::MaybeZero | ZeroState::Bottom => diagnostics.push(Diagnostic::new(
                        DiagnosticKind::PossibleDivisionByZero,
                        *loc,
                        "divisor may be zero on this path".to_string(),
                    )),
                }
            }
        }
    }
}

pub fn check(cfg: &Cfg, entry: NodeIndex, exit: NodeIndex) -> Vec<Diagnostic> {
    let solution = solve(&ZeroAnalysis, cfg, entry, exit);
    let mut diagnostics = Vec::new();

    for block in reachability::find_reachable(cfg, entry) {
        let mut map = solution.in_fact(block).0.clone();
        for stmt in &cfg[block].statements {
            match stmt {
                StmtUnit::VarDecl { symbol, ty, init: Some(e), .. } => {
                    check_root(e, &map, &mut diagnostics);
                    if *ty == Type::Int {
                        map.insert(*symbol, eval(e, &map));
                    }
                }
                StmtUnit::VarDecl { init: None, .. } => {}
                StmtUnit::Assign { symbol, value, .. } => {
                    check_root(value, &map, &mut diagnostics);
                    map.insert(*symbol, eval(value, &map));
                }
                StmtUnit::Print { value, .. } => check_root(value, &map, &mut diagnostics),
            }
        }
        match &cfg[block].terminator {
            Terminator::Branch { cond, .. } => check_root(cond, &map, &mut diagnostics),
            Terminator::Return { value: Some(v), .. } => check_root(v, &map, &mut diagnostics),
            Terminator::Return { value: None, .. } | Terminator::Goto { .. } | Terminator::Exit => {}
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
        check(&cfg, entry, exit)
    }

    #[test]
    fn constant_division_by_zero_is_definite() {
        let diags = check_source("int main() { print(1 / 0); return 0; }");
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn division_by_unguarded_variable_is_possible() {
        let diags = check_source("int main(int x) { print(1 / x); return 0; }");
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::PossibleDivisionByZero));
    }

    #[test]
    fn division_guarded_by_nonzero_check_is_clean() {
        let diags = check_source("int main(int x) { if (x != 0) { print(1 / x); } return 0; }");
        assert!(!diags.iter().any(|d| d.kind == DiagnosticKind::PossibleDivisionByZero || d.kind == DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn division_on_the_zero_branch_is_definite() {
        let diags = check_source("int main(int x) { if (x == 0) { print(1 / x); } return 0; }");
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero));
    }

    #[test]
    fn overflowing_literal_addition_is_flagged() {
        let diags = check_source("int main() { print(2147483647 + 1); return 0; }");
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::ConstantOverflow));
    }

    #[test]
    fn uninitialized_divisor_is_silent_here_since_use_before_def_owns_it() {
        let diags = check_source("int main() { int x; return 10 / x; }");
        assert!(!diags.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero || d.kind == DiagnosticKind::PossibleDivisionByZero));
    }

    #[test]
    fn bare_int_condition_refines_the_true_branch_to_nonzero() {
        let diags = check_source("int main(int x) { if (x) { print(10 / x); } return 0; }");
        assert!(!diags.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero || d.kind == DiagnosticKind::PossibleDivisionByZero));
    }

    #[test]
    fn conjunction_narrows_both_operands_on_the_true_edge() {
        let diags = check_source("int main(int x, int y) { if (x != 0 && y != 0) { print(10 / x); print(10 / y); } return 0; }");
        assert!(!diags.iter().any(|d| d.kind == DiagnosticKind::DivisionByZero || d.kind == DiagnosticKind::PossibleDivisionByZero));
    }
}
