//! Constant expression folding (SPEC §4.6).
//!
//! A small support pass, not itself a [`super::Analysis`] over the CFG: it
//! only ever looks at a single `Expr` at a time. Used by `cfg::builder`'s
//! callers to fold conditions for the constant-condition note, and by the
//! zero/non-zero analysis to decide whether a division's divisor is a
//! statically-known constant.
//!
//! Values are folded in the literal's native `i64` so overflow past MiniC's
//! 32-bit `int` can be detected before truncation, per the resolved Open
//! Question in DESIGN.md: overflow is reported unconditionally, even on
//! paths a more precise analysis might prove dead.

use crate::ast::{BinaryOp, Expr, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldResult {
    Value(ConstValue),
    /// The expression is constant but its value falls outside `i32`.
    Overflow,
    /// The expression is a constant division/modulo by zero.
    DivisionByZero,
    /// The expression depends on something not known at analysis time.
    NotConstant,
}

pub fn fold(expr: &Expr) -> FoldResult {
    match expr {
        Expr::IntLit { value, .. } => checked_int(*value),
        Expr::BoolLit { value, .. } => FoldResult::Value(ConstValue::Bool(*value)),
        Expr::Var { .. } | Expr::Call { .. } => FoldResult::NotConstant,
        Expr::Unary { op, operand, .. } => fold_unary(*op, fold(operand)),
        Expr::Binary { op, lhs, rhs, .. } => {
            // Short-circuit: a constant-false lhs of `&&` (or constant-true lhs
            // of `||`) decides the whole expression even if rhs isn't constant.
            if *op == BinaryOp::And {
                if let FoldResult::Value(ConstValue::Bool(false)) = fold(lhs) {
                    return FoldResult::Value(ConstValue::Bool(false));
                }
            }
            if *op == BinaryOp::Or {
                if let FoldResult::Value(ConstValue::Bool(true)) = fold(lhs) {
                    return FoldResult::Value(ConstValue::Bool(true));
                }
            }
            fold_binary(*op, fold(lhs), fold(rhs))
        }
    }
}

fn checked_int(value: i64) -> FoldResult {
    if value < i32::MIN as i64 || value > i32::MAX as i64 {
        FoldResult::Overflow
    } else {
        FoldResult::Value(ConstValue::Int(value))
    }
}

fn fold_unary(op: UnaryOp, operand: FoldResult) -> FoldResult {
    match (op, operand) {
        (_, FoldResult::Overflow) => FoldResult::Overflow,
        (_, FoldResult::DivisionByZero) => FoldResult::DivisionByZero,
        (UnaryOp::Neg, FoldResult::Value(ConstValue::Int(v))) => checked_int(-v),
        (UnaryOp::Not, FoldResult::Value(ConstValue::Bool(b))) => FoldResult::Value(ConstValue::Bool(!b)),
        _ => FoldResult::NotConstant,
    }
}

fn fold_binary(op: BinaryOp, lhs: FoldResult, rhs: FoldResult) -> FoldResult {
    if matches!(lhs, FoldResult::Overflow) || matches!(rhs, FoldResult::Overflow) {
        return FoldResult::Overflow;
    }
    if matches!(lhs, FoldResult::DivisionByZero) || matches!(rhs, FoldResult::DivisionByZero) {
        return FoldResult::DivisionByZero;
    }
    let (FoldResult::Value(lv), FoldResult::Value(rv)) = (lhs, rhs) else {
        return FoldResult::NotConstant;
    };

    use BinaryOp::*;
    use ConstValue::*;
    match (op, lv, rv) {
        (Add, Int(a), Int(b)) => checked_int(a + b),
        (Sub, Int(a), Int(b)) => checked_int(a - b),
        (Mul, Int(a), Int(b)) => checked_int(a * b),
        (Div, Int(a), Int(b)) => {
            if b == 0 {
                FoldResult::DivisionByZero
            } else {
                checked_int(a / b)
            }
        }
        (Mod, Int(a), Int(b)) => {
            if b == 0 {
                FoldResult::DivisionByZero
            } else {
                checked_int(a % b)
            }
        }
        (Lt, Int(a), Int(b)) => FoldResult::Value(Bool(a < b)),
        (Le, Int(a), Int(b)) => FoldResult::Value(Bool(a <= b)),
        (Gt, Int(a), Int(b)) => FoldResult::Value(Bool(a > b)),
        (Ge, Int(a), Int(b)) => FoldResult::Value(Bool(a >= b)),
        (Eq, Int(a), Int(b)) => FoldResult::Value(Bool(a == b)),
        (Ne, Int(a), Int(b)) => FoldResult::Value(Bool(a != b)),
        (Eq, Bool(a), Bool(b)) => FoldResult::Value(Bool(a == b)),
        (Ne, Bool(a), Bool(b)) => FoldResult::Value(Bool(a != b)),
        (And, Bool(a), Bool(b)) => FoldResult::Value(Bool(a && b)),
        (Or, Bool(a), Bool(b)) => FoldResult::Value(Bool(a || b)),
        _ => FoldResult::NotConstant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;

    fn int(value: i64) -> Expr {
        Expr::IntLit { value, loc: Location::new(1, 1) }
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), loc: Location::new(1, 1) }
    }

    #[test]
    fn folds_arithmetic() {
        assert_eq!(fold(&binary(BinaryOp::Add, int(2), int(3))), FoldResult::Value(ConstValue::Int(5)));
    }

    #[test]
    fn detects_overflow_past_i32() {
        let expr = binary(BinaryOp::Add, int(i32::MAX as i64), int(1));
        assert_eq!(fold(&expr), FoldResult::Overflow);
    }

    #[test]
    fn detects_constant_division_by_zero() {
        let expr = binary(BinaryOp::Div, int(10), int(0));
        assert_eq!(fold(&expr), FoldResult::DivisionByZero);
    }

    #[test]
    fn short_circuits_and_on_false_lhs() {
        let lhs = Expr::BoolLit { value: false, loc: Location::new(1, 1) };
        let rhs = Expr::Var { symbol: 0, name: "unbound".into(), loc: Location::new(1, 1) };
        let expr = Expr::Binary { op: BinaryOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), loc: Location::new(1, 1) };
        assert_eq!(fold(&expr), FoldResult::Value(ConstValue::Bool(false)));
    }

    #[test]
    fn variable_is_not_constant() {
        let expr = Expr::Var { symbol: 0, name: "x".into(), loc: Location::new(1, 1) };
        assert_eq!(fold(&expr), FoldResult::NotConstant);
    }
}
