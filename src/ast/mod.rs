//! Typed AST produced by the front end; read-only input to the analysis core.

use serde::{Deserialize, Serialize};

/// A point in the source file (1-indexed), attached to every AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Dense per-function symbol identifier.
pub type SymbolId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Bool,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub symbol: SymbolId,
    pub name: String,
    pub ty: Type,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub body: Block,
    /// Location of the function's opening keyword/name.
    pub loc: Location,
    /// Location of the closing brace, used for `MissingReturn`.
    pub end_loc: Location,
}

pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    VarDecl {
        symbol: SymbolId,
        name: String,
        ty: Type,
        init: Option<Expr>,
        loc: Location,
    },
    Assign {
        symbol: SymbolId,
        name: String,
        value: Expr,
        loc: Location,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        loc: Location,
    },
    While {
        cond: Expr,
        body: Block,
        loc: Location,
    },
    Return {
        value: Option<Expr>,
        loc: Location,
    },
    Print {
        value: Expr,
        loc: Location,
    },
    Block {
        body: Block,
        loc: Location,
    },
}

impl Stmt {
    pub fn loc(&self) -> Location {
        match self {
            Stmt::VarDecl { loc, .. }
            | Stmt::Assign { loc, .. }
            | Stmt::If { loc, .. }
            | Stmt::While { loc, .. }
            | Stmt::Return { loc, .. }
            | Stmt::Print { loc, .. }
            | Stmt::Block { loc, .. } => *loc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Widened beyond i32 so constant folding can observe overflow before truncation.
    IntLit { value: i64, loc: Location },
    BoolLit { value: bool, loc: Location },
    Var { symbol: SymbolId, name: String, loc: Location },
    Unary { op: UnaryOp, operand: Box<Expr>, loc: Location },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, loc: Location },
    Call { callee: String, args: Vec<Expr>, loc: Location },
}

impl Expr {
    pub fn loc(&self) -> Location {
        match self {
            Expr::IntLit { loc, .. }
            | Expr::BoolLit { loc, .. }
            | Expr::Var { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Call { loc, .. } => *loc,
        }
    }

    /// Every symbol referenced by this expression, in evaluation order (with duplicates).
    pub fn uses(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        self.collect_uses(&mut out);
        out
    }

    fn collect_uses(&self, out: &mut Vec<SymbolId>) {
        match self {
            Expr::IntLit { .. } | Expr::BoolLit { .. } => {}
            Expr::Var { symbol, .. } => out.push(*symbol),
            Expr::Unary { operand, .. } => operand.collect_uses(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_uses(out);
                rhs.collect_uses(out);
            }
            Expr::Call { args, .. } => {
                for a in args {
                    a.collect_uses(out);
                }
            }
        }
    }
}
