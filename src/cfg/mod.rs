//! Control-flow graph data structures for MiniC functions.

pub mod analysis;
pub mod builder;
pub mod edge;
pub mod reachability;

pub use analysis::{find_entry, find_exit};
pub use builder::build;
pub use edge::EdgeType;

use crate::ast::{Expr, Location, SymbolId, Type};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

/// Control-flow graph for a single function.
pub type Cfg = DiGraph<BasicBlock, EdgeType>;

pub type BlockId = usize;

/// A single non-branching unit of work inside a basic block.
///
/// Structured statements (`if`, `while`, `return`) never appear here — the
/// builder lowers them into block boundaries and [`Terminator`]s instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtUnit {
    VarDecl {
        symbol: SymbolId,
        ty: Type,
        init: Option<Expr>,
        loc: Location,
    },
    Assign {
        symbol: SymbolId,
        value: Expr,
        loc: Location,
    },
    Print {
        value: Expr,
        loc: Location,
    },
}

impl StmtUnit {
    pub fn loc(&self) -> Location {
        match self {
            StmtUnit::VarDecl { loc, .. } | StmtUnit::Assign { loc, .. } | StmtUnit::Print { loc, .. } => *loc,
        }
    }
}

/// How a basic block hands control to its successors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Terminator {
    /// Unconditional edge to a single successor.
    Goto { target: BlockId },
    /// Two-way branch on a boolean condition.
    Branch {
        cond: Expr,
        then_target: BlockId,
        else_target: BlockId,
    },
    /// `return <value>;`, with an edge straight to the function's exit block.
    Return { value: Option<Expr>, loc: Location },
    /// The synthetic exit block: no successors.
    Exit,
}

/// A basic block: a maximal straight-line run of [`StmtUnit`]s ending in a
/// [`Terminator`]. Every function's CFG has exactly one synthetic entry block
/// (index 0, no statements, `Goto` to the first real block) and exactly one
/// synthetic exit block (`Terminator::Exit`), so return-path completeness and
/// reachability can both be phrased as predecessor/successor queries against
/// a single well-known node instead of scanning for exit-shaped terminators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub statements: Vec<StmtUnit>,
    pub terminator: Terminator,
}

impl BasicBlock {
    pub fn uses(&self) -> Vec<SymbolId> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            match stmt {
                StmtUnit::VarDecl { init: Some(e), .. } => out.extend(e.uses()),
                StmtUnit::VarDecl { init: None, .. } => {}
                StmtUnit::Assign { value, .. } => out.extend(value.uses()),
                StmtUnit::Print { value, .. } => out.extend(value.uses()),
            }
        }
        match &self.terminator {
            Terminator::Branch { cond, .. } => out.extend(cond.uses()),
            Terminator::Return { value: Some(v), .. } => out.extend(v.uses()),
            Terminator::Return { value: None, .. } | Terminator::Goto { .. } | Terminator::Exit => {}
        }
        out
    }
}
