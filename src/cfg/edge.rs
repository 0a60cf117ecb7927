//! Edge type classification for CFG edges.

use serde::{Deserialize, Serialize};

/// Type of control-flow edge between basic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Conditional branch taken (true).
    TrueBranch,
    /// Conditional branch not taken (false).
    FalseBranch,
    /// Sequential fallthrough.
    Fallthrough,
    /// `while` condition re-check, back to the loop header.
    LoopBack,
    /// `return` statement, straight to the function's exit block.
    Return,
}

impl EdgeType {
    /// Color used when rendering a CFG for debugging.
    pub fn dot_color(&self) -> &'static str {
        match self {
            EdgeType::TrueBranch => "green",
            EdgeType::FalseBranch => "red",
            EdgeType::Fallthrough => "black",
            EdgeType::LoopBack => "blue",
            EdgeType::Return => "darkgray",
        }
    }

    pub fn dot_label(&self) -> &'static str {
        match self {
            EdgeType::TrueBranch => "T",
            EdgeType::FalseBranch => "F",
            EdgeType::Fallthrough => "",
            EdgeType::LoopBack => "loop",
            EdgeType::Return => "ret",
        }
    }
}
