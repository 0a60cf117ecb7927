//! Lowers a parsed, bound [`Function`] into a [`Cfg`].
//!
//! Every function gets exactly one synthetic entry block (graph node 0,
//! empty, `Goto` into the body) and one synthetic exit block (`Terminator::Exit`,
//! no successors). `return` statements add a `Return`-kind edge straight to
//! the exit; falling off the end of a statement list without an explicit
//! `return` adds a `Fallthrough` edge instead. Return-path completeness then
//! reduces to inspecting the exit block's incoming edges (see
//! `dataflow::return_path`), and unreachable code reduces to plain CFG
//! reachability from the entry (see `cfg::reachability`).

use crate::ast::{Block, Expr, Function, Stmt, SymbolId};
use crate::cfg::{BasicBlock, Cfg, EdgeType, StmtUnit, Terminator};
use crate::error::InternalError;
use crate::symbols::SymbolTable;
use petgraph::graph::NodeIndex;

/// Tracks the header and merge block of the innermost enclosing `while`, for
/// lowering nested `break`/`continue` — MiniC has neither, so this currently
/// just documents the hook; kept so a future loop-control extension only
/// touches `lower_block`, not the block-management plumbing below.
#[derive(Clone, Copy)]
#[allow(dead_code)]
struct LoopCtx {
    header: NodeIndex,
    after: NodeIndex,
}

pub fn build(function: &Function, symbols: &SymbolTable) -> Result<Cfg, InternalError> {
    validate(function, symbols)?;

    let mut builder = Builder { graph: Cfg::new() };
    let entry = builder.fresh_block();
    let exit = builder.fresh_block();
    builder.seal(exit, Terminator::Exit, &[]);

    let tail = builder.lower_block(&function.body, entry, exit, None)?;
    builder.seal(tail, Terminator::Goto { target: exit.index() }, &[(exit, EdgeType::Fallthrough)]);

    Ok(builder.graph)
}

struct Builder {
    graph: Cfg,
}

impl Builder {
    fn fresh_block(&mut self) -> NodeIndex {
        self.graph.add_node(BasicBlock {
            id: 0,
            statements: Vec::new(),
            terminator: Terminator::Exit,
        })
    }

    fn seal(&mut self, block: NodeIndex, terminator: Terminator, edges: &[(NodeIndex, EdgeType)]) {
        self.graph[block].id = block.index();
        self.graph[block].terminator = terminator;
        for &(target, kind) in edges {
            self.graph.add_edge(block, target, kind);
        }
    }

    fn push(&mut self, block: NodeIndex, unit: StmtUnit) {
        self.graph[block].statements.push(unit);
    }

    /// Lowers `stmts` starting at `current`. Returns the still-unsealed block
    /// where control falls out the end of the list; the caller seals it
    /// according to its own context (function exit, if-join, loop header).
    fn lower_block(
        &mut self,
        stmts: &Block,
        mut current: NodeIndex,
        exit: NodeIndex,
        loop_ctx: Option<LoopCtx>,
    ) -> Result<NodeIndex, InternalError> {
        for stmt in stmts {
            current = self.lower_stmt(stmt, current, exit, loop_ctx)?;
        }
        Ok(current)
    }

    fn lower_stmt(
        &mut self,
        stmt: &Stmt,
        current: NodeIndex,
        exit: NodeIndex,
        loop_ctx: Option<LoopCtx>,
    ) -> Result<NodeIndex, InternalError> {
        match stmt {
            Stmt::VarDecl { symbol, ty, init, loc } => {
                self.push(
                    current,
                    StmtUnit::VarDecl {
                        symbol: *symbol,
                        ty: *ty,
                        init: init.clone(),
                        loc: *loc,
                    },
                );
                Ok(current)
            }
            Stmt::Assign { symbol, value, loc, .. } => {
                self.push(
                    current,
                    StmtUnit::Assign {
                        symbol: *symbol,
                        value: value.clone(),
                        loc: *loc,
                    },
                );
                Ok(current)
            }
            Stmt::Print { value, loc } => {
                self.push(current, StmtUnit::Print { value: value.clone(), loc: *loc });
                Ok(current)
            }
            Stmt::Block { body, .. } => self.lower_block(body, current, exit, loop_ctx),
            Stmt::If { cond, then_block, else_block, .. } => {
                let then_entry = self.fresh_block();
                let else_entry = self.fresh_block();
                let join = self.fresh_block();

                self.seal(
                    current,
                    Terminator::Branch {
                        cond: cond.clone(),
                        then_target: then_entry.index(),
                        else_target: else_entry.index(),
                    },
                    &[(then_entry, EdgeType::TrueBranch), (else_entry, EdgeType::FalseBranch)],
                );

                let then_tail = self.lower_block(then_block, then_entry, exit, loop_ctx)?;
                self.seal(then_tail, Terminator::Goto { target: join.index() }, &[(join, EdgeType::Fallthrough)]);

                let else_tail = match else_block {
                    Some(eb) => self.lower_block(eb, else_entry, exit, loop_ctx)?,
                    None => else_entry,
                };
                self.seal(else_tail, Terminator::Goto { target: join.index() }, &[(join, EdgeType::Fallthrough)]);

                Ok(join)
            }
            Stmt::While { cond, body, .. } => {
                let header = self.fresh_block();
                self.seal(current, Terminator::Goto { target: header.index() }, &[(header, EdgeType::Fallthrough)]);

                let body_entry = self.fresh_block();
                let after = self.fresh_block();
                self.seal(
                    header,
                    Terminator::Branch {
                        cond: cond.clone(),
                        then_target: body_entry.index(),
                        else_target: after.index(),
                    },
                    &[(body_entry, EdgeType::TrueBranch), (after, EdgeType::FalseBranch)],
                );

                let body_tail = self.lower_block(body, body_entry, exit, Some(LoopCtx { header, after }))?;
                self.seal(body_tail, Terminator::Goto { target: header.index() }, &[(header, EdgeType::LoopBack)]);

                Ok(after)
            }
            Stmt::Return { value, loc } => {
                self.seal(
                    current,
                    Terminator::Return { value: value.clone(), loc: *loc },
                    &[(exit, EdgeType::Return)],
                );
                // Anything lexically following this statement lowers into a
                // fresh block with no predecessor: unreachable by construction.
                Ok(self.fresh_block())
            }
        }
    }
}

/// Every `SymbolId` reaching the builder must already be resolved by the
/// parser's binder. A poisoned id here is a front-end/pipeline bug, not a
/// property of the analyzed program.
fn validate(function: &Function, symbols: &SymbolTable) -> Result<(), InternalError> {
    fn check(id: SymbolId, symbols: &SymbolTable, function: &str) -> Result<(), InternalError> {
        if symbols.get(id).is_none() {
            return Err(InternalError::MalformedCfg {
                function: function.to_string(),
                message: format!("unresolved symbol id {} reached the CFG builder", id),
            });
        }
        Ok(())
    }

    fn walk_expr(expr: &Expr, symbols: &SymbolTable, function: &str) -> Result<(), InternalError> {
        for id in expr.uses() {
            check(id, symbols, function)?;
        }
        Ok(())
    }

    fn walk_block(block: &Block, symbols: &SymbolTable, function: &str) -> Result<(), InternalError> {
        for stmt in block {
            match stmt {
                Stmt::VarDecl { symbol, init, .. } => {
                    check(*symbol, symbols, function)?;
                    if let Some(e) = init {
                        walk_expr(e, symbols, function)?;
                    }
                }
                Stmt::Assign { symbol, value, .. } => {
                    check(*symbol, symbols, function)?;
                    walk_expr(value, symbols, function)?;
                }
                Stmt::If { cond, then_block, else_block, .. } => {
                    walk_expr(cond, symbols, function)?;
                    walk_block(then_block, symbols, function)?;
                    if let Some(eb) = else_block {
                        walk_block(eb, symbols, function)?;
                    }
                }
                Stmt::While { cond, body, .. } => {
                    walk_expr(cond, symbols, function)?;
                    walk_block(body, symbols, function)?;
                }
                Stmt::Return { value: Some(e), .. } => walk_expr(e, symbols, function)?,
                Stmt::Return { value: None, .. } => {}
                Stmt::Print { value, .. } => walk_expr(value, symbols, function)?,
                Stmt::Block { body, .. } => walk_block(body, symbols, function)?,
            }
        }
        Ok(())
    }

    walk_block(&function.body, symbols, &function.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{find_entry, find_exit};
    use crate::parser::parse;

    fn build_one(src: &str) -> Cfg {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
        let f = &out.program.functions[0];
        build(f, &out.symbols[&f.name]).unwrap()
    }

    #[test]
    fn straight_line_function_has_single_block_chain() {
        let cfg = build_one("int main() { int x = 1; x = x + 1; return x; }");
        assert!(find_entry(&cfg).is_some());
        assert!(find_exit(&cfg).is_some());
        assert_eq!(cfg.node_count(), 3); // entry, body, exit
    }

    #[test]
    fn if_else_both_branches_reach_exit() {
        // Three in-edges to `exit`: the `Return` edge from each branch, plus
        // the `join` block's unconditional `Fallthrough` edge `build` always
        // seals regardless of whether every branch already returned. `join`
        // itself has no predecessor here (both branch tails are orphaned by
        // their own `return`), so it never shows up as reachable — see
        // `dataflow::return_path`, which is what actually cares whether a
        // fall-through predecessor of `exit` is reachable.
        let cfg = build_one("int main() { if (true) { return 1; } else { return 2; } }");
        let exit = find_exit(&cfg).unwrap();
        assert_eq!(cfg.edges_directed(exit, petgraph::Direction::Incoming).count(), 3);
    }

    #[test]
    fn code_after_return_is_orphaned() {
        let cfg = build_one("int main() { return 1; print(1); }");
        let entry = find_entry(&cfg).unwrap();
        let reachable = crate::cfg::reachability::find_reachable(&cfg, entry);
        let orphan = cfg.node_indices().find(|&n| !cfg[n].statements.is_empty() && !reachable.contains(&n));
        assert!(orphan.is_some());
    }

    #[test]
    fn while_loop_has_back_edge() {
        let cfg = build_one("int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }");
        let has_loop_back = cfg.edge_weights().any(|e| matches!(e, EdgeType::LoopBack));
        assert!(has_loop_back);
    }
}
