//! Structural queries over a built CFG: entry/exit lookup, degree counts.

use crate::cfg::{Cfg, Terminator};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// The synthetic entry block is always node 0.
pub fn find_entry(cfg: &Cfg) -> Option<NodeIndex> {
    cfg.node_indices().next()
}

/// The synthetic exit block: the unique node whose terminator is `Exit`.
pub fn find_exit(cfg: &Cfg) -> Option<NodeIndex> {
    cfg.node_indices().find(|&idx| matches!(cfg[idx].terminator, Terminator::Exit))
}

pub fn in_degree(cfg: &Cfg, block: NodeIndex) -> usize {
    cfg.neighbors_directed(block, Direction::Incoming).count()
}

pub fn out_degree(cfg: &Cfg, block: NodeIndex) -> usize {
    cfg.neighbors_directed(block, Direction::Outgoing).count()
}

pub fn is_merge_point(cfg: &Cfg, block: NodeIndex) -> bool {
    in_degree(cfg, block) > 1
}

pub fn is_branch_point(cfg: &Cfg, block: NodeIndex) -> bool {
    out_degree(cfg, block) > 1
}

/// Predecessors of a block, in the order petgraph returns them (edge insertion order, reversed).
pub fn predecessors(cfg: &Cfg, block: NodeIndex) -> Vec<NodeIndex> {
    cfg.neighbors_directed(block, Direction::Incoming).collect()
}

/// Edge kinds on the in-edges of a block, alongside the predecessor they come from.
pub fn incoming_edges(cfg: &Cfg, block: NodeIndex) -> Vec<(NodeIndex, crate::cfg::EdgeType)> {
    cfg.edges_directed(block, Direction::Incoming)
        .map(|e| (e.source(), *e.weight()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::builder::build;
    use crate::parser::parse;

    fn build_one(src: &str) -> Cfg {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
        let f = &out.program.functions[0];
        build(f, &out.symbols[&f.name]).unwrap()
    }

    #[test]
    fn entry_is_node_zero_exit_is_unique() {
        let cfg = build_one("int main() { return 1; }");
        let entry = find_entry(&cfg).unwrap();
        assert_eq!(entry.index(), 0);
        let exit = find_exit(&cfg).unwrap();
        assert!(matches!(cfg[exit].terminator, Terminator::Exit));
    }

    #[test]
    fn branch_block_has_two_out_edges() {
        let cfg = build_one("int main() { if (true) { return 1; } else { return 2; } }");
        let entry = find_entry(&cfg).unwrap();
        // entry falls through into the block holding the `if`.
        let after_entry = cfg.neighbors_directed(entry, Direction::Outgoing).next().unwrap();
        assert!(is_branch_point(&cfg, after_entry) || out_degree(&cfg, after_entry) == 2);
    }

    #[test]
    fn exit_is_merge_point_with_multiple_returns() {
        let cfg = build_one("int main() { if (true) { return 1; } else { return 2; } }");
        let exit = find_exit(&cfg).unwrap();
        assert!(is_merge_point(&cfg, exit));
    }
}
