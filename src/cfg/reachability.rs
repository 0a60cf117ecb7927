//! Plain graph reachability over a built CFG.
//!
//! This is the primitive the dataflow engine bounds its worklist to (see
//! [`crate::dataflow::solve`]) — no constant folding here, since folding
//! could prune a block a "must"/"may" analysis still needs to see. The
//! `Unreachable` diagnostic itself is [`crate::dataflow::reachability::check`],
//! which composes this with constant-condition folding.

use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;
use std::collections::HashSet;

/// All blocks reachable from `from`, `from` included.
pub fn find_reachable(cfg: &crate::cfg::Cfg, from: NodeIndex) -> HashSet<NodeIndex> {
    let mut dfs = Dfs::new(cfg, from);
    let mut reachable = HashSet::new();
    while let Some(node) = dfs.next(cfg) {
        reachable.insert(node);
    }
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::builder::build;
    use crate::cfg::Cfg;
    use crate::parser::parse;

    fn build_one(src: &str) -> Cfg {
        let out = parse(src).unwrap();
        assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics.as_slice());
        let f = &out.program.functions[0];
        build(f, &out.symbols[&f.name]).unwrap()
    }

    #[test]
    fn entry_reaches_every_block_in_straight_line_code() {
        let cfg = build_one("int main() { int x = 1; return x; }");
        let entry = crate::cfg::find_entry(&cfg).unwrap();
        assert_eq!(find_reachable(&cfg, entry).len(), cfg.node_count());
    }

    #[test]
    fn code_after_return_is_not_reachable_from_entry() {
        let cfg = build_one("int main() { return 1; print(1); }");
        let entry = crate::cfg::find_entry(&cfg).unwrap();
        let reachable = find_reachable(&cfg, entry);
        assert!(reachable.len() < cfg.node_count());
    }

    #[test]
    fn both_if_branches_are_reachable() {
        let cfg = build_one("int main() { if (true) { print(1); } else { print(2); } return 0; }");
        let entry = crate::cfg::find_entry(&cfg).unwrap();
        assert_eq!(find_reachable(&cfg, entry).len(), cfg.node_count());
    }
}
