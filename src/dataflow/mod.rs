//! Generic fixed-point dataflow engine shared by every analysis in the core.
//!
//! An [`Analysis`] only describes its lattice, its direction, and its
//! per-block transfer function; [`solve`] drives the worklist iteration to a
//! fixed point and hands back the facts flowing in and out of every block.
//! Each analysis then does a second, side-effect-free pass over the solved
//! facts to produce [`crate::diagnostics::Diagnostic`]s — `solve` itself
//! never reports anything, so it stays reusable and easy to unit test on its
//! own lattice laws.

pub mod constant_fold;
pub mod definite_assignment;
pub mod live_variables;
pub mod reachability;
pub mod return_path;
pub mod zero_analysis;

use crate::cfg::{reachability, Cfg, EdgeType};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction as PetDirection;
use std::collections::{HashMap, HashSet, VecDeque};

/// A join-semilattice fact. `bottom` must be the identity element for `join`.
pub trait Lattice: Clone + PartialEq {
    fn bottom() -> Self;
    fn join(&self, other: &Self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

pub trait Analysis {
    type Fact: Lattice;

    fn direction(&self) -> Direction;

    /// The fact injected at the analysis's boundary block (entry for a
    /// forward analysis, exit for a backward one), joined in alongside
    /// whatever flows in from predecessors/successors.
    fn boundary_fact(&self) -> Self::Fact {
        Self::Fact::bottom()
    }

    /// Applies this block's effect to the fact flowing in from its
    /// predecessors (forward) or successors (backward).
    fn transfer(&self, block: NodeIndex, cfg: &Cfg, fact: &Self::Fact) -> Self::Fact;

    /// Per-edge refinement, applied to a fact as it crosses an edge of the
    /// given kind, with access to the block the edge leaves (so a branch's
    /// own condition can be inspected). Identity for every analysis except
    /// the path-sensitive zero/non-zero analysis, which narrows on
    /// `TrueBranch`/`FalseBranch` out of a comparison against zero.
    fn edge_transfer(&self, _source: NodeIndex, _cfg: &Cfg, _edge: EdgeType, fact: &Self::Fact) -> Self::Fact {
        fact.clone()
    }
}

/// Per-block facts computed by [`solve`]. For a forward analysis, `in_facts`
/// is what held just before the block ran and `out_facts` just after; for a
/// backward analysis the same fields hold the same roles with flow reversed.
pub struct Solution<F> {
    pub in_facts: HashMap<NodeIndex, F>,
    pub out_facts: HashMap<NodeIndex, F>,
}

impl<F: Lattice> Solution<F> {
    /// Bottom for any block outside the reachable fragment `solve` ran over.
    pub fn in_fact(&self, block: NodeIndex) -> std::borrow::Cow<'_, F> {
        self.in_facts.get(&block).map(std::borrow::Cow::Borrowed).unwrap_or_else(|| std::borrow::Cow::Owned(F::bottom()))
    }

    pub fn out_fact(&self, block: NodeIndex) -> std::borrow::Cow<'_, F> {
        self.out_facts.get(&block).map(std::borrow::Cow::Borrowed).unwrap_or_else(|| std::borrow::Cow::Owned(F::bottom()))
    }
}

/// Runs `analysis` over `cfg` to a fixed point using a worklist. MiniC
/// functions are small enough that a plain FIFO worklist (no reverse
/// postorder priority queue) reaches the fixed point in a handful of
/// iterations; see SPEC §5 for the bound this relies on.
pub fn solve<A: Analysis>(analysis: &A, cfg: &Cfg, entry: NodeIndex, exit: NodeIndex) -> Solution<A::Fact> {
    // Code unreachable from the entry is flagged separately (`Unreachable`);
    // letting an orphan block's facts leak into a reachable join point
    // through shared successors (e.g. the `if`-join after a branch that
    // returns early) would corrupt a "must" analysis like definite
    // assignment, so dataflow only ever runs over the reachable fragment.
    let live: HashSet<NodeIndex> = reachability::find_reachable(cfg, entry);

    let mut in_facts: HashMap<NodeIndex, A::Fact> = live.iter().map(|&n| (n, A::Fact::bottom())).collect();
    let mut out_facts: HashMap<NodeIndex, A::Fact> = live.iter().map(|&n| (n, A::Fact::bottom())).collect();

    let boundary = match analysis.direction() {
        Direction::Forward => entry,
        Direction::Backward => exit,
    };

    let mut worklist: VecDeque<NodeIndex> = live.iter().copied().collect();
    let mut queued: HashSet<NodeIndex> = live.clone();

    while let Some(n) = worklist.pop_front() {
        queued.remove(&n);
        match analysis.direction() {
            Direction::Forward => {
                let mut incoming = if n == boundary { analysis.boundary_fact() } else { A::Fact::bottom() };
                for edge in cfg.edges_directed(n, PetDirection::Incoming) {
                    if !live.contains(&edge.source()) {
                        continue;
                    }
                    let refined = analysis.edge_transfer(edge.source(), cfg, *edge.weight(), &out_facts[&edge.source()]);
                    incoming = incoming.join(&refined);
                }
                in_facts.insert(n, incoming.clone());
                let new_out = analysis.transfer(n, cfg, &incoming);
                if new_out != out_facts[&n] {
                    out_facts.insert(n, new_out);
                    for succ in cfg.neighbors_directed(n, PetDirection::Outgoing) {
                        if live.contains(&succ) && queued.insert(succ) {
                            worklist.push_back(succ);
                        }
                    }
                }
            }
            Direction::Backward => {
                let mut incoming = if n == boundary { analysis.boundary_fact() } else { A::Fact::bottom() };
                for edge in cfg.edges_directed(n, PetDirection::Outgoing) {
                    if !live.contains(&edge.target()) {
                        continue;
                    }
                    let refined = analysis.edge_transfer(n, cfg, *edge.weight(), &in_facts[&edge.target()]);
                    incoming = incoming.join(&refined);
                }
                out_facts.insert(n, incoming.clone());
                let new_in = analysis.transfer(n, cfg, &incoming);
                if new_in != in_facts[&n] {
                    in_facts.insert(n, new_in);
                    for pred in cfg.neighbors_directed(n, PetDirection::Incoming) {
                        if live.contains(&pred) && queued.insert(pred) {
                            worklist.push_back(pred);
                        }
                    }
                }
            }
        }
    }

    Solution { in_facts, out_facts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Count(u32);

    impl Lattice for Count {
        fn bottom() -> Self {
            Count(0)
        }
        fn join(&self, other: &Self) -> Self {
            Count(self.0.max(other.0))
        }
    }

    struct CountBlocks;

    impl Analysis for CountBlocks {
        type Fact = Count;
        fn direction(&self) -> Direction {
            Direction::Forward
        }
        fn transfer(&self, _block: NodeIndex, _cfg: &Cfg, fact: &Self::Fact) -> Self::Fact {
            Count(fact.0 + 1)
        }
    }

    #[test]
    fn forward_solve_reaches_fixed_point_on_a_diamond() {
        use crate::cfg::{BasicBlock, Terminator};

        let mut cfg: Cfg = Cfg::new();
        let mk = |g: &mut Cfg| g.add_node(BasicBlock { id: 0, statements: vec![], terminator: Terminator::Exit });
        let entry = mk(&mut cfg);
        let a = mk(&mut cfg);
        let b = mk(&mut cfg);
        let exit = mk(&mut cfg);
        cfg.add_edge(entry, a, EdgeType::TrueBranch);
        cfg.add_edge(entry, b, EdgeType::FalseBranch);
        cfg.add_edge(a, exit, EdgeType::Fallthrough);
        cfg.add_edge(b, exit, EdgeType::Fallthrough);

        let solution = solve(&CountBlocks, &cfg, entry, exit);
        assert_eq!(solution.out_fact(exit).0, 2);
    }
}
