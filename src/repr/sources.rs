use std::collections::VecDeque;

use crate::{
    error::{Error, Result},
    node::*,
    repr::WordGraph,
    utils::DynamicTable,
};

/// A [`WordGraph`] that additionally tracks, for every `(target, label)` pair, the
/// singly-linked list of all sources with an edge of that label into the target.
///
/// The chains live in two tables parallel to the transition table:
/// - `first_source(t, a)` is the head of the list of nodes `s` with `s -a-> t`,
/// - `next_source(s, a)` is the successor of `s` in the list it belongs to.
///
/// After every public operation the two directions agree: `target(s, a) == Some(t)` iff
/// `s` occurs (exactly once) in the chain of `(t, a)`, and `None` terminates every
/// chain. Preconditions are enforced in debug builds only.
#[derive(Debug, Clone)]
pub struct SourcedGraph {
    graph: WordGraph,
    first_source: DynamicTable<Option<Node>>,
    next_source: DynamicTable<Option<Node>>,
}

impl SourcedGraph {
    /// Creates a graph with `nodes` nodes, out-degree `out_degree` and no edges.
    pub fn new(nodes: NumNodes, out_degree: NumLetters) -> Self {
        Self {
            graph: WordGraph::new(nodes, out_degree),
            first_source: DynamicTable::new(nodes as usize, out_degree as usize, None),
            next_source: DynamicTable::new(nodes as usize, out_degree as usize, None),
        }
    }

    /// Returns the underlying plain word graph.
    #[inline(always)]
    pub fn graph(&self) -> &WordGraph {
        &self.graph
    }

    /// Returns the number of nodes.
    #[inline(always)]
    pub fn number_of_nodes(&self) -> NumNodes {
        self.graph.number_of_nodes()
    }

    /// Returns the out-degree.
    #[inline(always)]
    pub fn out_degree(&self) -> NumLetters {
        self.graph.out_degree()
    }

    /// Returns the number of edges.
    #[inline(always)]
    pub fn number_of_edges(&self) -> NumEdges {
        self.graph.number_of_edges()
    }

    /// Returns the endpoint of the edge of `s` labelled `a`, if defined.
    #[inline(always)]
    pub fn target(&self, s: Node, a: Letter) -> Option<Node> {
        self.graph.target(s, a)
    }

    /// Returns the head of the source chain of `(t, a)`.
    #[inline(always)]
    pub fn first_source(&self, t: Node, a: Letter) -> Option<Node> {
        self.first_source.get(t.index(), a as usize)
    }

    /// Returns the successor of `s` in the source chain it belongs to under `a`.
    #[inline(always)]
    pub fn next_source(&self, s: Node, a: Letter) -> Option<Node> {
        self.next_source.get(s.index(), a as usize)
    }

    /// Iterates over the source chain of `(t, a)`.
    pub fn sources_of(&self, t: Node, a: Letter) -> Sources<'_> {
        Sources {
            graph: self,
            label: a,
            cur: self.first_source(t, a),
        }
    }

    /// Returns *true* if `s -a-> t` according to the source chain of `(t, a)`.
    ///
    /// Costs a chain walk; intended for assertions.
    pub fn is_source(&self, t: Node, s: Node, a: Letter) -> bool {
        self.sources_of(t, a).any(|x| x == s)
    }

    /// Defines the edge `s -a-> t` and prepends `s` to the source chain of `(t, a)`.
    ///
    /// **Panics in debug builds if the edge of `s` labelled `a` is already defined.**
    pub fn add_edge(&mut self, s: Node, t: Node, a: Letter) {
        debug_assert!(self.target(s, a).is_none());
        self.graph.write(s, a, Some(t));
        self.add_source(t, a, s);
    }

    /// Removes the edge of `s` labelled `a`.
    ///
    /// **Panics if that edge is undefined.**
    pub fn remove_edge(&mut self, s: Node, a: Letter) {
        let t = self.target(s, a).expect("edge to remove must be defined");
        self.remove_source(t, a, s);
        self.graph.write(s, a, None);
    }

    /// Appends `k` nodes without edges.
    pub fn add_nodes(&mut self, k: NumNodes) {
        self.graph.add_nodes(k);
        self.first_source.add_rows(k as usize, None);
        self.next_source.add_rows(k as usize, None);
    }

    /// Appends `k` labels.
    pub fn add_to_out_degree(&mut self, k: NumLetters) {
        self.graph.add_to_out_degree(k);
        self.first_source.add_cols(k as usize, None);
        self.next_source.add_cols(k as usize, None);
    }

    /// Drops all nodes with id `>= k`; their rows must already be detached.
    pub fn shrink_to(&mut self, k: NumNodes) {
        self.graph.restrict(k);
        self.first_source.shrink_rows_to(k as usize);
        self.next_source.shrink_rows_to(k as usize);
    }

    /// Merges `max` into `min`: moves or reconciles every outgoing edge of `max`,
    /// rewrites every incoming edge of `max` to enter `min`, and leaves `max` fully
    /// detached. The caller returns `max` to its node manager.
    ///
    /// - An edge `max -a-> t` with `min`'s `a`-transition undefined is moved to `min`
    ///   and reported through `on_new_edge(min, a)`, since it may enable further
    ///   relation-closure work.
    /// - If both `min` and `max` have an `a`-transition, the pair of targets is pushed
    ///   onto `coincidences` (when distinct); the pair may name nodes that die before
    ///   it is popped, so consumers resolve pairs through their node manager.
    /// - `is_incompatible(graph, max, a, t)` is consulted for every outgoing edge
    ///   `max -a-> t` before anything is restructured; if it fires, the merge aborts
    ///   with [`Error::InverseInconsistency`] and the graph is unchanged.
    ///
    /// **Panics in debug builds unless `min < max`.**
    pub fn merge_nodes<F, G>(
        &mut self,
        min: Node,
        max: Node,
        coincidences: &mut VecDeque<(Node, Node)>,
        mut on_new_edge: F,
        mut is_incompatible: G,
    ) -> Result<()>
    where
        F: FnMut(Node, Letter),
        G: FnMut(&WordGraph, Node, Letter, Node) -> bool,
    {
        debug_assert!(min < max);

        for a in 0..self.out_degree() {
            if let Some(t) = self.target(max, a) {
                if is_incompatible(&self.graph, max, a, t) {
                    return Err(Error::InverseInconsistency {
                        a: min.raw(),
                        b: max.raw(),
                        label: a,
                    });
                }
            }
        }

        for a in 0..self.out_degree() {
            match (self.target(min, a), self.target(max, a)) {
                (None, Some(t)) => {
                    self.remove_edge(max, a);
                    self.add_edge(min, t, a);
                    on_new_edge(min, a);
                }
                (Some(tm), Some(tx)) => {
                    self.remove_edge(max, a);
                    if tm != tx {
                        coincidences.push_back((tm, tx));
                    }
                }
                _ => {}
            }

            // Rewrite all remaining edges into max so they enter min instead, splicing
            // the whole chain of (max, a) onto the chain of (min, a).
            let mut s = self.first_source(max, a);
            while let Some(src) = s {
                s = self.next_source(src, a);
                self.graph.write(src, a, Some(min));
                self.next_source
                    .set(src.index(), a as usize, self.first_source(min, a));
                self.first_source.set(min.index(), a as usize, Some(src));
            }
            self.first_source.set(max.index(), a as usize, None);
        }

        self.next_source.fill_row(max.index(), None);
        debug_assert!(self.graph.row(max).iter().all(Option::is_none));
        Ok(())
    }

    /// Exchanges the identities of the valid nodes `c` and `d` in both the forward and
    /// the reverse representation. Self-loops and edges between `c` and `d` are
    /// preserved.
    ///
    /// **Panics if `c == d`.**
    pub fn swap_nodes(&mut self, c: Node, d: Node) {
        assert_ne!(c, d);

        // Every cell holding c or d outside rows c and d is found through the chains;
        // collect them first, rewrite the values in place, then swap the rows. The
        // combination applies the transposition (c d) to rows and values alike.
        let mut retarget = Vec::new();
        let mut refirst = Vec::new();
        let mut renext = Vec::new();

        for a in 0..self.out_degree() {
            for (x, y) in [(c, d), (d, c)] {
                for s in self.sources_of(x, a) {
                    retarget.push((s, a, y));
                }
                if let Some(t) = self.target(x, a) {
                    if self.first_source(t, a) == Some(x) {
                        refirst.push((t, a, y));
                    } else if let Some(p) = self.sources_of(t, a).find(|&p| {
                        self.next_source(p, a) == Some(x)
                    }) {
                        renext.push((p, a, y));
                    }
                }
            }
        }

        for (s, a, v) in retarget {
            self.graph.write(s, a, Some(v));
        }
        for (t, a, v) in refirst {
            self.first_source.set(t.index(), a as usize, Some(v));
        }
        for (p, a, v) in renext {
            self.next_source.set(p.index(), a as usize, Some(v));
        }

        self.graph.swap_rows(c, d);
        self.first_source.swap_rows(c.index(), d.index());
        self.next_source.swap_rows(c.index(), d.index());
    }

    /// Transfers all in- and out-edges of `c` to `d`, which must currently have none;
    /// `c` is left fully detached. A one-sided [`SourcedGraph::swap_nodes`].
    pub fn rename_node(&mut self, c: Node, d: Node) {
        debug_assert!(self.graph.row(d).iter().all(Option::is_none));
        debug_assert!((0..self.out_degree()).all(|a| self.first_source(d, a).is_none()));

        let mut retarget = Vec::new();
        let mut refirst = Vec::new();
        let mut renext = Vec::new();

        for a in 0..self.out_degree() {
            for s in self.sources_of(c, a) {
                retarget.push((s, a));
            }
            if let Some(t) = self.target(c, a) {
                if self.first_source(t, a) == Some(c) {
                    refirst.push((t, a));
                } else if let Some(p) = self
                    .sources_of(t, a)
                    .find(|&p| self.next_source(p, a) == Some(c))
                {
                    renext.push((p, a));
                }
            }
        }

        for (s, a) in retarget {
            self.graph.write(s, a, Some(d));
        }
        for (t, a) in refirst {
            self.first_source.set(t.index(), a as usize, Some(d));
        }
        for (p, a) in renext {
            self.next_source.set(p.index(), a as usize, Some(d));
        }

        self.graph.swap_rows(c, d);
        self.first_source.swap_rows(c.index(), d.index());
        self.next_source.swap_rows(c.index(), d.index());
    }

    /// Discards both source tables and rebuilds them from the transition table.
    ///
    /// For debugging and bootstrap only; every public operation keeps the chains
    /// consistent incrementally.
    pub fn rebuild_sources(&mut self) {
        for r in 0..self.number_of_nodes() as usize {
            self.first_source.fill_row(r, None);
            self.next_source.fill_row(r, None);
        }
        for s in (0..self.number_of_nodes()).map(Node::new) {
            for a in 0..self.out_degree() {
                if let Some(t) = self.target(s, a) {
                    self.add_source(t, a, s);
                }
            }
        }
    }

    /// Prepends `s` to the source chain of `(t, a)`.
    fn add_source(&mut self, t: Node, a: Letter, s: Node) {
        self.next_source
            .set(s.index(), a as usize, self.first_source(t, a));
        self.first_source.set(t.index(), a as usize, Some(s));
    }

    /// Unlinks `s` from the source chain of `(t, a)`.
    fn remove_source(&mut self, t: Node, a: Letter, s: Node) {
        if self.first_source(t, a) == Some(s) {
            self.first_source
                .set(t.index(), a as usize, self.next_source(s, a));
        } else {
            let p = self
                .sources_of(t, a)
                .find(|&p| self.next_source(p, a) == Some(s))
                .expect("source to unlink must be on the chain");
            self.next_source
                .set(p.index(), a as usize, self.next_source(s, a));
        }
        self.next_source.set(s.index(), a as usize, None);
    }

    /// Asserts the bidirectional invariants: each chain lists exactly the sources of its
    /// `(target, label)` pair, and no chain contains a node twice.
    #[cfg(test)]
    pub(crate) fn audit(&self) {
        use itertools::Itertools;

        let nodes = (0..self.number_of_nodes()).map(Node::new).collect_vec();
        for a in 0..self.out_degree() {
            for &t in &nodes {
                let chain = self
                    .sources_of(t, a)
                    .take(self.number_of_nodes() as usize + 1)
                    .collect_vec();
                assert!(chain.len() <= self.number_of_nodes() as usize, "cyclic chain");
                assert!(chain.iter().all_unique(), "duplicate in chain of ({t}, {a})");
                for &s in &chain {
                    assert_eq!(self.target(s, a), Some(t));
                }
            }
            for &s in &nodes {
                if let Some(t) = self.target(s, a) {
                    assert!(self.is_source(t, s, a), "missing chain entry ({s}, {a}, {t})");
                }
            }
        }
    }
}

/// Iterator over the source chain of a `(target, label)` pair.
pub struct Sources<'a> {
    graph: &'a SourcedGraph,
    label: Letter,
    cur: Option<Node>,
}

impl Iterator for Sources<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let s = self.cur?;
        self.cur = self.graph.next_source(s, self.label);
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    fn n(u: RawNode) -> Node {
        Node::new(u)
    }

    #[test]
    fn add_and_remove_edges() {
        let mut g = SourcedGraph::new(3, 2);
        g.add_edge(n(0), n(2), 0);
        g.add_edge(n(1), n(2), 0);
        g.add_edge(n(2), n(2), 1);
        g.audit();

        assert_eq!(g.sources_of(n(2), 0).collect_vec(), vec![n(1), n(0)]);
        assert!(g.is_source(n(2), n(0), 0));
        assert!(!g.is_source(n(2), n(0), 1));

        g.remove_edge(n(1), 0);
        g.audit();
        assert_eq!(g.sources_of(n(2), 0).collect_vec(), vec![n(0)]);

        g.remove_edge(n(0), 0);
        g.remove_edge(n(2), 1);
        g.audit();
        assert_eq!(g.number_of_edges(), 0);
    }

    #[test]
    fn growth_keeps_chains() {
        let mut g = SourcedGraph::new(2, 1);
        g.add_edge(n(0), n(1), 0);
        g.add_nodes(2);
        g.add_to_out_degree(1);
        g.add_edge(n(3), n(1), 1);
        g.add_edge(n(2), n(1), 0);
        g.audit();

        assert_eq!(g.sources_of(n(1), 0).collect_vec(), vec![n(2), n(0)]);
        assert_eq!(g.sources_of(n(1), 1).collect_vec(), vec![n(3)]);
    }

    #[test]
    fn rebuild_matches_incremental() {
        let rng = &mut Pcg64Mcg::seed_from_u64(31);
        let (nodes, deg) = (20u32, 3u32);
        let mut g = SourcedGraph::new(nodes, deg);

        for _ in 0..100 {
            let (s, t, a) = (
                n(rng.random_range(0..nodes)),
                n(rng.random_range(0..nodes)),
                rng.random_range(0..deg),
            );
            if g.target(s, a).is_none() {
                g.add_edge(s, t, a);
            }
        }
        g.audit();

        let forward = g.graph().clone();
        g.rebuild_sources();
        g.audit();
        assert_eq!(g.graph(), &forward);
    }

    #[test]
    fn randomized_add_remove() {
        let rng = &mut Pcg64Mcg::seed_from_u64(7);

        for _ in 0..10 {
            let nodes = rng.random_range(2..12u32);
            let deg = rng.random_range(1..4u32);
            let mut g = SourcedGraph::new(nodes, deg);

            for _ in 0..300 {
                let (s, a) = (n(rng.random_range(0..nodes)), rng.random_range(0..deg));
                match g.target(s, a) {
                    None => g.add_edge(s, n(rng.random_range(0..nodes)), a),
                    Some(_) => g.remove_edge(s, a),
                }
            }
            g.audit();
        }
    }

    #[test]
    fn swap_preserves_structure() {
        // 0 -a-> 1, 1 -a-> 1 (self-loop), 2 -b-> 1, 1 -b-> 0
        let mut g = SourcedGraph::new(3, 2);
        g.add_edge(n(0), n(1), 0);
        g.add_edge(n(1), n(1), 0);
        g.add_edge(n(2), n(1), 1);
        g.add_edge(n(1), n(0), 1);

        g.swap_nodes(n(0), n(1));
        g.audit();

        assert_eq!(g.target(n(1), 0), Some(n(0)));
        assert_eq!(g.target(n(0), 0), Some(n(0))); // self-loop followed the node
        assert_eq!(g.target(n(2), 1), Some(n(0)));
        assert_eq!(g.target(n(0), 1), Some(n(1)));
        assert_eq!(g.number_of_edges(), 4);
    }

    #[test]
    fn randomized_swap_against_relabelling() {
        let rng = &mut Pcg64Mcg::seed_from_u64(99);

        for _ in 0..30 {
            let nodes = rng.random_range(2..10u32);
            let deg = rng.random_range(1..4u32);
            let mut g = SourcedGraph::new(nodes, deg);
            for _ in 0..40 {
                let (s, a) = (n(rng.random_range(0..nodes)), rng.random_range(0..deg));
                if g.target(s, a).is_none() {
                    g.add_edge(s, n(rng.random_range(0..nodes)), a);
                }
            }

            let c = rng.random_range(0..nodes);
            let d = (c + rng.random_range(1..nodes)) % nodes;
            let swap = |u: Node| {
                if u == c {
                    n(d)
                } else if u == d {
                    n(c)
                } else {
                    u
                }
            };
            let expected = g
                .graph()
                .edges()
                .map(|(s, a, t)| (swap(s), a, swap(t)))
                .sorted()
                .collect_vec();

            g.swap_nodes(n(c), n(d));
            g.audit();
            assert_eq!(g.graph().edges().sorted().collect_vec(), expected);
        }
    }

    #[test]
    fn rename_moves_all_edges() {
        let mut g = SourcedGraph::new(4, 2);
        g.add_edge(n(0), n(1), 0);
        g.add_edge(n(1), n(1), 1);
        g.add_edge(n(2), n(1), 0);

        g.rename_node(n(1), n(3));
        g.audit();

        assert_eq!(g.target(n(0), 0), Some(n(3)));
        assert_eq!(g.target(n(2), 0), Some(n(3)));
        assert_eq!(g.target(n(3), 1), Some(n(3)));
        assert_eq!(g.target(n(1), 1), None);
        assert!((0..2).all(|a| g.first_source(n(1), a).is_none()));
    }

    #[test]
    fn merge_moves_and_queues() {
        // 0 -a-> 1, 0 -b-> 2, 2 -a-> 2, 2 -b-> 0; merge 2 into 1
        let mut g = SourcedGraph::new(3, 2);
        g.add_edge(n(0), n(1), 0);
        g.add_edge(n(0), n(2), 1);
        g.add_edge(n(2), n(2), 0);
        g.add_edge(n(2), n(0), 1);

        let mut coinc = VecDeque::new();
        let mut new_edges = Vec::new();
        g.merge_nodes(
            n(1),
            n(2),
            &mut coinc,
            |s, a| new_edges.push((s, a)),
            |_, _, _, _| false,
        )
        .unwrap();
        g.audit();

        // both of max's edges were moved, none clashed
        assert!(coinc.is_empty());
        assert_eq!(new_edges, vec![(n(1), 0), (n(1), 1)]);

        // 2's self-loop became a self-loop of 1 and 0 -b-> 2 entered 1
        assert_eq!(g.target(n(1), 0), Some(n(1)));
        assert_eq!(g.target(n(1), 1), Some(n(0)));
        assert_eq!(g.target(n(0), 1), Some(n(1)));
        assert!(g.graph().row(n(2)).iter().all(Option::is_none));
        assert!((0..2).all(|a| g.first_source(n(2), a).is_none()));
    }

    #[test]
    fn merge_queues_conflicting_targets() {
        // 0 -a-> 1 and 1 -a-> 2 clash when merging 1 into 0
        let mut g = SourcedGraph::new(3, 1);
        g.add_edge(n(0), n(1), 0);
        g.add_edge(n(1), n(2), 0);

        let mut coinc = VecDeque::new();
        g.merge_nodes(n(0), n(1), &mut coinc, |_, _| {}, |_, _, _, _| false)
            .unwrap();
        g.audit();

        assert_eq!(coinc.pop_front(), Some((n(1), n(2))));
        assert!(coinc.is_empty());
        // min kept its own edge; the incoming edge of max was rewritten
        assert_eq!(g.target(n(0), 0), Some(n(0)));
    }

    #[test]
    fn merge_reports_incompatibility() {
        let mut g = SourcedGraph::new(2, 1);
        g.add_edge(n(1), n(0), 0);
        let before = g.graph().clone();

        let mut coinc = VecDeque::new();
        let err = g
            .merge_nodes(n(0), n(1), &mut coinc, |_, _| {}, |_, _, _, _| true)
            .unwrap_err();
        assert!(matches!(err, Error::InverseInconsistency { .. }));
        // aborted before restructuring
        assert_eq!(g.graph(), &before);
    }
}
