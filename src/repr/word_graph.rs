use crate::{node::*, utils::DynamicTable};

/// A deterministic labelled digraph with a partial transition function.
///
/// Node `s` has at most one outgoing edge per label `a`; [`WordGraph::target`] returns
/// its endpoint or `None`. Words label paths: [`WordGraph::follow_path`] walks a word
/// letter by letter and reports where it ends, if it is readable at all.
///
/// # Examples
/// ```
/// use wgraphs::{node::Node, repr::WordGraph};
///
/// let mut g = WordGraph::new(3, 2);
/// g.add_edge(Node::new(0), Node::new(1), 0);
/// g.add_edge(Node::new(1), Node::new(2), 1);
///
/// assert_eq!(g.target(Node::new(0), 0), Some(Node::new(1)));
/// assert_eq!(g.follow_path(Node::new(0), &[0, 1]), Some(Node::new(2)));
/// assert_eq!(g.follow_path(Node::new(0), &[1]), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGraph {
    targets: DynamicTable<Option<Node>>,
    num_edges: NumEdges,
}

impl WordGraph {
    /// Creates a graph with `nodes` nodes, out-degree `out_degree` and no edges.
    pub fn new(nodes: NumNodes, out_degree: NumLetters) -> Self {
        Self {
            targets: DynamicTable::new(nodes as usize, out_degree as usize, None),
            num_edges: 0,
        }
    }

    /// Returns the number of nodes (rows of the transition table).
    #[inline(always)]
    pub fn number_of_nodes(&self) -> NumNodes {
        self.targets.number_of_rows() as NumNodes
    }

    /// Returns the out-degree, i.e. the number of labels.
    #[inline(always)]
    pub fn out_degree(&self) -> NumLetters {
        self.targets.number_of_cols() as NumLetters
    }

    /// Returns the number of edges.
    #[inline(always)]
    pub fn number_of_edges(&self) -> NumEdges {
        self.num_edges
    }

    /// Returns the endpoint of the edge of `s` labelled `a`, if defined.
    ///
    /// **Panics if `s` or `a` is out of range.**
    #[inline(always)]
    pub fn target(&self, s: Node, a: Letter) -> Option<Node> {
        self.targets.get(s.index(), a as usize)
    }

    /// Defines the edge `s -a-> t`.
    ///
    /// **Panics in debug builds if the edge of `s` labelled `a` is already defined.**
    pub fn add_edge(&mut self, s: Node, t: Node, a: Letter) {
        debug_assert!(self.target(s, a).is_none());
        self.write(s, a, Some(t));
    }

    /// Overwrites the cell `(s, a)`, keeping the edge count in sync.
    #[inline]
    pub(crate) fn write(&mut self, s: Node, a: Letter, v: Option<Node>) {
        let old = self.targets.get(s.index(), a as usize);
        self.num_edges += v.is_some() as NumEdges;
        self.num_edges -= old.is_some() as NumEdges;
        self.targets.set(s.index(), a as usize, v);
    }

    /// Returns the transition row of `s`, one cell per label.
    #[inline(always)]
    pub fn row(&self, s: Node) -> &[Option<Node>] {
        self.targets.row(s.index())
    }

    /// Iterates over the defined transitions of `s` as `(label, target)` pairs.
    pub fn targets_of(&self, s: Node) -> impl Iterator<Item = (Letter, Node)> + '_ {
        self.row(s)
            .iter()
            .enumerate()
            .filter_map(|(a, t)| t.map(|t| (a as Letter, t)))
    }

    /// Iterates over all edges as `(source, label, target)` triples, sources in id order.
    pub fn edges(&self) -> impl Iterator<Item = (Node, Letter, Node)> + '_ {
        (0..self.number_of_nodes()).flat_map(move |s| {
            let s = Node::new(s);
            self.targets_of(s).map(move |(a, t)| (s, a, t))
        })
    }

    /// Walks the word `w` from `from` and returns the endpoint, or `None` as soon as a
    /// transition is missing. Letters outside the label range are treated as undefined
    /// transitions.
    pub fn follow_path(&self, from: Node, w: &[Letter]) -> Option<Node> {
        let d = self.out_degree();
        let mut cur = from;
        for &a in w {
            if a >= d {
                return None;
            }
            cur = self.target(cur, a)?;
        }
        Some(cur)
    }

    /// Appends `k` nodes without edges.
    pub fn add_nodes(&mut self, k: NumNodes) {
        self.targets.add_rows(k as usize, None);
    }

    /// Appends `k` labels; existing nodes have no transition on them.
    pub fn add_to_out_degree(&mut self, k: NumLetters) {
        self.targets.add_cols(k as usize, None);
    }

    /// Drops all nodes with id `>= k`. The dropped rows must not carry edges and no
    /// surviving cell may reference a dropped node; both are the caller's
    /// responsibility (checked in debug builds).
    pub(crate) fn restrict(&mut self, k: NumNodes) {
        debug_assert!(
            self.edges()
                .all(|(s, _, t)| s.raw() < k && t.raw() < k)
        );
        self.targets.shrink_rows_to(k as usize);
    }

    /// Exchanges the transition rows of `c` and `d` (cell values are untouched).
    #[inline]
    pub(crate) fn swap_rows(&mut self, c: Node, d: Node) {
        self.targets.swap_rows(c.index(), d.index());
    }
}
