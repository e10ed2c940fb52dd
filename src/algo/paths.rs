/*!
# Shortlex Path Enumeration

This module provides lazy enumeration of the words labelling paths in a word graph, in
**shortlex order**: shorter words first, ties broken lexicographically by letter id.

## Key features
- Enumeration of all paths leaving a source node, or only those reaching a target.
- Length bounds `[min, max)`; the sequence is finite whenever `max` is finite.
- Iteration stops early once no walk of the current length exists, so unbounded
  enumeration over an acyclic graph also terminates.
*/

use crate::{node::*, repr::WordGraph};

/// Lazy iterator over the words labelling paths of a [`WordGraph`] in shortlex order.
///
/// Configured with the *Builder* / *Setter* pattern before iteration; the iterator is
/// restartable via [`ShortlexPaths::restart`].
///
/// # Examples
/// ```
/// use wgraphs::{algo::ShortlexPaths, node::Node, repr::WordGraph};
///
/// // a line 0 -a-> 1 -a-> 2
/// let mut g = WordGraph::new(3, 1);
/// g.add_edge(Node::new(0), Node::new(1), 0);
/// g.add_edge(Node::new(1), Node::new(2), 0);
///
/// let words: Vec<_> = ShortlexPaths::new(&g, Node::new(0)).collect();
/// assert_eq!(words, vec![vec![], vec![0], vec![0, 0]]);
///
/// let to_end: Vec<_> = ShortlexPaths::new(&g, Node::new(0))
///     .target(Node::new(2))
///     .collect();
/// assert_eq!(to_end, vec![vec![0, 0]]);
/// ```
pub struct ShortlexPaths<'a> {
    graph: &'a WordGraph,
    source: Node,
    target: Option<Node>,
    min: usize,
    max: Option<usize>,

    len: usize,
    word: Word,
    path: Vec<Node>,
    first_in_band: bool,
    any_at_len: bool,
    done: bool,
}

impl<'a> ShortlexPaths<'a> {
    /// Creates an enumerator over all paths leaving `source`, of any length.
    pub fn new(graph: &'a WordGraph, source: Node) -> Self {
        let mut paths = Self {
            graph,
            source,
            target: None,
            min: 0,
            max: None,
            len: 0,
            word: Vec::new(),
            path: Vec::new(),
            first_in_band: true,
            any_at_len: false,
            done: false,
        };
        paths.restart();
        paths
    }

    /// Restricts the enumeration to paths ending at `t`.
    pub fn set_target(&mut self, t: Node) {
        self.target = Some(t);
    }

    /// Builder-style variant of [`Self::set_target`].
    pub fn target(mut self, t: Node) -> Self {
        self.set_target(t);
        self
    }

    /// Sets the minimum word length (inclusive).
    pub fn set_min_length(&mut self, min: usize) {
        self.min = min;
        self.restart();
    }

    /// Builder-style variant of [`Self::set_min_length`].
    pub fn min_length(mut self, min: usize) -> Self {
        self.set_min_length(min);
        self
    }

    /// Sets the maximum word length (exclusive); `None` means unbounded.
    pub fn set_max_length(&mut self, max: Option<usize>) {
        self.max = max;
        self.restart();
    }

    /// Builder-style variant of [`Self::set_max_length`].
    pub fn max_length(mut self, max: Option<usize>) -> Self {
        self.set_max_length(max);
        self
    }

    /// Rewinds the enumeration to the first word of the `[min, max)` band.
    pub fn restart(&mut self) {
        self.len = self.min;
        self.word.clear();
        self.path.clear();
        self.path.push(self.source);
        self.first_in_band = true;
        self.any_at_len = false;
        self.done = self.max.is_some_and(|max| self.min >= max);
    }

    /// Produces the endpoint of the lexicographically next walk of length `self.len`,
    /// or `None` once the current length band is exhausted. `self.word` holds the
    /// corresponding word.
    fn advance(&mut self) -> Option<Node> {
        let d = self.graph.out_degree();

        let mut resume = if self.first_in_band {
            self.first_in_band = false;
            if self.len == 0 {
                return Some(self.source);
            }
            0
        } else {
            if self.len == 0 {
                return None;
            }
            self.path.pop();
            self.word.pop().expect("a word of full length was yielded") + 1
        };

        loop {
            let cur = *self.path.last().expect("the path always contains the source");
            let next = (resume..d).find_map(|a| self.graph.target(cur, a).map(|t| (a, t)));

            match next {
                Some((a, t)) => {
                    self.word.push(a);
                    self.path.push(t);
                    if self.word.len() == self.len {
                        return Some(t);
                    }
                    resume = 0;
                }
                None => {
                    if self.word.is_empty() {
                        return None;
                    }
                    self.path.pop();
                    resume = self.word.pop().expect("word is non-empty") + 1;
                }
            }
        }
    }
}

impl Iterator for ShortlexPaths<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.advance() {
                Some(end) => {
                    self.any_at_len = true;
                    if self.target.is_none_or(|t| t == end) {
                        return Some(self.word.clone());
                    }
                }
                None => {
                    // Paths of length l + 1 extend paths of length l, so an empty band
                    // means all longer bands are empty too.
                    if !self.any_at_len {
                        self.done = true;
                        return None;
                    }
                    self.len += 1;
                    if self.max.is_some_and(|max| self.len >= max) {
                        self.done = true;
                        return None;
                    }
                    self.word.clear();
                    self.path.clear();
                    self.path.push(self.source);
                    self.first_in_band = true;
                    self.any_at_len = false;
                }
            }
        }
    }
}
