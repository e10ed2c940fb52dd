use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use crate::bitset::BitSetImpl;

/// We use a NonZero-Wrapper around `RawNode` to allow `Option<Node>` to be same-sized as
/// `RawNode`: a cell of the transition table is `Option<Node>` and `None` marks an absent
/// transition.
///
/// Thus, nodes are 1-indexed internally and store the original value plus one, meaning
/// `RawNode::MAX` is no longer an allowed value a node can have.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node(NonZero<RawNode>);

/// 0-indexed counterpart of `Node`
pub type RawNode = u32;

/// There can be at most `2^32 - 1` nodes in a word graph.
pub type NumNodes = RawNode;

/// Type alias representing the number of edges.
///
/// A deterministic word graph has at most `number_of_nodes * out_degree` edges.
pub type NumEdges = u64;

/// An edge label: an index into the alphabet of the presentation (or into the doubled
/// label range of an inverse presentation).
pub type Letter = u32;

/// Number of letters / out-degree of a word graph.
pub type NumLetters = Letter;

/// A word over the alphabet, i.e. a sequence of letters.
pub type Word = Vec<Letter>;

/// BitSet over raw node ids
pub type NodeBitSet = BitSetImpl;

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq<RawNode> for Node {
    fn eq(&self, other: &RawNode) -> bool {
        self.raw().eq(other)
    }
}

impl PartialOrd<RawNode> for Node {
    fn partial_cmp(&self, other: &RawNode) -> Option<std::cmp::Ordering> {
        self.raw().partial_cmp(other)
    }
}

impl Node {
    /// The maximum possible value a node can have
    pub const MAX: Self = Node(NonZero::new(RawNode::MAX).unwrap());

    /// The start node of every word graph (raw value `0`, stored as `1`)
    pub const ZERO: Self = Node(NonZero::new(1).unwrap());

    /// Creates a new node from a 0-indexed RawNode.
    /// If the raw value is `RawNode::MAX`, this will panic.
    #[inline]
    pub const fn new(u: RawNode) -> Self {
        Node(NonZero::new(u.wrapping_add(1)).unwrap())
    }

    /// Tries to create a new node and returns *None* if the value is too big
    /// (ie. equals `RawNode::MAX`)
    #[inline]
    pub const fn new_checked(u: RawNode) -> Option<Self> {
        if u == RawNode::MAX {
            return None;
        }
        // SAFETY: `1 <= u + 1` for any `u < RawNode::MAX`
        unsafe { Some(Node(NonZero::new(u.unchecked_add(1)).unwrap_unchecked())) }
    }

    /// Gets the 0-indexed value of the node
    #[inline]
    pub const fn raw(&self) -> RawNode {
        // SAFETY: `self.0` is non-zero, so the subtraction cannot underflow
        unsafe { self.0.get().unchecked_sub(1) }
    }

    /// Gets the 0-indexed value of the node as a `usize` index
    #[inline]
    pub const fn index(&self) -> usize {
        self.raw() as usize
    }
}

impl From<RawNode> for Node {
    fn from(value: RawNode) -> Self {
        Self::new(value)
    }
}

impl From<&RawNode> for Node {
    fn from(value: &RawNode) -> Self {
        Self::new(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_node_is_free() {
        assert_eq!(
            std::mem::size_of::<Option<Node>>(),
            std::mem::size_of::<RawNode>()
        );
    }

    #[test]
    fn roundtrip() {
        for u in [0, 1, 2, 1000, RawNode::MAX - 1] {
            assert_eq!(Node::new(u).raw(), u);
            assert_eq!(Node::new_checked(u), Some(Node::new(u)));
        }
        assert_eq!(Node::new_checked(RawNode::MAX), None);
    }

    #[test]
    fn ordering_matches_raw() {
        assert!(Node::ZERO < Node::new(1));
        assert!(Node::new(7) == 7);
        assert!(Node::new(3) < Node::new(4));
        assert_eq!(Node::new(3).min(Node::new(4)), Node::new(3));
    }

    #[test]
    fn display_is_zero_indexed() {
        assert_eq!(format!("{}", Node::ZERO), "0");
        assert_eq!(format!("{:?}", Node::new(42)), "42");
    }
}
