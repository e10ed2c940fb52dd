/*!
# Word Graph Representations

This module contains the graph data structures of the crate.

- [`WordGraph`]
  A deterministic partial transition function `(node, label) -> node` stored as a dense
  row-major table, one row per node, one column per label.
  - Constant-time edge lookup and insertion.
  - Rows can be handed out as contiguous slices.
  - No information about incoming edges.

- [`SourcedGraph`]
  A [`WordGraph`] extended with two parallel tables threading a singly-linked list of
  **sources** through every `(target, label)` pair, so that all edges `s -a-> t` can be
  enumerated from `t`.
  - Needed by completion: merging two nodes must rewrite all edges *into* the merged
    node, which the plain table cannot find without a full scan.
  - Supports node swap, rename and merge while keeping both directions consistent.

Only the completion engine mutates these structures; queries and enumeration consume
them read-only.
*/

pub mod sources;
pub mod word_graph;

pub use sources::SourcedGraph;
pub use word_graph::WordGraph;
