/*!
`wgraphs` is a library for **w**ord graphs and the **w**ord problem over finitely
presented semigroups and monoids, built around Stephen's procedure:
- Nodes are numbered `0` to `n - 1`, with node `0` the fixed start node.
- Edges are labelled by letters of the presentation's alphabet, and each node has at
  most one outgoing edge per letter, so words label paths deterministically.

# Representation

We represent **nodes** as a `NonZero`-wrapper around `u32`, so that a transition-table
cell is an `Option<Node>` of the same size as a `u32` and an absent transition is
simply `None`. The transition function and the reverse **source chains** (all edges
into a node, per label) live in dense row-major tables, one row per node.

# Components

- [`presentation`]: alphabets, relation lists and validation, including inverse
  presentations with formal inverses on a doubled label range.
- [`repr`]: the [`WordGraph`](repr::WordGraph) transition table and the
  [`SourcedGraph`](repr::SourcedGraph) with reverse source chains and node merging.
- [`stephen`]: the completion engine answering, for a fixed word `w`, whether another
  word is equivalent to `w` or a left factor of it, with cooperative cancellation.
- [`algo`]: shortlex path enumeration and canonical BFS relabelling.
- [`utils`]: the dynamic 2-D table and the node-id manager underneath it all.

# Design

Algorithm state lives in explicit values, not control flow: the engine owns FIFO
worklists for relation closure and node coincidences, and the merge primitive pushes
follow-up work onto them instead of recursing. Configurable behaviour uses the
*Builder* / *Setter* pattern on the owning struct.

# Usage

```
use wgraphs::{presentation::Presentation, stephen::Stephen};

// the bicyclic-style relation ab = ba over two generators
let mut p = Presentation::new();
p.set_alphabet_size(2);
p.add_rule_checked(&[0, 1], &[1, 0]).unwrap();

let mut s = Stephen::new(p).unwrap();
s.set_word(&[0, 1]).unwrap();
s.run().unwrap();

assert!(s.accepts(&[1, 0]).unwrap());
assert!(!s.accepts(&[0, 0]).unwrap());
let words: Vec<_> = s.words_accepted(0, Some(3)).unwrap().collect();
assert_eq!(words, vec![vec![0, 1], vec![1, 0]]);
```

# When to use

You should only use this library if the following apply:
- Your semigroup or monoid is given by a finite presentation.
- You want to decide equivalence against a *fixed* word, or enumerate its class.
- You accept that the procedure may not terminate: the word problem is undecidable in
  general, so long runs should set a deadline or a stop flag.

For complete coset-style enumeration of a finite quotient, or confluent rewriting,
other tools (Todd-Coxeter, Knuth-Bendix) are the better fit.
*/

pub mod algo;
mod bitset;
pub mod error;
pub mod node;
pub mod presentation;
pub mod repr;
pub mod stephen;
pub mod utils;

/// `wgraphs::prelude` includes the node and word types, the presentation kinds, the
/// graph representations and the engine.
pub mod prelude {
    pub use super::{
        error::{Error, Result},
        node::*,
        presentation::{AnyPresentation, InversePresentation, Presentation},
        repr::{SourcedGraph, WordGraph},
        stephen::Stephen,
    };
}
