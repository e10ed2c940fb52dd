use std::collections::VecDeque;

use crate::{node::*, repr::SourcedGraph, utils::NodeManager};

/// Relabels the nodes of a converged graph to the breadth-first order from node `0`
/// (labels explored in id order), so that isomorphic graphs get identical tables, and
/// drops the rows of merged-away nodes.
///
/// Every active node must be reachable from node `0` and every dead row must already be
/// detached; both hold after a converged completion run. Returns the applied
/// permutation `p`, with `p[old]` the new id of `old`, so callers can remap cached
/// node ids.
pub fn standardise(graph: &mut SourcedGraph, manager: &mut NodeManager) -> Vec<RawNode> {
    let n = graph.number_of_nodes();
    debug_assert_eq!(n, manager.number_of_nodes_defined());

    // BFS from node 0; the visit order is the new id order.
    let mut visited = NodeBitSet::new(n);
    let mut queue = VecDeque::new();
    let mut new_of: Vec<RawNode> = (0..n).collect();

    visited.set_bit(Node::ZERO.raw());
    queue.push_back(Node::ZERO);
    let mut next_id: RawNode = 0;
    while let Some(u) = queue.pop_front() {
        new_of[u.index()] = next_id;
        next_id += 1;
        for (_, t) in graph.graph().targets_of(u) {
            if !visited.set_bit(t.raw()) {
                queue.push_back(t);
            }
        }
    }
    let k = next_id;
    debug_assert_eq!(k, manager.number_of_nodes_active());

    // Dead nodes take the leftover ids in increasing order.
    for u in 0..n {
        if !visited.get_bit(u) {
            new_of[u as usize] = next_id;
            next_id += 1;
        }
    }

    let perm = new_of.clone();

    // Apply the permutation through id swaps: each swap moves the node in slot i to its
    // final id, so the loop terminates after at most n swaps.
    for i in 0..n as usize {
        while new_of[i] != i as RawNode {
            let j = new_of[i] as usize;
            graph.swap_nodes(Node::new(i as RawNode), Node::new(j as RawNode));
            manager.swap_ids(Node::new(i as RawNode), Node::new(j as RawNode));
            new_of.swap(i, j);
        }
    }

    graph.shrink_to(k);
    manager.shrink_to(k);
    perm
}
