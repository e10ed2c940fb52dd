/*!
# Node Manager

Allocator of node identifiers for a growing, merging word graph.

The active nodes form a doubly-linked list threaded through two shadow arrays
(`next`/`prev` indexed by id), so that iteration visits nodes in **insertion order** --
the order the completion engine relies on when it seeds relation work. Ids released by a
merge go onto a free list and are handed out again by later allocations.

Every id additionally carries a representative link: [`NodeManager::union_nodes`] makes
the larger id point at the surviving one, and [`NodeManager::find`] resolves an id that
may have been merged away to its current representative. Queued node pairs may therefore
safely name ids that died between enqueue and dequeue. Representative links are only
meaningful while identifications are pending; they are reset when an id is reallocated
or swapped.
*/

use crate::node::{Node, NumNodes};

/// Tracks which node ids are in use, allocates new ids, and resolves merged-away ids to
/// their surviving representative.
///
/// A fresh manager has exactly one active node, [`Node::ZERO`], which is never freed.
#[derive(Debug, Clone)]
pub struct NodeManager {
    next: Vec<Option<Node>>,
    prev: Vec<Option<Node>>,
    head: Option<Node>,
    tail: Option<Node>,
    active: Vec<bool>,
    ident: Vec<Node>,
    free: Vec<Node>,
    num_active: NumNodes,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeManager {
    /// Creates a manager with the single active node `0`.
    pub fn new() -> Self {
        Self {
            next: vec![None],
            prev: vec![None],
            head: Some(Node::ZERO),
            tail: Some(Node::ZERO),
            active: vec![true],
            ident: vec![Node::ZERO],
            free: Vec::new(),
            num_active: 1,
        }
    }

    /// Returns the number of currently active ids.
    #[inline(always)]
    pub fn number_of_nodes_active(&self) -> NumNodes {
        self.num_active
    }

    /// Returns the total number of ids ever defined, active or freed.
    #[inline(always)]
    pub fn number_of_nodes_defined(&self) -> NumNodes {
        self.active.len() as NumNodes
    }

    /// Returns *true* if `n` is currently active.
    #[inline(always)]
    pub fn is_active(&self, n: Node) -> bool {
        self.active[n.index()]
    }

    /// Activates and returns a node id, reusing a freed id if one is available.
    ///
    /// The returned id is appended to the insertion-order list.
    pub fn new_active_node(&mut self) -> Node {
        let n = match self.free.pop() {
            Some(n) => {
                self.ident[n.index()] = n;
                n
            }
            None => {
                let n = Node::new(self.active.len() as NumNodes);
                self.next.push(None);
                self.prev.push(None);
                self.active.push(false);
                self.ident.push(n);
                n
            }
        };

        self.active[n.index()] = true;
        self.num_active += 1;

        self.next[n.index()] = None;
        self.prev[n.index()] = self.tail;
        match self.tail {
            Some(t) => self.next[t.index()] = Some(n),
            None => self.head = Some(n),
        }
        self.tail = Some(n);

        n
    }

    /// Deactivates `n` and returns its id to the free list.
    ///
    /// **Panics in debug builds if `n` is not active or is node `0`.**
    pub fn free_node(&mut self, n: Node) {
        debug_assert!(self.is_active(n));
        debug_assert!(n != Node::ZERO);

        match self.prev[n.index()] {
            Some(p) => self.next[p.index()] = self.next[n.index()],
            None => self.head = self.next[n.index()],
        }
        match self.next[n.index()] {
            Some(s) => self.prev[s.index()] = self.prev[n.index()],
            None => self.tail = self.prev[n.index()],
        }
        self.next[n.index()] = None;
        self.prev[n.index()] = None;

        self.active[n.index()] = false;
        self.num_active -= 1;
        self.free.push(n);
    }

    /// Frees `max` and records `min` as its representative, so that [`NodeManager::find`]
    /// resolves `max` (and anything previously merged into it) to `min`.
    ///
    /// **Panics in debug builds unless `min < max` and both are active.**
    pub fn union_nodes(&mut self, min: Node, max: Node) {
        debug_assert!(min < max);
        debug_assert!(self.is_active(min));
        self.free_node(max);
        self.ident[max.index()] = min;
    }

    /// Resolves `n` to its current representative.
    ///
    /// Active ids are their own representative; ids freed by [`NodeManager::union_nodes`]
    /// resolve through the chain of survivors. Only meaningful until the freed id is
    /// reallocated.
    pub fn find(&self, n: Node) -> Node {
        let mut cur = n;
        loop {
            let rep = self.ident[cur.index()];
            if rep == cur {
                return cur;
            }
            cur = rep;
        }
    }

    /// Iterates over the active ids in insertion order.
    pub fn active_nodes(&self) -> ActiveNodes<'_> {
        ActiveNodes {
            manager: self,
            cur: self.head,
        }
    }

    /// Exchanges the identities of ids `a` and `b` in all bookkeeping: activity, position
    /// in the insertion-order list, and free-list membership.
    ///
    /// Representative links of both ids are reset; callers must not swap while
    /// identifications are pending.
    ///
    /// **Panics if `a == b`.**
    pub fn swap_ids(&mut self, a: Node, b: Node) {
        assert_ne!(a, b);

        match (self.is_active(a), self.is_active(b)) {
            (true, true) => self.swap_in_list(a, b),
            (true, false) => {
                self.replace_in_list(a, b);
                self.replace_in_free(b, a);
            }
            (false, true) => {
                self.replace_in_list(b, a);
                self.replace_in_free(a, b);
            }
            (false, false) => {}
        }

        self.active.swap(a.index(), b.index());
        self.ident[a.index()] = a;
        self.ident[b.index()] = b;
    }

    /// Truncates the id space to `[0, k)`.
    ///
    /// **Panics in debug builds if any id `>= k` is still active.**
    pub fn shrink_to(&mut self, k: NumNodes) {
        let k = k as usize;
        debug_assert!(self.active[k..].iter().all(|&a| !a));

        self.next.truncate(k);
        self.prev.truncate(k);
        self.active.truncate(k);
        self.ident.truncate(k);
        self.free.retain(|n| n.index() < k);
    }

    /// Swaps the positions of two active ids in the insertion-order list.
    fn swap_in_list(&mut self, a: Node, b: Node) {
        if self.next[a.index()] == Some(b) {
            // a immediately precedes b
            let p = self.prev[a.index()];
            let s = self.next[b.index()];
            self.link(p, Some(b));
            self.link(Some(b), Some(a));
            self.link(Some(a), s);
        } else if self.next[b.index()] == Some(a) {
            let p = self.prev[b.index()];
            let s = self.next[a.index()];
            self.link(p, Some(a));
            self.link(Some(a), Some(b));
            self.link(Some(b), s);
        } else {
            let (pa, na) = (self.prev[a.index()], self.next[a.index()]);
            let (pb, nb) = (self.prev[b.index()], self.next[b.index()]);
            self.link(pa, Some(b));
            self.link(Some(b), na);
            self.link(pb, Some(a));
            self.link(Some(a), nb);
        }
    }

    /// Lets `b` take the list position of the active id `a`; `a` is left unlinked.
    fn replace_in_list(&mut self, a: Node, b: Node) {
        let (p, s) = (self.prev[a.index()], self.next[a.index()]);
        self.link(p, Some(b));
        self.link(Some(b), s);
        self.next[a.index()] = None;
        self.prev[a.index()] = None;
    }

    /// Links `p -> s` in the insertion-order list, updating head/tail as needed.
    fn link(&mut self, p: Option<Node>, s: Option<Node>) {
        match p {
            Some(p) => self.next[p.index()] = s,
            None => self.head = s,
        }
        match s {
            Some(s) => self.prev[s.index()] = p,
            None => self.tail = p,
        }
    }

    fn replace_in_free(&mut self, old: Node, new: Node) {
        let slot = self
            .free
            .iter()
            .position(|&n| n == old)
            .expect("freed id must be on the free list");
        self.free[slot] = new;
    }
}

/// Iterator over the active ids of a [`NodeManager`] in insertion order.
pub struct ActiveNodes<'a> {
    manager: &'a NodeManager,
    cur: Option<Node>,
}

impl Iterator for ActiveNodes<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.cur?;
        self.cur = self.manager.next[n.index()];
        Some(n)
    }
}
