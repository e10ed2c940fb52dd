/*!
# Stephen's Procedure

The completion engine for the word problem over finitely presented semigroups and
monoids. Given a presentation and a word `w`, the engine grows a
[`SourcedGraph`](crate::repr::SourcedGraph) whose paths from node `0` to a computed
**accept state** are labelled by exactly the words equivalent to `w` under the
congruence generated by the relations, and whose paths from node `0` are labelled by
the left factors of that class.

The fixed point combines two closure rules driven by explicit FIFO worklists:

- **Definition**: the word `w` is made readable from node `0`, creating nodes as
  needed.
- **Relation closure**: for a node `q` and a rule `u = v` with one side readable from
  `q` up to an endpoint `p`, the other side is sewn in from `q` to `p`, creating
  interior nodes and queueing a **coincidence** whenever two nodes are discovered to be
  equal. Coincidences are processed eagerly by merging nodes.

The word problem is undecidable in general, so the engine may never converge;
[`Stephen::run`] is cooperatively interruptible through a stop flag and an optional
deadline, and resumes from its preserved worklists on the next call.

# Usage

```
use wgraphs::{presentation::Presentation, stephen::Stephen};

// the idempotent semigroup relation a*a = a
let mut p = Presentation::new();
p.set_alphabet_size(1);
p.add_rule_checked(&[0, 0], &[0]).unwrap();

let mut s = Stephen::new(p).unwrap();
s.set_word(&[0, 0, 0]).unwrap();
s.run().unwrap();

assert!(s.accepts(&[0]).unwrap());
assert!(!s.accepts(&[]).unwrap());
```
*/

use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::{
    algo::{standardise, ShortlexPaths},
    error::{Error, Result},
    node::*,
    presentation::AnyPresentation,
    repr::{SourcedGraph, WordGraph},
    utils::NodeManager,
};

/// The Stephen completion engine.
///
/// Constructed from a [`Presentation`](crate::presentation::Presentation) or an
/// [`InversePresentation`](crate::presentation::InversePresentation), seeded with
/// [`Stephen::set_word`], driven by [`Stephen::run`], and then queried. Setting a new
/// word or presentation resets the graph to the single start node.
pub struct Stephen {
    presentation: AnyPresentation,
    word: Option<Word>,
    graph: SourcedGraph,
    manager: NodeManager,
    accept: Option<Node>,
    finished: bool,
    started: bool,
    dirty: bool,
    poisoned: Option<Error>,
    coincidences: VecDeque<(Node, Node)>,
    work: VecDeque<(Node, usize)>,
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
    standardise_on_finish: bool,
    report_interval: Option<Duration>,
}

impl Stephen {
    /// Creates an engine for the given presentation.
    ///
    /// Fails if the presentation is invalid, or if one of its letters cannot be used as
    /// an edge label (i.e. is not below the alphabet size).
    pub fn new(p: impl Into<AnyPresentation>) -> Result<Self> {
        let presentation = p.into();
        validate_for_engine(&presentation)?;
        let labels = presentation.label_count();

        Ok(Self {
            presentation,
            word: None,
            graph: SourcedGraph::new(1, labels),
            manager: NodeManager::new(),
            accept: None,
            finished: false,
            started: false,
            dirty: false,
            poisoned: None,
            coincidences: VecDeque::new(),
            work: VecDeque::new(),
            stop: Arc::new(AtomicBool::new(false)),
            deadline: None,
            standardise_on_finish: true,
            report_interval: None,
        })
    }

    /// Replaces the presentation; the engine is reset as if newly constructed.
    pub fn init(&mut self, p: impl Into<AnyPresentation>) -> Result<&mut Self> {
        let presentation = p.into();
        validate_for_engine(&presentation)?;
        self.presentation = presentation;
        self.word = None;
        self.reset();
        Ok(self)
    }

    /// Sets the word whose equivalent words and left factors are sought.
    ///
    /// Fails if a letter of `w` is not in the alphabet. Resets the graph, the
    /// worklists, the accept state and the finished flag.
    pub fn set_word(&mut self, w: &[Letter]) -> Result<&mut Self> {
        self.presentation.base().validate_word(w)?;
        self.word = Some(w.to_vec());
        self.reset();
        Ok(self)
    }

    /// Returns the input presentation.
    #[inline]
    pub fn presentation(&self) -> &AnyPresentation {
        &self.presentation
    }

    /// Returns the word set by [`Stephen::set_word`].
    #[inline]
    pub fn word(&self) -> Option<&[Letter]> {
        self.word.as_deref()
    }

    /// Returns the word graph in its present state; the completion is not triggered.
    #[inline]
    pub fn word_graph(&self) -> &WordGraph {
        self.graph.graph()
    }

    /// Returns *true* once [`Stephen::run`] has reached the fixed point.
    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    // ---------- Settings ----------

    /// Sets whether nodes are relabelled to canonical BFS order on convergence
    /// (default: `true`).
    pub fn set_standardise_on_finish(&mut self, yes: bool) {
        self.standardise_on_finish = yes;
    }

    /// Builder-style variant of [`Self::set_standardise_on_finish`].
    pub fn with_standardise_on_finish(mut self, yes: bool) -> Self {
        self.set_standardise_on_finish(yes);
        self
    }

    /// Sets the period with which [`Stephen::run`] emits progress events through
    /// `tracing` (default: off).
    pub fn set_report_interval(&mut self, interval: Option<Duration>) {
        self.report_interval = interval;
    }

    /// Builder-style variant of [`Self::set_report_interval`].
    pub fn with_report_interval(mut self, interval: Option<Duration>) -> Self {
        self.set_report_interval(interval);
        self
    }

    /// Sets an advisory wall-clock deadline; the run loop returns at the next
    /// checkpoint past it.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Returns the cooperative stop flag. Setting it makes the run loop return at the
    /// next checkpoint; the caller clears it before resuming.
    pub fn stop_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    // ---------- Completion ----------

    /// Drives the completion to its fixed point, or to the next interruption.
    ///
    /// Returns `Ok(())` both on convergence and on cancellation; the two are told apart
    /// by [`Stephen::finished`]. A cancelled run leaves the engine in a well-formed
    /// state and a later `run` resumes from the preserved worklists. A second `run` on
    /// a converged engine is a no-op.
    pub fn run(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if let Some(e) = &self.poisoned {
            return Err(e.clone());
        }
        let Some(w) = self.word.clone() else {
            return Err(Error::WordNotSet);
        };

        let start = Instant::now();
        let mut last_report = start;

        if !self.started {
            self.started = true;
            let Self {
                presentation,
                graph,
                manager,
                coincidences,
                ..
            } = self;
            complete_path(graph, manager, &*presentation, coincidences, Node::ZERO, &w);
            self.seed_work();
            self.dirty = false;
        }

        loop {
            if self.process_coincidences()? {
                debug!(elapsed = ?start.elapsed(), "completion interrupted");
                return Ok(());
            }

            let Some((q, i)) = self.work.pop_front() else {
                if self.dirty {
                    // A definition may unlock readability anywhere, so every active
                    // node is re-examined against every rule.
                    self.dirty = false;
                    self.seed_work();
                    continue;
                }
                break;
            };
            if !self.manager.is_active(q) {
                continue;
            }

            let edges_before = self.graph.number_of_edges();
            self.apply_rule(q, i);
            if self.graph.number_of_edges() != edges_before {
                self.dirty = true;
            }

            if self.interrupted() {
                debug!(elapsed = ?start.elapsed(), "completion interrupted");
                return Ok(());
            }
            if let Some(interval) = self.report_interval {
                if last_report.elapsed() >= interval {
                    last_report = Instant::now();
                    info!(
                        nodes_active = self.manager.number_of_nodes_active(),
                        nodes_defined = self.manager.number_of_nodes_defined(),
                        edges = self.graph.number_of_edges(),
                        work = self.work.len(),
                        "completion running"
                    );
                }
            }
        }

        let accept = self
            .graph
            .graph()
            .follow_path(Node::ZERO, &w)
            .expect("the word labels a path at the fixed point");
        self.accept = Some(accept);
        self.finished = true;

        if self.standardise_on_finish {
            let perm = standardise(&mut self.graph, &mut self.manager);
            self.accept = Some(Node::new(perm[accept.index()]));
        }

        debug!(
            nodes = self.graph.number_of_nodes(),
            edges = self.graph.number_of_edges(),
            elapsed = ?start.elapsed(),
            "completion reached its fixed point"
        );
        Ok(())
    }

    /// Runs with a deadline of now plus `budget`; see [`Stephen::run`].
    pub fn run_for(&mut self, budget: Duration) -> Result<()> {
        self.deadline = Some(Instant::now() + budget);
        let result = self.run();
        self.deadline = None;
        result
    }

    // ---------- Queries ----------

    /// Triggers the completion and returns the accept state: the node the engine's
    /// word reaches from node `0`.
    pub fn accept_state(&mut self) -> Result<Node> {
        self.run()?;
        self.accept.ok_or(Error::NotFinished)
    }

    /// Returns *true* iff `w` labels a path from node `0` to the accept state, i.e. is
    /// equivalent to the engine's word. Requires the fixed point; does not mutate.
    pub fn accepts(&self, w: &[Letter]) -> Result<bool> {
        let accept = self.require_finished()?;
        Ok(self.graph.graph().follow_path(Node::ZERO, w) == Some(accept))
    }

    /// Returns *true* iff `w` labels a path from node `0`, i.e. is a left factor of the
    /// engine's word. Requires the fixed point; does not mutate.
    pub fn is_left_factor(&self, w: &[Letter]) -> Result<bool> {
        self.require_finished()?;
        Ok(self.graph.graph().follow_path(Node::ZERO, w).is_some())
    }

    /// Returns the shortlex enumerator of the words equivalent to the engine's word,
    /// with lengths in `[min, max)` (`None` for unbounded).
    pub fn words_accepted(&self, min: usize, max: Option<usize>) -> Result<ShortlexPaths<'_>> {
        let accept = self.require_finished()?;
        Ok(ShortlexPaths::new(self.graph.graph(), Node::ZERO)
            .target(accept)
            .min_length(min)
            .max_length(max))
    }

    /// Returns the shortlex enumerator of the left factors of the engine's word, with
    /// lengths in `[min, max)` (`None` for unbounded).
    pub fn left_factors(&self, min: usize, max: Option<usize>) -> Result<ShortlexPaths<'_>> {
        self.require_finished()?;
        Ok(ShortlexPaths::new(self.graph.graph(), Node::ZERO)
            .min_length(min)
            .max_length(max))
    }

    /// Counts the words equivalent to the engine's word with length in `[min, max)`.
    pub fn number_of_words_accepted(&self, min: usize, max: usize) -> Result<u64> {
        Ok(self.words_accepted(min, Some(max))?.count() as u64)
    }

    /// Counts the left factors of the engine's word with length in `[min, max)`.
    pub fn number_of_left_factors(&self, min: usize, max: usize) -> Result<u64> {
        Ok(self.left_factors(min, Some(max))?.count() as u64)
    }

    /// Returns *true* iff this engine's word and `other`'s word represent the same
    /// element, i.e. each accepts the other's word. Both engines must have reached
    /// their fixed point over the same presentation.
    pub fn equals(&self, other: &Stephen) -> Result<bool> {
        let w = other.word().ok_or(Error::WordNotSet)?;
        let x = self.word().ok_or(Error::WordNotSet)?;
        Ok(self.accepts(w)? && other.accepts(x)?)
    }

    // ---------- Internals ----------

    fn require_finished(&self) -> Result<Node> {
        if self.word.is_none() {
            return Err(Error::WordNotSet);
        }
        if let Some(e) = &self.poisoned {
            return Err(e.clone());
        }
        self.accept.filter(|_| self.finished).ok_or(Error::NotFinished)
    }

    fn reset(&mut self) {
        self.graph = SourcedGraph::new(1, self.presentation.label_count());
        self.manager = NodeManager::new();
        self.coincidences.clear();
        self.work.clear();
        self.accept = None;
        self.finished = false;
        self.started = false;
        self.dirty = false;
        self.poisoned = None;
    }

    fn interrupted(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Enqueues every active node against every rule, in insertion then rule order.
    fn seed_work(&mut self) {
        let nrules = self.presentation.base().number_of_rules();
        let Self { manager, work, .. } = self;
        for q in manager.active_nodes() {
            for i in 0..nrules {
                work.push_back((q, i));
            }
        }
    }

    /// Applies rule `i` at node `q`: if one side is readable from `q`, the other side
    /// is sewn in so both end at the same node.
    fn apply_rule(&mut self, q: Node, i: usize) {
        let nrules = self.presentation.base().number_of_rules();
        let Self {
            presentation,
            graph,
            manager,
            coincidences,
            work,
            ..
        } = self;
        let pres = &*presentation;
        let (u, v) = pres.base().rule(i);

        if let Some(p) = graph.graph().follow_path(q, u) {
            ensure_path(graph, manager, pres, coincidences, work, nrules, q, v, p);
        } else if let Some(p) = graph.graph().follow_path(q, v) {
            ensure_path(graph, manager, pres, coincidences, work, nrules, q, u, p);
        }
    }

    /// Merges queued node pairs until the queue is empty, consulting the stop flag and
    /// deadline between merges. Returns *true* on interruption.
    fn process_coincidences(&mut self) -> Result<bool> {
        while let Some((a, b)) = self.coincidences.pop_front() {
            // Queued pairs may name merged-away nodes; resolve them first.
            let a = self.manager.find(a);
            let b = self.manager.find(b);
            if a == b {
                continue;
            }
            let (min, max) = if a < b { (a, b) } else { (b, a) };

            self.manager.union_nodes(min, max);
            if self.accept == Some(max) {
                self.accept = Some(min);
            }
            self.dirty = true;

            let result = {
                let Self {
                    presentation,
                    graph,
                    coincidences,
                    work,
                    ..
                } = self;
                let pres = &*presentation;
                let nrules = pres.base().number_of_rules();
                graph.merge_nodes(
                    min,
                    max,
                    coincidences,
                    |n, _| (0..nrules).for_each(|i| work.push_back((n, i))),
                    // Every edge of an inverse-presentation graph carries its involuted
                    // back-edge; a merge finding one missing would identify two nodes
                    // whose letter and inverse transitions disagree.
                    |g: &WordGraph, _, label, t| match pres.inverse_of(label) {
                        None => false,
                        Some(inv) => g.target(t, inv).is_none(),
                    },
                )
            };
            if let Err(e) = result {
                self.poisoned = Some(e.clone());
                return Err(e);
            }

            if self.interrupted() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl fmt::Display for Stephen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.word {
            Some(w) => write!(
                f,
                "<Stephen for a {} letter word with {} nodes, {} edges>",
                w.len(),
                self.graph.number_of_nodes(),
                self.graph.number_of_edges()
            ),
            None => write!(f, "<Stephen with no word set>"),
        }
    }
}

fn validate_for_engine(p: &AnyPresentation) -> Result<()> {
    p.validate()?;
    let labels = p.label_count();
    match p.base().alphabet().iter().find(|&&l| l >= labels) {
        None => Ok(()),
        Some(&l) => Err(Error::LetterOutOfBounds {
            letter: l,
            alphabet_size: labels,
        }),
    }
}

/// Activates a node id and grows the graph tables when the id is fresh.
fn new_node(graph: &mut SourcedGraph, manager: &mut NodeManager) -> Node {
    let n = manager.new_active_node();
    if n.raw() >= graph.number_of_nodes() {
        graph.add_nodes(1);
    }
    n
}

/// Defines the edge `s -a-> t`; for an inverse presentation the involuted back-edge
/// `t -a'-> s` is defined alongside, or a coincidence is queued when the back-edge
/// already points elsewhere.
fn def_edge(
    graph: &mut SourcedGraph,
    pres: &AnyPresentation,
    coincidences: &mut VecDeque<(Node, Node)>,
    s: Node,
    t: Node,
    a: Letter,
) {
    graph.add_edge(s, t, a);
    if let Some(inv) = pres.inverse_of(a) {
        match graph.target(t, inv) {
            None => graph.add_edge(t, s, inv),
            Some(u) if u != s => coincidences.push_back((u, s)),
            _ => {}
        }
    }
}

/// Walks `w` from `from`, defining fresh nodes for the missing transitions, and
/// returns the endpoint. The definition rule of the completion.
fn complete_path(
    graph: &mut SourcedGraph,
    manager: &mut NodeManager,
    pres: &AnyPresentation,
    coincidences: &mut VecDeque<(Node, Node)>,
    from: Node,
    w: &[Letter],
) -> Node {
    let mut cur = from;
    for &a in w {
        cur = match graph.target(cur, a) {
            Some(t) => t,
            None => {
                let t = new_node(graph, manager);
                def_edge(graph, pres, coincidences, cur, t, a);
                t
            }
        };
    }
    cur
}

/// Sews the path labelled `w` from `from` to `to`: the readable prefix is reused,
/// missing interior transitions get fresh nodes (enqueued against every rule), and the
/// final edge is tied to `to`. When `w` is fully readable but ends elsewhere, the two
/// endpoints are queued as a coincidence.
#[allow(clippy::too_many_arguments)]
fn ensure_path(
    graph: &mut SourcedGraph,
    manager: &mut NodeManager,
    pres: &AnyPresentation,
    coincidences: &mut VecDeque<(Node, Node)>,
    work: &mut VecDeque<(Node, usize)>,
    nrules: usize,
    from: Node,
    w: &[Letter],
    to: Node,
) {
    if w.is_empty() {
        if from != to {
            coincidences.push_back((from, to));
        }
        return;
    }

    let mut cur = from;
    let mut j = 0;
    while j < w.len() {
        match graph.target(cur, w[j]) {
            Some(t) => {
                cur = t;
                j += 1;
            }
            None => break,
        }
    }
    if j == w.len() {
        if cur != to {
            coincidences.push_back((cur, to));
        }
        return;
    }

    for &a in &w[j..w.len() - 1] {
        let t = new_node(graph, manager);
        def_edge(graph, pres, coincidences, cur, t, a);
        for i in 0..nrules {
            work.push_back((t, i));
        }
        cur = t;
    }
    def_edge(graph, pres, coincidences, cur, to, w[w.len() - 1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{InversePresentation, Presentation};
    use itertools::Itertools;

    fn presentation(letters: NumLetters, rules: &[(&[Letter], &[Letter])]) -> Presentation {
        let mut p = Presentation::new();
        p.set_alphabet_size(letters);
        for (u, v) in rules {
            p.add_rule(u, v);
        }
        p
    }

    fn converged(p: Presentation, w: &[Letter]) -> Stephen {
        let mut s = Stephen::new(p).unwrap();
        s.set_word(w).unwrap();
        s.run().unwrap();
        assert!(s.finished());
        s.graph.audit();
        s
    }

    #[test]
    fn free_semigroup_path() {
        let s = converged(presentation(2, &[]), &[0, 1, 1, 0]);

        assert_eq!(s.word_graph().number_of_nodes(), 5);
        assert_eq!(s.word_graph().number_of_edges(), 4);
        assert!(s.accepts(&[0, 1, 1, 0]).unwrap());
        assert!(!s.accepts(&[0, 1]).unwrap());
        assert!(s.is_left_factor(&[0, 1]).unwrap());
        assert!(!s.is_left_factor(&[1]).unwrap());
    }

    #[test]
    fn single_generator_powers() {
        let mut s = converged(presentation(1, &[]), &[0, 0, 0]);
        assert_eq!(s.word_graph().number_of_nodes(), 4);
        assert_eq!(s.accept_state().unwrap(), Node::new(3));
    }

    #[test]
    fn empty_alphabet_empty_word() {
        let p = Presentation::new().with_empty_word(true);
        let mut s = Stephen::new(p).unwrap();
        s.set_word(&[]).unwrap();
        s.run().unwrap();

        assert!(s.finished());
        assert_eq!(s.accept_state().unwrap(), Node::ZERO);
        assert_eq!(s.word_graph().number_of_nodes(), 1);
        assert!(s.accepts(&[]).unwrap());
        assert_eq!(s.number_of_words_accepted(0, 5).unwrap(), 1);
    }

    #[test]
    fn idempotent_generator_collapses() {
        let mut s = converged(presentation(1, &[(&[0, 0], &[0])]), &[0, 0, 0]);

        assert_eq!(s.word_graph().number_of_nodes(), 2);
        assert_eq!(s.word_graph().target(Node::new(0), 0), Some(Node::new(1)));
        assert_eq!(s.word_graph().target(Node::new(1), 0), Some(Node::new(1)));
        assert_eq!(s.accept_state().unwrap(), Node::new(1));
        for k in 1..6 {
            assert!(s.accepts(&vec![0; k]).unwrap());
        }
        assert!(!s.accepts(&[]).unwrap());
    }

    fn commutative_band() -> Presentation {
        presentation(2, &[(&[0, 0], &[0]), (&[1, 1], &[1]), (&[0, 1], &[1, 0])])
    }

    #[test]
    fn commutative_band_class_of_0101() {
        let s = converged(commutative_band(), &[0, 1, 0, 1]);

        assert!(s.accepts(&[1, 0]).unwrap());
        assert!(s.accepts(&[0, 1]).unwrap());
        assert!(s.accepts(&[1, 0, 1, 0]).unwrap());
        assert!(!s.accepts(&[0, 0, 0]).unwrap());
        assert!(!s.accepts(&[0]).unwrap());

        // the class consists of every word of length 2..=4 using both letters
        assert_eq!(s.number_of_words_accepted(0, 5).unwrap(), 2 + 6 + 14);
    }

    #[test]
    fn cyclic_of_order_four() {
        // x^5 = x, so powers of x eventually cycle with period 4
        let mut s = converged(presentation(1, &[(&[0, 0, 0, 0, 0], &[0])]), &[0; 6]);

        // a stem of length 1 into a 4-cycle
        assert_eq!(s.word_graph().number_of_nodes(), 5);
        assert_eq!(s.word_graph().target(Node::new(4), 0), Some(Node::new(1)));
        assert_eq!(s.accept_state().unwrap(), Node::new(2));
        assert!(s.accepts(&[0, 0]).unwrap());
        assert!(s.accepts(&vec![0; 10]).unwrap());
        assert!(!s.accepts(&[0]).unwrap());
        assert!(!s.accepts(&vec![0; 5]).unwrap());
    }

    #[test]
    fn identified_generators() {
        // With a = b every word of length three is equivalent to 010, so the graph is
        // the length-3 path with both labels in parallel.
        let mut s = converged(presentation(2, &[(&[0], &[1])]), &[0, 1, 0]);

        assert_eq!(s.word_graph().number_of_nodes(), 4);
        for q in 0..3 {
            assert_eq!(
                s.word_graph().target(Node::new(q), 0),
                s.word_graph().target(Node::new(q), 1)
            );
        }
        assert_eq!(s.accept_state().unwrap(), Node::new(3));
        assert_eq!(s.number_of_words_accepted(0, 5).unwrap(), 8);
        for w in (0..3).map(|_| [0u32, 1]).multi_cartesian_product() {
            assert!(s.accepts(&w).unwrap());
        }
        assert!(!s.accepts(&[0]).unwrap());
        assert!(!s.accepts(&[]).unwrap());
    }

    #[test]
    fn commuting_generators() {
        let s = converged(presentation(2, &[(&[0, 1], &[1, 0])]), &[0, 1, 0, 1]);

        for w in [
            [0, 1, 0, 1],
            [1, 0, 1, 0],
            [0, 0, 1, 1],
            [1, 1, 0, 0],
            [0, 1, 1, 0],
            [1, 0, 0, 1],
        ] {
            assert!(s.accepts(&w).unwrap(), "{w:?} must be accepted");
        }
        assert!(!s.accepts(&[0, 1]).unwrap());
        assert_eq!(s.number_of_words_accepted(0, 5).unwrap(), 6);
    }

    #[test]
    fn left_factors_are_prefix_closed() {
        let s = converged(commutative_band(), &[0, 1, 0, 1]);

        for w in s.words_accepted(0, Some(5)).unwrap() {
            for k in 0..=w.len() {
                assert!(s.is_left_factor(&w[..k]).unwrap());
            }
        }

        let factors = s.left_factors(0, Some(2)).unwrap().collect_vec();
        assert_eq!(factors, vec![vec![], vec![0], vec![1]]);
    }

    #[test]
    fn run_is_idempotent() {
        let mut s = converged(commutative_band(), &[0, 1, 0, 1]);

        let edges = s.word_graph().edges().collect_vec();
        let accept = s.accept_state().unwrap();
        s.run().unwrap();
        assert_eq!(s.word_graph().edges().collect_vec(), edges);
        assert_eq!(s.accept_state().unwrap(), accept);
    }

    #[test]
    fn accepts_is_symmetric() {
        let a = converged(commutative_band(), &[0, 1, 0, 1]);
        let b = converged(commutative_band(), &[1, 0, 1, 0]);
        let c = converged(commutative_band(), &[0, 0]);

        assert_eq!(
            a.accepts(b.word().unwrap()).unwrap(),
            b.accepts(a.word().unwrap()).unwrap()
        );
        assert!(a.equals(&b).unwrap());
        assert!(!a.equals(&c).unwrap());
        assert!(a.accepts(a.word().unwrap()).unwrap());
    }

    #[test]
    fn monoid_rule_with_empty_side() {
        // abc = empty word; the class of (abc)^2 contains the empty word, but the left
        // factors include every power of a, so the completion cannot converge. The
        // identification of the word with the start node is still discovered early.
        let p = presentation(3, &[(&[0, 1, 2], &[])]).with_empty_word(true);
        let mut s = Stephen::new(p).unwrap();
        s.set_word(&[0, 1, 2, 0, 1, 2]).unwrap();

        let mut identified = false;
        for _ in 0..200 {
            s.run_for(Duration::from_millis(5)).unwrap();
            assert!(!s.finished());
            if s.word_graph().follow_path(Node::ZERO, &[0, 1, 2, 0, 1, 2]) == Some(Node::ZERO) {
                identified = true;
                break;
            }
        }
        assert!(identified, "(abc)^2 must be identified with the start node");
        s.graph.audit();
    }

    #[test]
    fn inverse_monoid_identifies_word_with_inverse() {
        // In the inverse extension of abc = empty, ab is identified with c^-1.
        let p = presentation(3, &[(&[0, 1, 2], &[])]).with_empty_word(true);
        let ip = InversePresentation::new(p).unwrap();
        let mut s = Stephen::new(ip).unwrap();
        s.set_word(&[0, 1, 2, 0, 1, 2]).unwrap();

        let mut identified = false;
        for _ in 0..200 {
            s.run_for(Duration::from_millis(5)).unwrap();
            let ab = s.word_graph().follow_path(Node::ZERO, &[0, 1]);
            let c_inv = s.word_graph().follow_path(Node::ZERO, &[5]);
            if ab.is_some() && ab == c_inv {
                identified = true;
                break;
            }
        }
        assert!(identified, "ab and c^-1 must reach the same node");
        s.graph.audit();
    }

    #[test]
    fn inverse_free_generator_walks_back() {
        let ip = InversePresentation::new(presentation(1, &[])).unwrap();
        let mut s = Stephen::new(ip).unwrap();
        s.set_word(&[0, 1]).unwrap();
        s.run().unwrap();

        assert!(s.finished());
        assert_eq!(s.word_graph().number_of_nodes(), 2);
        // walking a then its formal inverse returns to the origin
        assert_eq!(
            s.word_graph().follow_path(Node::ZERO, &[0, 1]),
            Some(Node::ZERO)
        );
        assert_eq!(s.accept_state().unwrap(), Node::ZERO);
        assert!(s.accepts(&[0, 1]).unwrap());
        assert!(s.accepts(&[0, 1, 0, 1]).unwrap());
        assert!(!s.accepts(&[1]).unwrap());
        s.graph.audit();
    }

    #[test]
    fn cancellation_preserves_state() {
        let p = presentation(3, &[(&[0, 1, 2], &[])]).with_empty_word(true);
        let mut s = Stephen::new(p).unwrap();
        s.set_word(&[0, 1, 2, 0, 1, 2]).unwrap();

        // a pre-set stop flag cancels at the first checkpoint
        let stop = s.stop_token();
        stop.store(true, Ordering::Relaxed);
        s.run().unwrap();
        assert!(!s.finished());

        // cleared flag plus a concurrent canceller: the run returns, resumably
        stop.store(false, Ordering::Relaxed);
        let canceller = {
            let stop = s.stop_token();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                stop.store(true, Ordering::Relaxed);
            })
        };
        s.run().unwrap();
        canceller.join().unwrap();
        assert!(!s.finished());
        s.graph.audit();

        // queries against the unfinished state are refused, resumption still works
        assert_eq!(s.accepts(&[]), Err(Error::NotFinished));
        stop.store(false, Ordering::Relaxed);
        s.run_for(Duration::from_millis(5)).unwrap();
        assert!(!s.finished());
        s.graph.audit();

        // and a new word starts from scratch
        s.set_word(&[0]).unwrap();
        assert_eq!(s.word_graph().number_of_nodes(), 1);
    }

    #[test]
    fn word_and_state_errors() {
        let mut s = Stephen::new(commutative_band()).unwrap();
        assert_eq!(s.run(), Err(Error::WordNotSet));
        assert_eq!(s.accepts(&[0]), Err(Error::WordNotSet));

        s.set_word(&[0, 1]).unwrap();
        assert_eq!(s.accepts(&[0]), Err(Error::NotFinished));

        assert_eq!(
            s.set_word(&[7]).err(),
            Some(Error::LetterOutOfBounds {
                letter: 7,
                alphabet_size: 2
            })
        );

        let bad = {
            let mut p = Presentation::new();
            p.set_alphabet(&[5, 7]).unwrap();
            Stephen::new(p)
        };
        assert_eq!(
            bad.err(),
            Some(Error::LetterOutOfBounds {
                letter: 5,
                alphabet_size: 2
            })
        );

        // replacing the presentation resets the engine, including the word
        s.init(commutative_band()).unwrap();
        assert_eq!(s.run(), Err(Error::WordNotSet));
    }

    #[test]
    fn shortlex_enumeration_of_accepted_words() {
        let s = converged(commutative_band(), &[0, 1, 0, 1]);

        let words = s.words_accepted(0, Some(3)).unwrap().collect_vec();
        assert_eq!(words, vec![vec![0, 1], vec![1, 0]]);

        // restartable and lazy
        let mut more = s.words_accepted(0, None).unwrap();
        assert_eq!(more.next(), Some(vec![0, 1]));
        more.restart();
        assert_eq!(more.next(), Some(vec![0, 1]));
    }

    #[test]
    fn standardisation_gives_canonical_ids() {
        let s = converged(commutative_band(), &[0, 1, 0, 1]);
        // BFS from 0: node 1 via letter 0, node 2 via letter 1, then their meet
        let g = s.word_graph();
        assert_eq!(g.target(Node::new(0), 0), Some(Node::new(1)));
        assert_eq!(g.target(Node::new(0), 1), Some(Node::new(2)));

        let mut unstandardised = Stephen::new(commutative_band())
            .unwrap()
            .with_standardise_on_finish(false);
        unstandardised.set_word(&[0, 1, 0, 1]).unwrap();
        unstandardised.run().unwrap();
        // same language either way
        for w in s.words_accepted(0, Some(5)).unwrap() {
            assert!(unstandardised.accepts(&w).unwrap());
        }
    }

    #[test]
    fn display_summary() {
        let mut s = Stephen::new(commutative_band()).unwrap();
        assert_eq!(s.to_string(), "<Stephen with no word set>");

        s.set_word(&[0, 1, 0, 1]).unwrap();
        s.run().unwrap();
        assert!(s.to_string().starts_with("<Stephen for a 4 letter word with"));
    }

    #[test]
    fn report_interval_smoke() {
        let mut s = Stephen::new(commutative_band())
            .unwrap()
            .with_report_interval(Some(Duration::ZERO));
        s.set_word(&[0, 1, 0, 1]).unwrap();
        s.run().unwrap();
        assert!(s.finished());
    }

    #[test]
    fn explicit_alphabet_in_label_range() {
        // letters need not be sorted, only usable as labels
        let mut p = Presentation::new();
        p.set_alphabet(&[1, 0]).unwrap();
        p.add_rule(&[0, 0], &[0]);
        let mut s = Stephen::new(p).unwrap();
        s.set_word(&[0, 0]).unwrap();
        s.run().unwrap();
        assert!(s.accepts(&[0]).unwrap());
    }
}
