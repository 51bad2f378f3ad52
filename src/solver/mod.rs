//! Best and k-best paths of a profile through a graph component.
//!
//! The search space is the product of profile states and cursors. A forward
//! pass builds it column by column, keeping for every `(state, cursor)` node
//! its optimal cost from the begin state together with every incoming link.
//! Paths are then enumerated backwards from the end node, best-first, using
//! the forward optimum of each node as an exact lower bound, so complete
//! paths come out in non-decreasing cost.
//!
//! Delete nodes carry the cursor of the last emission. Before anything was
//! emitted that cursor is empty, and the next match state starts on one of
//! the initial cursors.

mod alignment;

pub use alignment::{compress_states, render_cigar, CigarOp, CigarOpKind, StateKind};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashSet};

use tracing::{debug, warn};

use crate::cursor::{to_path, GraphCursor};
use crate::graph::{EdgeId, GraphComponent};
use crate::hmm::Fees;

const NO_ENTRY: usize = usize::MAX;
const TIE_EPSILON: f64 = 1e-9;
const POP_LIMIT: usize = 2_000_000;

#[derive(Debug, Clone, Copy)]
struct Link {
    from: usize,
    fee: f64,
}

#[derive(Debug, Clone)]
struct Node<C> {
    kind: StateKind,
    column: usize,
    cursor: C,
    best: f64,
    links: Vec<Link>,
}

/// One step of a path: the profile state entered and its cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Step<C> {
    /// State kind.
    pub kind: StateKind,
    /// Model column (0 for begin, M+1 for end).
    pub column: usize,
    /// Cursor emitted by match/insert steps, last emitted cursor otherwise.
    pub cursor: C,
    /// Cost of the link that entered this step.
    pub fee: f64,
}

/// A scored path with its trace.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPath<C> {
    score: f64,
    steps: Vec<Step<C>>,
    cursors: Vec<C>,
}

impl<C: GraphCursor> AnnotatedPath<C> {
    /// Total cost in nats (lower is better): the sum of step fees.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Every step from begin to end.
    pub fn steps(&self) -> &[Step<C>] {
        &self.steps
    }

    /// Emitted cursors in order.
    pub fn cursors(&self) -> &[C] {
        &self.cursors
    }

    /// Residues read by the emitting steps.
    pub fn letters(&self, component: &GraphComponent<'_>) -> Vec<u8> {
        self.cursors.iter().map(|c| c.letter(component)).collect()
    }

    /// Nucleotides under the emitted cursors.
    pub fn nucleotide_sequence(&self, component: &GraphComponent<'_>) -> Vec<u8> {
        self.cursors
            .iter()
            .flat_map(|c| c.nucleotide_cursors())
            .map(|c| c.letter(component))
            .collect()
    }

    /// Edges walked by the emitted cursors.
    pub fn edge_path(&self) -> Vec<EdgeId> {
        to_path(&self.cursors)
    }

    /// Run-length alignment against the profile.
    pub fn alignment(&self) -> Vec<CigarOp> {
        compress_states(self.steps.iter().map(|s| s.kind))
    }

    /// Alignment rendered as `12M1I3M`.
    pub fn alignment_string(&self) -> String {
        render_cigar(&self.alignment())
    }
}

/// Up to k paths in ascending cost.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPaths<C> {
    paths: Vec<AnnotatedPath<C>>,
}

impl<C> TopPaths<C> {
    /// Number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path was found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, AnnotatedPath<C>> {
        self.paths.iter()
    }

    /// Path at `rank`.
    pub fn get(&self, rank: usize) -> Option<&AnnotatedPath<C>> {
        self.paths.get(rank)
    }

    /// Take the paths.
    pub fn into_vec(self) -> Vec<AnnotatedPath<C>> {
        self.paths
    }
}

impl<'a, C> IntoIterator for &'a TopPaths<C> {
    type Item = &'a AnnotatedPath<C>;
    type IntoIter = std::slice::Iter<'a, AnnotatedPath<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// The explored state space of one search.
#[derive(Debug, Clone)]
pub struct PathSet<C> {
    nodes: Vec<Node<C>>,
    begin: usize,
    end: usize,
}

/// Run the forward pass from `initial` cursors.
pub fn find_best_path<C: GraphCursor>(
    fees: &Fees,
    component: &GraphComponent<'_>,
    initial: &[C],
) -> PathSet<C> {
    let mut trellis = Trellis {
        fees,
        component,
        nodes: Vec::new(),
    };
    let (begin, end) = trellis.run(initial);
    debug!(nodes = trellis.nodes.len(), "state space built");
    PathSet {
        nodes: trellis.nodes,
        begin,
        end,
    }
}

impl<C: GraphCursor> PathSet<C> {
    /// Cost of the best path, if any path reaches the end state.
    pub fn best_score(&self) -> Option<f64> {
        let best = self.nodes[self.end].best;
        best.is_finite().then_some(best)
    }

    /// Number of `(state, cursor)` nodes explored.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The `k` lowest-cost paths with distinct cursor traces, ascending by
    /// cost and then by trace.
    pub fn top_k(&self, k: usize) -> TopPaths<C> {
        self.top_k_within(k, POP_LIMIT)
    }

    /// [`top_k`](Self::top_k) stopping after `pop_limit` heap pops.
    fn top_k_within(&self, k: usize, pop_limit: usize) -> TopPaths<C> {
        if k == 0 || self.best_score().is_none() {
            return TopPaths { paths: Vec::new() };
        }

        let mut entries = vec![SuffixEntry {
            node: self.end,
            fee: 0.0,
            next: NO_ENTRY,
        }];
        let mut heap = BinaryHeap::new();
        let mut order = 0u64;
        heap.push(Candidate {
            priority: self.nodes[self.end].best,
            suffix_cost: 0.0,
            entry: 0,
            order,
        });

        let mut seen: HashSet<Vec<C>> = HashSet::new();
        let mut found: Vec<AnnotatedPath<C>> = Vec::new();
        let mut pops = 0usize;

        while let Some(candidate) = heap.pop() {
            if found.len() >= k && candidate.priority > found[k - 1].score + TIE_EPSILON {
                break;
            }
            pops += 1;
            if pops > pop_limit {
                warn!(found = found.len(), "path enumeration stopped at its expansion limit");
                break;
            }

            let node = entries[candidate.entry].node;
            if node == self.begin {
                let path = self.materialize(&entries, candidate.entry);
                if seen.insert(path.cursors.clone()) {
                    found.push(path);
                }
                continue;
            }

            for link in &self.nodes[node].links {
                entries.push(SuffixEntry {
                    node: link.from,
                    fee: link.fee,
                    next: candidate.entry,
                });
                order += 1;
                let suffix_cost = candidate.suffix_cost + link.fee;
                heap.push(Candidate {
                    priority: self.nodes[link.from].best + suffix_cost,
                    suffix_cost,
                    entry: entries.len() - 1,
                    order,
                });
            }
        }

        found.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.cursors.cmp(&b.cursors))
        });
        found.truncate(k);
        TopPaths { paths: found }
    }

    fn materialize(&self, entries: &[SuffixEntry], start: usize) -> AnnotatedPath<C> {
        let mut steps = Vec::new();
        let mut cursors = Vec::new();
        let mut score = 0.0;
        let mut entering_fee = 0.0;
        let mut idx = start;
        while idx != NO_ENTRY {
            let entry = &entries[idx];
            let node = &self.nodes[entry.node];
            score += entering_fee;
            steps.push(Step {
                kind: node.kind,
                column: node.column,
                cursor: node.cursor,
                fee: entering_fee,
            });
            if matches!(node.kind, StateKind::Match | StateKind::Insert) {
                cursors.push(node.cursor);
            }
            entering_fee = entry.fee;
            idx = entry.next;
        }
        AnnotatedPath {
            score,
            steps,
            cursors,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SuffixEntry {
    node: usize,
    // fee of the link from `node` to the entry at `next`
    fee: f64,
    next: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    priority: f64,
    suffix_cost: f64,
    entry: usize,
    order: u64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // reversed: BinaryHeap pops the cheapest, oldest first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

struct Trellis<'f, 'c, 'g, C> {
    fees: &'f Fees,
    component: &'c GraphComponent<'g>,
    nodes: Vec<Node<C>>,
}

type Column<C> = BTreeMap<C, usize>;

impl<'f, 'c, 'g, C: GraphCursor> Trellis<'f, 'c, 'g, C> {
    fn add_node(&mut self, kind: StateKind, column: usize, cursor: C, best: f64) -> usize {
        self.nodes.push(Node {
            kind,
            column,
            cursor,
            best,
            links: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Link `from` into the `(kind, column, cursor)` node of `map`, creating it
    /// on first use. Returns the node when its best cost improved.
    fn link_into(
        &mut self,
        map: &mut Column<C>,
        kind: StateKind,
        column: usize,
        cursor: C,
        from: usize,
        fee: f64,
    ) -> Option<usize> {
        if !fee.is_finite() {
            return None;
        }
        let to = match map.get(&cursor) {
            Some(&to) => to,
            None => {
                let to = self.add_node(kind, column, cursor, f64::INFINITY);
                map.insert(cursor, to);
                to
            }
        };
        self.link(from, to, fee).then_some(to)
    }

    fn link(&mut self, from: usize, to: usize, fee: f64) -> bool {
        if !fee.is_finite() {
            return false;
        }
        let candidate = self.nodes[from].best + fee;
        let node = &mut self.nodes[to];
        node.links.push(Link { from, fee });
        if candidate < node.best {
            node.best = candidate;
            true
        } else {
            false
        }
    }

    fn letter(&self, cursor: C) -> u8 {
        cursor.letter(self.component)
    }

    fn successors(&self, cursor: C, initial: &[C]) -> Vec<C> {
        if cursor.is_empty() {
            initial.to_vec()
        } else {
            cursor.next(self.component)
        }
    }

    fn run(&mut self, initial: &[C]) -> (usize, usize) {
        let fees = self.fees;
        let m = fees.len();
        let mut initial: Vec<C> = initial.iter().copied().filter(|c| !c.is_empty()).collect();
        initial.sort();
        initial.dedup();

        let begin = self.add_node(StateKind::Begin, 0, C::empty(), 0.0);
        let mut all_matches = Vec::new();

        let mut prev_m: Column<C> = Column::new();
        let mut prev_d: Column<C> = Column::new();
        let mut prev_i: Column<C> = Column::new();
        let t0 = *fees.transition(0);
        for &c in &initial {
            let fee = t0.mi + fees.insert_fee(0, self.letter(c));
            self.link_into(&mut prev_i, StateKind::Insert, 0, c, begin, fee);
        }
        self.close_inserts(&mut prev_i, 0);

        for i in 1..=m {
            let t = *fees.transition(i - 1);
            let mut cur_m: Column<C> = Column::new();
            let mut cur_d: Column<C> = Column::new();
            let mut cur_i: Column<C> = Column::new();

            // match column
            for &c in &initial {
                let emit = fees.match_fee(i, self.letter(c));
                if i == 1 {
                    self.link_into(&mut cur_m, StateKind::Match, i, c, begin, t.mm + emit);
                }
                if fees.is_local() {
                    let fee = fees.local_entry() + emit;
                    self.link_into(&mut cur_m, StateKind::Match, i, c, begin, fee);
                }
            }
            for (sources, move_fee) in [(&prev_m, t.mm), (&prev_i, t.im), (&prev_d, t.dm)] {
                for (&c, &u) in sources {
                    for n in self.successors(c, &initial) {
                        let fee = move_fee + fees.match_fee(i, self.letter(n));
                        self.link_into(&mut cur_m, StateKind::Match, i, n, u, fee);
                    }
                }
            }

            // delete column
            if i == 1 {
                self.link_into(&mut cur_d, StateKind::Delete, i, C::empty(), begin, t.md);
            }
            for (sources, move_fee) in [(&prev_m, t.md), (&prev_d, t.dd)] {
                for (&c, &u) in sources {
                    self.link_into(&mut cur_d, StateKind::Delete, i, c, u, move_fee);
                }
            }

            // insert column
            if i < m {
                let ti = *fees.transition(i);
                for (&c, &u) in &cur_m {
                    for n in c.next(self.component) {
                        let fee = ti.mi + fees.insert_fee(i, self.letter(n));
                        self.link_into(&mut cur_i, StateKind::Insert, i, n, u, fee);
                    }
                }
                self.close_inserts(&mut cur_i, i);
            }

            all_matches.extend(cur_m.values().copied());
            prev_m = cur_m;
            prev_d = cur_d;
            prev_i = cur_i;
        }

        let end = self.add_node(StateKind::End, m + 1, C::empty(), f64::INFINITY);
        let tm = *fees.transition(m);
        for &u in prev_m.values() {
            self.link(u, end, tm.mm);
        }
        for (c, &u) in &prev_d {
            if !c.is_empty() {
                self.link(u, end, tm.dm);
            }
        }
        if fees.is_local() {
            for u in all_matches {
                self.link(u, end, fees.local_exit());
            }
        }
        (begin, end)
    }

    /// Settle an insert column with Dijkstra over insert self-transitions.
    fn close_inserts(&mut self, column: &mut Column<C>, i: usize) {
        let ii = self.fees.transition(i).ii;
        let mut heap: BinaryHeap<Candidate> = column
            .values()
            .map(|&u| Candidate {
                priority: self.nodes[u].best,
                suffix_cost: 0.0,
                entry: u,
                order: u as u64,
            })
            .collect();
        let mut settled = HashSet::new();
        while let Some(Candidate { priority, entry: u, .. }) = heap.pop() {
            if priority > self.nodes[u].best || !settled.insert(u) {
                continue;
            }
            let cursor = self.nodes[u].cursor;
            for n in cursor.next(self.component) {
                let fee = ii + self.fees.insert_fee(i, self.letter(n));
                if let Some(v) = self.link_into(column, StateKind::Insert, i, n, u, fee) {
                    heap.push(Candidate {
                        priority: self.nodes[v].best,
                        suffix_cost: 0.0,
                        entry: v,
                        order: v as u64,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{make_aa_cursors, EdgeCursor};
    use crate::graph::{AssemblyGraph, GraphBuilder};
    use crate::hmm::fixtures::profile;
    use crate::hmm::Alphabet;

    const FAMILY: &[u8] = b"ACGTTGCAGGTACCATGACT";

    fn linear() -> (AssemblyGraph, Vec<EdgeId>) {
        // k = 3, pieces of FAMILY overlapping by three nucleotides
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", &FAMILY[..8], 1.0, 5).unwrap();
        let b = builder.add_edge("b", &FAMILY[5..14], 1.0, 6).unwrap();
        let c = builder.add_edge("c", &FAMILY[11..], 1.0, 6).unwrap();
        builder.link(a, b).unwrap();
        builder.link(b, c).unwrap();
        (builder.build(), vec![a, b, c])
    }

    fn starts(component: &GraphComponent<'_>, edge: EdgeId) -> Vec<EdgeCursor> {
        let len = component.graph().nucleotides(edge).len();
        (0..len).map(|pos| EdgeCursor::new(edge, pos)).collect()
    }

    #[test]
    fn best_path_spells_the_family() {
        let (graph, edges) = linear();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));
        let paths = find_best_path(&fees, &component, &starts(&component, edges[0]));

        let expected = fees.all_match_cost(FAMILY).unwrap();
        let best = paths.best_score().unwrap();
        assert!((best - expected).abs() < 1e-9, "{best} vs {expected}");

        let top = paths.top_k(3);
        let first = top.get(0).unwrap();
        assert_eq!(first.letters(&component), FAMILY.to_vec());
        assert_eq!(first.edge_path(), edges);
        assert_eq!(first.alignment_string(), "20M");
        let fee_sum: f64 = first.steps().iter().map(|s| s.fee).sum();
        assert!((first.score() - fee_sum).abs() < 1e-12);
    }

    #[test]
    fn top_k_is_sorted_and_distinct() {
        let (graph, edges) = linear();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));
        let paths = find_best_path(&fees, &component, &starts(&component, edges[0]));
        let top = paths.top_k(10);
        assert_eq!(top.len(), 10);
        let scores: Vec<f64> = top.iter().map(|p| p.score()).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1] + 1e-12));
        let traces: HashSet<Vec<EdgeCursor>> = top.iter().map(|p| p.cursors().to_vec()).collect();
        assert_eq!(traces.len(), 10);
        for path in &top {
            assert!(graph.is_walk(&path.edge_path()));
        }
        assert_eq!(paths.top_k(10), top);
    }

    #[test]
    fn branch_prefers_matching_continuation() {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", &FAMILY[..10], 1.0, 1).unwrap();
        let good = builder.add_edge("good", &FAMILY[7..], 1.0, 1).unwrap();
        let bad = builder.add_edge("bad", b"AGGCTTAGCATTGGA", 1.0, 1).unwrap();
        builder.link(a, good).unwrap();
        builder.link(a, bad).unwrap();
        let graph = builder.build();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));

        let paths = find_best_path(&fees, &component, &starts(&component, a));
        let top = paths.top_k(2);
        assert_eq!(top.get(0).unwrap().edge_path(), vec![a, good]);
        let second = top.get(1).unwrap();
        assert!(second.score() >= top.get(0).unwrap().score());
    }

    #[test]
    fn no_initial_cursors_means_no_path() {
        let (graph, _) = linear();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));
        let paths = find_best_path::<EdgeCursor>(&fees, &component, &[]);
        assert_eq!(paths.best_score(), None);
        assert!(paths.top_k(5).is_empty());
    }

    #[test]
    fn local_mode_accepts_partial_matches() {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", &FAMILY[..12], 1.0, 1).unwrap();
        let graph = builder.build();
        let component = GraphComponent::whole(&graph);
        let hmm = profile("fam", Alphabet::Dna, FAMILY);

        let glocal = Fees::new(&hmm);
        let local = Fees::new(&hmm).with_local(true);
        let initial = starts(&component, a);
        let glocal_best = find_best_path(&glocal, &component, &initial).best_score().unwrap();
        let local_best = find_best_path(&local, &component, &initial).best_score().unwrap();
        assert!(local_best < glocal_best);
    }

    #[test]
    fn codon_cursors_translate_along_the_walk() {
        // MKVLAW with the V codon split over the junction
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", b"ATGAAAG", 1.0, 1).unwrap();
        let b = builder.add_edge("b", b"AAGTGCTGGCGTGG", 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        let graph = builder.build();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("prot", Alphabet::Amino, b"MKVLAW"));

        let initial = make_aa_cursors(&component, &[EdgeCursor::new(a, 0)]);
        let paths = find_best_path(&fees, &component, &initial);
        let best = paths.top_k(1).into_vec().remove(0);
        assert_eq!(best.letters(&component), b"MKVLAW".to_vec());
        assert_eq!(best.edge_path(), vec![a, b]);
        assert_eq!(best.nucleotide_sequence(&component), b"ATGAAAGTGCTGGCGTGG".to_vec());
    }

    #[test]
    fn equal_cost_paths_follow_trace_order() {
        // two arms, each with one mismatch at the same column
        let mut upper = FAMILY[5..14].to_vec();
        let mut lower = upper.clone();
        upper[4] = b'A';
        lower[4] = b'C';
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", &FAMILY[..8], 1.0, 1).unwrap();
        let x = builder.add_edge("x", &upper, 1.0, 1).unwrap();
        let y = builder.add_edge("y", &lower, 1.0, 1).unwrap();
        let c = builder.add_edge("c", &FAMILY[11..], 1.0, 1).unwrap();
        for (from, to) in [(a, x), (a, y), (x, c), (y, c)] {
            builder.link(from, to).unwrap();
        }
        let graph = builder.build();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));

        let top = find_best_path(&fees, &component, &starts(&component, a)).top_k(2);
        assert_eq!(top.len(), 2);
        let (first, second) = (top.get(0).unwrap(), top.get(1).unwrap());
        assert_eq!(first.score(), second.score());
        assert!(first.cursors() < second.cursors());
        assert_eq!(first.edge_path(), vec![a, x, c]);
        assert_eq!(second.edge_path(), vec![a, y, c]);
    }

    #[test]
    fn pop_limit_truncates_to_a_sorted_prefix() {
        let (graph, edges) = linear();
        let component = GraphComponent::whole(&graph);
        let fees = Fees::new(&profile("fam", Alphabet::Dna, FAMILY));
        let paths = find_best_path(&fees, &component, &starts(&component, edges[0]));
        let full = paths.top_k(10);
        assert!(paths.top_k_within(10, 0).is_empty());

        let first_hit = (1..100_000)
            .find(|&limit| !paths.top_k_within(10, limit).is_empty())
            .expect("some limit yields a path");
        let truncated = paths.top_k_within(10, first_hit);
        assert_eq!(truncated.len(), 1);
        assert_eq!(truncated.get(0), full.get(0));

        let wider = paths.top_k_within(10, first_hit * 4);
        assert!(wider.len() <= full.len());
        let scores: Vec<f64> = wider.iter().map(|p| p.score()).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        for (rank, path) in wider.iter().enumerate() {
            assert!((path.score() - full.get(rank).unwrap().score()).abs() < 1e-9);
        }
    }
}
