//! Cursors: positions inside a graph component that behave like the letters
//! of a branching sequence.
//!
//! An [`EdgeCursor`] points at one nucleotide of an edge label. Stepping past
//! the last nucleotide of an edge fans out into every outgoing edge of the
//! component, skipping the `k` nucleotides the edges share. A
//! [`CodonCursor`] groups three consecutive nucleotide cursors and reads as
//! one amino acid; its successors are every three-step walk from its last
//! nucleotide, so a codon split across a junction yields one cursor per
//! branch and the reading frame is kept.

mod codon;
mod edge;

pub use codon::{make_aa_cursors, CodonCursor};
pub use edge::EdgeCursor;

use std::collections::{BTreeSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use crate::graph::{EdgeId, GraphComponent};

/// Capabilities the solver needs from a position type.
pub trait GraphCursor: Copy + Eq + Hash + Ord + Debug {
    /// Sentinel for "before the first emission".
    fn empty() -> Self;

    /// Whether this is the sentinel.
    fn is_empty(&self) -> bool;

    /// Residue under the cursor (nucleotide or amino acid).
    fn letter(&self, component: &GraphComponent<'_>) -> u8;

    /// Successors inside the component.
    fn next(&self, component: &GraphComponent<'_>) -> Vec<Self>;

    /// Predecessors inside the component.
    fn prev(&self, component: &GraphComponent<'_>) -> Vec<Self>;

    /// Nucleotide positions covered, in walk order.
    fn nucleotide_cursors(&self) -> Vec<EdgeCursor>;

    /// Edge of the last covered nucleotide.
    fn edge(&self) -> EdgeId {
        self.nucleotide_cursors()
            .last()
            .map_or(EdgeId::NONE, |c| c.edge())
    }
}

/// Cursors reachable from `start` in at most `depth` steps, following
/// `next` when `forward` and `prev` otherwise. `start` is included.
pub fn depth_subset<C: GraphCursor>(
    component: &GraphComponent<'_>,
    start: &[C],
    depth: usize,
    forward: bool,
) -> BTreeSet<C> {
    let mut seen: BTreeSet<C> = start.iter().copied().filter(|c| !c.is_empty()).collect();
    let mut queue: VecDeque<(C, usize)> = seen.iter().map(|&c| (c, 0)).collect();
    while let Some((cursor, steps)) = queue.pop_front() {
        if steps == depth {
            continue;
        }
        let neighbours = if forward {
            cursor.next(component)
        } else {
            cursor.prev(component)
        };
        for neighbour in neighbours {
            if seen.insert(neighbour) {
                queue.push_back((neighbour, steps + 1));
            }
        }
    }
    seen
}

/// Edges walked by a cursor trace: a new entry whenever the edge changes or
/// the position wraps back on the same edge.
pub fn to_path<C: GraphCursor>(cursors: &[C]) -> Vec<EdgeId> {
    let mut path = Vec::new();
    let mut last: Option<EdgeCursor> = None;
    for cursor in cursors.iter().flat_map(|c| c.nucleotide_cursors()) {
        if cursor.is_empty() {
            continue;
        }
        let fresh = last.map_or(true, |prev| {
            prev.edge() != cursor.edge() || cursor.position() <= prev.position()
        });
        if fresh {
            path.push(cursor.edge());
        }
        last = Some(cursor);
    }
    path
}
