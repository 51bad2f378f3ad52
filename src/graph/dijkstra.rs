use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::{AssemblyGraph, VertexId};

/// Which incident edges a search follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow outgoing edges.
    Forward,
    /// Follow incoming edges.
    Backward,
}

/// Vertices reachable from `source` within `bound`, where each traversed edge
/// costs its length.
///
/// Returned in settlement order (non-decreasing distance, ties by id), the
/// source first.
pub fn edge_bounded_reach(
    graph: &AssemblyGraph,
    source: VertexId,
    bound: usize,
    direction: Direction,
) -> Vec<VertexId> {
    let mut best: HashMap<VertexId, usize> = HashMap::new();
    let mut heap = BinaryHeap::new();
    let mut reached = Vec::new();

    best.insert(source, 0);
    heap.push(Reverse((0usize, source)));

    while let Some(Reverse((dist, v))) = heap.pop() {
        if best.get(&v).is_some_and(|&d| d < dist) {
            continue;
        }
        reached.push(v);

        let edges = match direction {
            Direction::Forward => graph.outgoing(v),
            Direction::Backward => graph.incoming(v),
        };
        for &e in edges {
            let next = match direction {
                Direction::Forward => graph.end(e),
                Direction::Backward => graph.start(e),
            };
            let candidate = dist + graph.length(e);
            if candidate > bound {
                continue;
            }
            if best.get(&next).map_or(true, |&d| candidate < d) {
                best.insert(next, candidate);
                heap.push(Reverse((candidate, next)));
            }
        }
    }

    reached
}
