use std::collections::BTreeSet;

use tracing::{debug, info};

use super::matching::{MatchedEdges, Overhangs};
use crate::graph::{edge_bounded_reach, AssemblyGraph, Direction, EdgeId, VertexId};

/// Vertices around one seed edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbourhood {
    /// Matched edge the neighbourhood was grown from.
    pub seed: EdgeId,
    /// Overhangs of the seed.
    pub overhangs: Overhangs,
    /// Vertex set, seed endpoints included.
    pub vertices: BTreeSet<VertexId>,
    /// Seeds merged into this one.
    pub absorbed: Vec<EdgeId>,
}

impl Neighbourhood {
    /// Whether either endpoint of `edge` lies inside.
    pub fn touches(&self, graph: &AssemblyGraph, edge: EdgeId) -> bool {
        self.vertices.contains(&graph.start(edge)) || self.vertices.contains(&graph.end(edge))
    }
}

/// Grow a neighbourhood around every matched edge. Overhangs are scaled by
/// `mult` into nucleotide budgets for edge-bounded searches from the seed's
/// end (forward) and start (backward).
pub fn extract_neighbourhoods(
    graph: &AssemblyGraph,
    matched: &MatchedEdges,
    mult: i64,
) -> Vec<Neighbourhood> {
    matched
        .iter()
        .map(|(&seed, &overhangs)| {
            let left = overhangs.left.saturating_mul(mult);
            let right = overhangs.right.saturating_mul(mult);
            debug!(edge = %seed, left, right, "edge-bounded search budgets");

            let mut vertices = BTreeSet::new();
            if right > 0 {
                vertices.extend(edge_bounded_reach(
                    graph,
                    graph.end(seed),
                    right as usize,
                    Direction::Forward,
                ));
            }
            if left > 0 {
                vertices.extend(edge_bounded_reach(
                    graph,
                    graph.start(seed),
                    left as usize,
                    Direction::Backward,
                ));
            }
            vertices.insert(graph.start(seed));
            vertices.insert(graph.end(seed));
            Neighbourhood {
                seed,
                overhangs,
                vertices,
                absorbed: Vec::new(),
            }
        })
        .collect()
}

/// Merge neighbourhoods that contain another seed's endpoint.
///
/// Neighbourhoods are ordered by reach (ties by seed) and visited from the
/// widest down; each survivor absorbs every live neighbourhood whose seed
/// touches it, repeating until nothing more touches. No survivor contains an
/// endpoint of another survivor's seed.
pub fn join_components(graph: &AssemblyGraph, neighbourhoods: Vec<Neighbourhood>) -> Vec<Neighbourhood> {
    let mut ordered = neighbourhoods;
    ordered.sort_by_key(|n| (n.overhangs.reach(), n.seed));

    let mut alive = vec![true; ordered.len()];
    for i in (0..ordered.len()).rev() {
        if !alive[i] {
            continue;
        }
        loop {
            let touching: Vec<usize> = (0..ordered.len())
                .filter(|&j| j != i && alive[j] && ordered[i].touches(graph, ordered[j].seed))
                .collect();
            if touching.is_empty() {
                break;
            }
            for j in touching {
                alive[j] = false;
                let absorbed = std::mem::take(&mut ordered[j].absorbed);
                let vertices = std::mem::take(&mut ordered[j].vertices);
                let seed = ordered[j].seed;
                let target = &mut ordered[i];
                target.vertices.extend(vertices);
                target.absorbed.push(seed);
                target.absorbed.extend(absorbed);
            }
        }
    }

    let joined: Vec<Neighbourhood> = ordered
        .into_iter()
        .zip(alive)
        .filter_map(|(n, keep)| keep.then_some(n))
        .collect();
    info!(neighbourhoods = joined.len(), "unique neighbourhoods after joining");
    joined
}
