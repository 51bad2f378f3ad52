use std::collections::BTreeMap;

use crate::graph::{AssemblyGraph, EdgeId};
use crate::hmm::{score_sequences, Hmm, HmmError, HmmMatcher, HmmerConfig};

/// Signed profile columns left beyond each end of a matched edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Overhangs {
    /// Columns before the edge start.
    pub left: i64,
    /// Columns after the edge end.
    pub right: i64,
}

impl Overhangs {
    /// Coordinate-wise maximum.
    pub fn merge(self, other: Overhangs) -> Overhangs {
        Overhangs {
            left: self.left.max(other.left),
            right: self.right.max(other.right),
        }
    }

    /// Positive reach, used to order neighbourhoods.
    pub fn reach(self) -> i64 {
        self.left.max(0) + self.right.max(0)
    }
}

/// Matched edges with their merged overhangs, in edge order.
pub type MatchedEdges = BTreeMap<EdgeId, Overhangs>;

/// Score the labels of `edges`; targets are named by their index in `edges`.
pub fn score_edges<'h>(
    graph: &AssemblyGraph,
    edges: &[EdgeId],
    hmm: &'h Hmm,
    config: &HmmerConfig,
) -> Result<HmmMatcher<'h>, HmmError> {
    let seqs: Vec<&[u8]> = edges.iter().map(|&e| graph.nucleotides(e)).collect();
    let refs: Vec<String> = (0..edges.len()).map(|idx| idx.to_string()).collect();
    score_sequences(hmm, &seqs, &refs, config)
}

/// Edges carrying a reported and included hit, with overhangs maximised
/// over all of their domains.
pub fn matched_edges(edges: &[EdgeId], matcher: &HmmMatcher<'_>) -> MatchedEdges {
    let mut matched = MatchedEdges::new();
    for hit in matcher.hits().iter().filter(|h| h.reported && h.included) {
        let index = hit
            .name
            .split('/')
            .next()
            .and_then(|token| token.parse::<usize>().ok());
        let Some(&edge) = index.and_then(|idx| edges.get(idx)) else {
            continue;
        };
        for domain in &hit.domains {
            let (left, right) = domain.overhangs();
            let found = Overhangs { left, right };
            matched
                .entry(edge)
                .and_modify(|o: &mut Overhangs| *o = o.merge(found))
                .or_insert(found);
        }
    }
    matched
}
