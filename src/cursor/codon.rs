use std::collections::BTreeSet;

use super::{EdgeCursor, GraphCursor};
use crate::graph::GraphComponent;
use crate::hmm::translate_codon;

/// Three consecutive nucleotide cursors read as one amino acid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CodonCursor([EdgeCursor; 3]);

impl CodonCursor {
    /// Codon made of three consecutive positions.
    pub fn new(cursors: [EdgeCursor; 3]) -> Self {
        Self(cursors)
    }

    /// The underlying nucleotide cursors.
    pub fn cursors(&self) -> &[EdgeCursor; 3] {
        &self.0
    }
}

impl GraphCursor for CodonCursor {
    fn empty() -> Self {
        Self([EdgeCursor::empty(); 3])
    }

    fn is_empty(&self) -> bool {
        self.0[0].is_empty()
    }

    fn letter(&self, component: &GraphComponent<'_>) -> u8 {
        translate_codon([
            self.0[0].letter(component),
            self.0[1].letter(component),
            self.0[2].letter(component),
        ])
    }

    fn next(&self, component: &GraphComponent<'_>) -> Vec<Self> {
        let mut out = Vec::new();
        for first in self.0[2].next(component) {
            for second in first.next(component) {
                for third in second.next(component) {
                    out.push(Self([first, second, third]));
                }
            }
        }
        out
    }

    fn prev(&self, component: &GraphComponent<'_>) -> Vec<Self> {
        let mut out = Vec::new();
        for third in self.0[0].prev(component) {
            for second in third.prev(component) {
                for first in second.prev(component) {
                    out.push(Self([first, second, third]));
                }
            }
        }
        out
    }

    fn nucleotide_cursors(&self) -> Vec<EdgeCursor> {
        self.0.to_vec()
    }
}

/// Codons starting at each of `starts`, one per distinct two-step forward
/// continuation; sorted and deduplicated.
pub fn make_aa_cursors(component: &GraphComponent<'_>, starts: &[EdgeCursor]) -> Vec<CodonCursor> {
    let mut codons = BTreeSet::new();
    for &first in starts.iter().filter(|c| !c.is_empty()) {
        for second in first.next(component) {
            for third in second.next(component) {
                codons.insert(CodonCursor([first, second, third]));
            }
        }
    }
    codons.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn codon_split_across_junction_expands_per_branch() {
        // k = 3; after a's TTG, b continues with CAA and c with GAC
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", b"ATGTTG", 1.0, 1).unwrap();
        let b = builder.add_edge("b", b"TTGCAAT", 1.0, 1).unwrap();
        let c = builder.add_edge("c", b"TTGGACC", 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        builder.link(a, c).unwrap();
        let graph = builder.build();
        let component = GraphComponent::whole(&graph);

        let start = make_aa_cursors(&component, &[EdgeCursor::new(a, 0)]);
        assert_eq!(start.len(), 1);
        assert_eq!(start[0].letter(&component), b'M');

        let second = start[0].next(&component);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].letter(&component), b'L');

        let third = second[0].next(&component);
        assert_eq!(third.len(), 2);
        let letters: BTreeSet<u8> = third.iter().map(|c| c.letter(&component)).collect();
        // CAA = Q on b, GAC = D on c
        assert_eq!(letters, [b'D', b'Q'].into_iter().collect());
        for codon in &third {
            let positions: Vec<usize> =
                codon.cursors().iter().map(|c| c.position()).collect();
            assert_eq!(positions, [3, 4, 5]);
            assert_eq!(codon.prev(&component).len(), 1);
        }
    }
}
