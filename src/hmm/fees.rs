//! Per-node costs consumed by the graph solver and the matcher.
//!
//! Match emissions are negative log-odds against the alphabet background, so
//! a residue the model likes costs less than zero. Insert emissions score as
//! background and therefore cost nothing.

use super::{Alphabet, Hmm, Residue, Transition};

/// Transition costs leaving one node (`-ln p`, infinite when forbidden).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFees {
    /// M → M
    pub mm: f64,
    /// M → I
    pub mi: f64,
    /// M → D
    pub md: f64,
    /// I → M
    pub im: f64,
    /// I → I
    pub ii: f64,
    /// D → M
    pub dm: f64,
    /// D → D
    pub dd: f64,
}

/// Cost tables of one profile.
#[derive(Debug, Clone)]
pub struct Fees {
    alphabet: Alphabet,
    length: usize,
    // K canonical columns followed by the degenerate-symbol column
    match_fees: Vec<Vec<f64>>,
    transitions: Vec<TransitionFees>,
    local: bool,
}

impl Fees {
    /// Derive fees from a parsed model (glocal mode).
    pub fn new(hmm: &Hmm) -> Self {
        let alphabet = hmm.alphabet();
        let background = alphabet.background();
        let match_fees = (0..=hmm.len())
            .map(|node| {
                let mut row: Vec<f64> = background
                    .iter()
                    .enumerate()
                    .map(|(symbol, bg)| hmm.match_cost(node, symbol) + bg.ln())
                    .collect();
                row.push(degenerate_fee(&row, background));
                row
            })
            .collect();
        let transitions = (0..=hmm.len())
            .map(|node| TransitionFees {
                mm: hmm.transition_cost(node, Transition::MM),
                mi: hmm.transition_cost(node, Transition::MI),
                md: hmm.transition_cost(node, Transition::MD),
                im: hmm.transition_cost(node, Transition::IM),
                ii: hmm.transition_cost(node, Transition::II),
                dm: hmm.transition_cost(node, Transition::DM),
                dd: hmm.transition_cost(node, Transition::DD),
            })
            .collect();
        Self {
            alphabet,
            length: hmm.len(),
            match_fees,
            transitions,
            local: false,
        }
    }

    /// Allow entering at any match column and leaving from any match column.
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Whether local entry/exit is enabled.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Model length M.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether M is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Alphabet the fees are indexed by.
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Transitions leaving node `node` (0 is the begin node).
    pub fn transition(&self, node: usize) -> &TransitionFees {
        &self.transitions[node]
    }

    /// Cost of emitting `letter` from match column `node`.
    pub fn match_fee(&self, node: usize, letter: u8) -> f64 {
        let row = &self.match_fees[node];
        match self.alphabet.residue(letter) {
            Residue::Canonical(symbol) => row[symbol],
            Residue::Degenerate => row[self.alphabet.size()],
            Residue::Forbidden => f64::INFINITY,
        }
    }

    /// Cost of emitting `letter` from insert state `node`.
    pub fn insert_fee(&self, _node: usize, letter: u8) -> f64 {
        match self.alphabet.residue(letter) {
            Residue::Forbidden => f64::INFINITY,
            _ => 0.0,
        }
    }

    /// Cost of jumping from begin straight into a match column in local mode.
    pub fn local_entry(&self) -> f64 {
        let m = self.length as f64;
        -(2.0 / (m * (m + 1.0))).ln()
    }

    /// Cost of leaving a match column for the end state in local mode.
    pub fn local_exit(&self) -> f64 {
        0.0
    }

    /// Cost of the all-match glocal alignment of `seq`; `None` unless
    /// `seq.len() == M`.
    pub fn all_match_cost(&self, seq: &[u8]) -> Option<f64> {
        if seq.len() != self.length {
            return None;
        }
        let emissions: f64 = seq
            .iter()
            .enumerate()
            .map(|(idx, &letter)| self.match_fee(idx + 1, letter))
            .sum();
        let moves: f64 = (0..=self.length).map(|node| self.transitions[node].mm).sum();
        Some(emissions + moves)
    }
}

fn degenerate_fee(row: &[f64], background: &[f64]) -> f64 {
    let (weighted, mass) = row
        .iter()
        .zip(background)
        .filter(|(fee, _)| fee.is_finite())
        .fold((0.0, 0.0), |(sum, mass), (fee, bg)| (sum + fee * bg, mass + bg));
    if mass > 0.0 {
        weighted / mass
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::fixtures::profile;

    #[test]
    fn match_fees_are_log_odds() {
        let fees = Fees::new(&profile("toy", Alphabet::Dna, b"ACGT"));
        let expected = -(0.85f64 / 0.25).ln();
        assert!((fees.match_fee(1, b'A') - expected).abs() < 1e-4);
        assert!((fees.match_fee(1, b'c') + (0.05f64 / 0.25).ln()).abs() < 1e-4);
        assert!(fees.match_fee(1, b'*').is_infinite());
        assert_eq!(fees.insert_fee(2, b'G'), 0.0);
    }

    #[test]
    fn degenerate_symbols_average_over_background() {
        let fees = Fees::new(&profile("toy", Alphabet::Dna, b"ACGT"));
        let mean: f64 = b"ACGT".iter().map(|&b| fees.match_fee(2, b)).sum::<f64>() / 4.0;
        assert!((fees.match_fee(2, b'N') - mean).abs() < 1e-12);
    }

    #[test]
    fn local_entry_is_uniform_over_columns() {
        let fees = Fees::new(&profile("toy", Alphabet::Dna, b"ACGT")).with_local(true);
        assert!(fees.is_local());
        assert!((fees.local_entry() - 10.0f64.ln()).abs() < 1e-12);
        assert_eq!(fees.local_exit(), 0.0);
    }

    #[test]
    fn consensus_is_cheaper_than_mismatch() {
        let fees = Fees::new(&profile("toy", Alphabet::Dna, b"ACGT"));
        let good = fees.all_match_cost(b"ACGT").unwrap();
        let bad = fees.all_match_cost(b"ACCT").unwrap();
        assert!(good < bad);
        assert!(fees.all_match_cost(b"ACG").is_none());
    }
}
