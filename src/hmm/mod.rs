//! Profile HMM adapter: HMMER3 model parsing, solver fees and the
//! sequence-versus-profile matcher used to seed the graph search.
//!
//! All probabilities are kept as costs (negative natural logarithms). The
//! matcher converts them to bit scores internally because its reporting
//! thresholds and calibration are expressed in bits.

mod alphabet;
mod config;
mod fees;
mod matcher;
mod parser;
mod tabular;

#[cfg(test)]
pub(crate) mod fixtures;

pub use alphabet::{translate, translate_codon, Alphabet, Residue};
pub use config::{HmmerConfig, Threshold};
pub use fees::{Fees, TransitionFees};
pub use matcher::{score_sequences, Domain, Hit, HmmMatcher, PipelineStats};
pub use parser::{parse_hmm_file, read_hmms};
pub use tabular::{
    render_domain_table, render_target_table, write_domtblout, write_pfamtblout, write_tblout,
};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Index into a node's seven transitions, in file column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// M_i → M_{i+1}
    MM = 0,
    /// M_i → I_i
    MI = 1,
    /// M_i → D_{i+1}
    MD = 2,
    /// I_i → M_{i+1}
    IM = 3,
    /// I_i → I_i
    II = 4,
    /// D_i → M_{i+1}
    DM = 5,
    /// D_i → D_{i+1}
    DD = 6,
}

/// Location/scale pair of a calibrated score distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoreDistribution {
    /// Location (μ for Gumbel, τ for the exponential tail).
    pub location: f64,
    /// Slope λ.
    pub lambda: f64,
}

/// Calibration lines (`STATS LOCAL ...`) of a model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Calibration {
    /// Gumbel parameters of the ungapped MSV filter.
    pub msv: ScoreDistribution,
    /// Gumbel parameters of the Viterbi filter.
    pub viterbi: ScoreDistribution,
    /// Exponential tail of the full scores.
    pub forward: ScoreDistribution,
}

/// Curated score cutoffs (`GA`, `TC`, `NC`), each as (sequence, domain) bits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cutoffs {
    /// Gathering threshold.
    pub ga: Option<(f64, f64)>,
    /// Trusted cutoff.
    pub tc: Option<(f64, f64)>,
    /// Noise cutoff.
    pub nc: Option<(f64, f64)>,
}

/// A parsed profile HMM.
///
/// Node 0 holds the begin state's transitions and insert emissions; nodes
/// `1..=len()` hold the match columns.
#[derive(Debug, Clone)]
pub struct Hmm {
    pub(crate) name: String,
    pub(crate) accession: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) alphabet: Alphabet,
    pub(crate) match_costs: Vec<Vec<f64>>,
    pub(crate) insert_costs: Vec<Vec<f64>>,
    pub(crate) transitions: Vec<[f64; 7]>,
    pub(crate) calibration: Calibration,
    pub(crate) cutoffs: Cutoffs,
}

impl Hmm {
    /// Model name (`NAME`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accession (`ACC`), if any.
    pub fn accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }

    /// Description (`DESC`), if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Residue alphabet.
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Number of match columns (M).
    pub fn len(&self) -> usize {
        self.match_costs.len() - 1
    }

    /// Whether the model has no match columns; never true for a parsed model.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `-ln p` of emitting canonical symbol `symbol` from match column `node`.
    pub fn match_cost(&self, node: usize, symbol: usize) -> f64 {
        self.match_costs[node][symbol]
    }

    /// `-ln p` of emitting canonical symbol `symbol` from insert state `node`.
    pub fn insert_cost(&self, node: usize, symbol: usize) -> f64 {
        self.insert_costs[node][symbol]
    }

    /// `-ln p` of a transition leaving node `node`.
    pub fn transition_cost(&self, node: usize, transition: Transition) -> f64 {
        self.transitions[node][transition as usize]
    }

    /// Score calibration.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Curated cutoffs.
    pub fn cutoffs(&self) -> &Cutoffs {
        &self.cutoffs
    }

    /// Most probable residue of every match column, as an ASCII string.
    pub fn consensus(&self) -> Vec<u8> {
        let symbols = self.alphabet.symbols();
        self.match_costs[1..]
            .iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .map_or(0, |(idx, _)| idx);
                symbols[best]
            })
            .collect()
    }
}

/// Errors raised while reading profiles or running the matcher.
#[derive(Debug, Error)]
pub enum HmmError {
    /// Profile file could not be read.
    #[error("cannot read profile file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Original I/O error.
        source: io::Error,
    },

    /// Malformed profile text.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The file held no model at all.
    #[error("no profile found in {0}")]
    Empty(PathBuf),

    /// A curated cutoff was requested but the model does not define it.
    #[error("model '{model}' has no {cutoff} cutoff")]
    MissingCutoff {
        /// Model name.
        model: String,
        /// `GA`, `TC` or `NC`.
        cutoff: &'static str,
    },
}
