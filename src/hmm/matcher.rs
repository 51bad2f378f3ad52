//! Local multi-domain profile search of plain sequences.
//!
//! Each target is aligned with a local Viterbi pass in bits; the best domain
//! is traced back, its residues masked, and the pass repeated until no
//! positive-scoring domain remains. Significance follows the model's own
//! calibration lines.

use std::f64::consts::LN_2;
use std::mem;

use bitvec::prelude::*;
use tracing::debug;

use super::config::Thresholds;
use super::{translate, Alphabet, Fees, Hmm, HmmError, HmmerConfig, ScoreDistribution};

/// One aligned region of a target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Domain {
    /// First aligned model column (1-based).
    pub hmm_from: usize,
    /// Last aligned model column (inclusive).
    pub hmm_to: usize,
    /// First aligned residue (1-based).
    pub seq_from: usize,
    /// Last aligned residue (inclusive).
    pub seq_to: usize,
    /// Model length M.
    pub model_len: usize,
    /// Target length L.
    pub seq_len: usize,
    /// Bit score.
    pub score: f64,
    /// P-value of the bit score.
    pub pvalue: f64,
    /// Independent E-value (P-value times number of targets).
    pub ievalue: f64,
    /// Conditional E-value (P-value times number of reported targets).
    pub cevalue: f64,
    /// Passes the domain reporting threshold.
    pub reported: bool,
    /// Passes the domain inclusion threshold.
    pub included: bool,
    /// Model consensus row of the alignment (`.` under insertions).
    pub model_row: String,
    /// Target row: upper case for matches, lower case for insertions, `-` for deletions.
    pub target_row: String,
}

impl Domain {
    /// Signed model columns left over at each end of the target:
    /// `hmm_from - seq_from` and `(M - hmm_to) - (L - seq_to)`.
    pub fn overhangs(&self) -> (i64, i64) {
        let left = self.hmm_from as i64 - self.seq_from as i64;
        let right = (self.model_len as i64 - self.hmm_to as i64)
            - (self.seq_len as i64 - self.seq_to as i64);
        (left, right)
    }
}

/// A target with at least one positive-scoring domain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Hit {
    /// Reference name the target was submitted under.
    pub name: String,
    /// Target length (in residues of the model alphabet).
    pub seq_len: usize,
    /// Sum of domain bit scores.
    pub score: f64,
    /// P-value of `score`.
    pub pvalue: f64,
    /// E-value of `score`.
    pub evalue: f64,
    /// Domains in discovery order.
    pub domains: Vec<Domain>,
    /// Passes the sequence reporting threshold.
    pub reported: bool,
    /// Passes the sequence inclusion threshold.
    pub included: bool,
}

impl Hit {
    /// Highest scoring domain.
    pub fn best_domain(&self) -> Option<&Domain> {
        self.domains.iter().max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Per-stage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PipelineStats {
    /// Targets submitted.
    pub targets: usize,
    /// Residues submitted.
    pub residues: usize,
    /// Targets passing the MSV filter.
    pub passed_msv: usize,
    /// Targets passing the Viterbi filter.
    pub passed_viterbi: usize,
    /// Targets passing the final P-value filter.
    pub passed_forward: usize,
}

/// Accumulates hits of one model over a batch of targets.
#[derive(Debug)]
pub struct HmmMatcher<'h> {
    hmm: &'h Hmm,
    fees: Fees,
    consensus: Vec<u8>,
    config: HmmerConfig,
    thresholds: Thresholds,
    hits: Vec<Hit>,
    stats: PipelineStats,
}

impl<'h> HmmMatcher<'h> {
    /// Prepare a matcher; fails when a requested curated cutoff is missing.
    pub fn new(hmm: &'h Hmm, config: &HmmerConfig) -> Result<Self, HmmError> {
        let thresholds = config.thresholds(hmm)?;
        Ok(Self {
            hmm,
            fees: Fees::new(hmm).with_local(true),
            consensus: hmm.consensus(),
            config: config.clone(),
            thresholds,
            hits: Vec::new(),
            stats: PipelineStats::default(),
        })
    }

    /// Model being searched.
    pub fn hmm(&self) -> &'h Hmm {
        self.hmm
    }

    /// Settings in effect.
    pub fn config(&self) -> &HmmerConfig {
        &self.config
    }

    /// Hits collected so far (sorted once [`summarize`](Self::summarize) ran).
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Stage counters.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Align one target (already in the model alphabet).
    pub fn match_sequence(&mut self, name: &str, seq: &[u8]) {
        self.stats.targets += 1;
        self.stats.residues += seq.len();
        let calibration = *self.hmm.calibration();

        if !self.config.max {
            let msv = msv_score(&self.fees, seq);
            if gumbel_pvalue(msv, calibration.msv) > self.config.f1 {
                return;
            }
        }
        self.stats.passed_msv += 1;

        let mut mask = bitvec![0; seq.len()];
        let mut domains = Vec::new();
        while let Some(aln) = viterbi(&self.fees, &self.consensus, seq, &mask) {
            if aln.score <= 0.0 {
                break;
            }
            if domains.is_empty()
                && !self.config.max
                && gumbel_pvalue(aln.score, calibration.viterbi) > self.config.f2
            {
                return;
            }
            mask[aln.seq_from - 1..aln.seq_to].fill(true);
            domains.push(Domain {
                hmm_from: aln.hmm_from,
                hmm_to: aln.hmm_to,
                seq_from: aln.seq_from,
                seq_to: aln.seq_to,
                model_len: self.hmm.len(),
                seq_len: seq.len(),
                score: aln.score,
                pvalue: exponential_pvalue(aln.score, calibration.forward),
                ievalue: 0.0,
                cevalue: 0.0,
                reported: false,
                included: false,
                model_row: aln.model_row,
                target_row: aln.target_row,
            });
        }
        if domains.is_empty() {
            return;
        }
        self.stats.passed_viterbi += 1;

        let score: f64 = domains.iter().map(|d| d.score).sum();
        let pvalue = exponential_pvalue(score, calibration.forward);
        if !self.config.max && pvalue > self.config.f3 {
            return;
        }
        self.stats.passed_forward += 1;
        debug!(sequence = name, score, domains = domains.len(), "profile hit");

        self.hits.push(Hit {
            name: name.to_string(),
            seq_len: seq.len(),
            score,
            pvalue,
            evalue: 0.0,
            domains,
            reported: false,
            included: false,
        });
    }

    /// Compute E-values, sort hits by significance and apply thresholds.
    pub fn summarize(&mut self) {
        let z = self.stats.targets.max(1) as f64;
        for hit in &mut self.hits {
            hit.evalue = hit.pvalue * z;
            hit.reported = self.thresholds.report.accepts(hit.score, hit.evalue);
            hit.included = self.thresholds.include.accepts(hit.score, hit.evalue);
        }
        self.hits.sort_by(|a, b| {
            a.pvalue
                .total_cmp(&b.pvalue)
                .then(b.score.total_cmp(&a.score))
                .then_with(|| a.name.cmp(&b.name))
        });

        let dom_z = self.hits.iter().filter(|h| h.reported).count().max(1) as f64;
        for hit in &mut self.hits {
            for domain in &mut hit.domains {
                domain.ievalue = domain.pvalue * z;
                domain.cevalue = domain.pvalue * dom_z;
                domain.reported =
                    hit.reported && self.thresholds.dom_report.accepts(domain.score, domain.cevalue);
                domain.included = hit.included
                    && self.thresholds.dom_include.accepts(domain.score, domain.cevalue);
            }
        }
    }
}

/// Score nucleotide `seqs` named by `refs`; amino-acid models see each
/// sequence translated in its three forward frames, named `<ref>/<shift>`.
pub fn score_sequences<'h, S: AsRef<[u8]>>(
    hmm: &'h Hmm,
    seqs: &[S],
    refs: &[String],
    config: &HmmerConfig,
) -> Result<HmmMatcher<'h>, HmmError> {
    let mut matcher = HmmMatcher::new(hmm, config)?;
    for (seq, name) in seqs.iter().zip(refs) {
        let seq = seq.as_ref();
        match hmm.alphabet() {
            Alphabet::Dna => matcher.match_sequence(name, seq),
            Alphabet::Amino => {
                for shift in 0..3 {
                    let protein = translate(seq.get(shift..).unwrap_or_default());
                    matcher.match_sequence(&format!("{name}/{shift}"), &protein);
                }
            }
        }
    }
    matcher.summarize();
    Ok(matcher)
}

fn bits(cost: f64) -> f64 {
    -cost / LN_2
}

fn gumbel_pvalue(score: f64, dist: ScoreDistribution) -> f64 {
    let y = dist.lambda * (score - dist.location);
    -(-(-y).exp()).exp_m1()
}

fn exponential_pvalue(score: f64, dist: ScoreDistribution) -> f64 {
    if score <= dist.location {
        1.0
    } else {
        (-dist.lambda * (score - dist.location)).exp()
    }
}

/// Best ungapped diagonal plus local entry, in bits.
fn msv_score(fees: &Fees, seq: &[u8]) -> f64 {
    let m = fees.len();
    let mut prev = vec![f64::NEG_INFINITY; m + 1];
    let mut cur = vec![f64::NEG_INFINITY; m + 1];
    let mut best = f64::NEG_INFINITY;
    for &letter in seq {
        for k in 1..=m {
            let emit = bits(fees.match_fee(k, letter));
            cur[k] = prev[k - 1].max(0.0) + emit;
            best = best.max(cur[k]);
        }
        mem::swap(&mut prev, &mut cur);
    }
    best + bits(fees.local_entry())
}

struct LocalAlignment {
    score: f64,
    hmm_from: usize,
    hmm_to: usize,
    seq_from: usize,
    seq_to: usize,
    model_row: String,
    target_row: String,
}

const M_SOURCE: u8 = 0b11;
const FROM_ENTRY: u8 = 0;
const FROM_M: u8 = 1;
const FROM_I: u8 = 2;
const FROM_D: u8 = 3;
const I_FROM_I: u8 = 0b100;
const D_FROM_D: u8 = 0b1000;

#[derive(Clone, Copy)]
enum State {
    Match,
    Insert,
    Delete,
}

fn viterbi(fees: &Fees, consensus: &[u8], seq: &[u8], mask: &BitSlice) -> Option<LocalAlignment> {
    let m = fees.len();
    let l = seq.len();
    if m == 0 || l == 0 {
        return None;
    }
    let width = m + 1;
    let entry = bits(fees.local_entry());
    let mut prev_m = vec![f64::NEG_INFINITY; width];
    let mut prev_i = vec![f64::NEG_INFINITY; width];
    let mut prev_d = vec![f64::NEG_INFINITY; width];
    let mut cur_m = vec![f64::NEG_INFINITY; width];
    let mut cur_i = vec![f64::NEG_INFINITY; width];
    let mut cur_d = vec![f64::NEG_INFINITY; width];
    let mut trace = vec![0u8; (l + 1) * width];
    let mut best = (f64::NEG_INFINITY, 0, 0);

    for j in 1..=l {
        cur_m.fill(f64::NEG_INFINITY);
        cur_i.fill(f64::NEG_INFINITY);
        cur_d.fill(f64::NEG_INFINITY);
        let letter = seq[j - 1];
        let open = !mask[j - 1];
        for k in 1..=m {
            let mut tb = 0u8;
            let into = fees.transition(k - 1);
            if open {
                let emit = bits(fees.match_fee(k, letter));
                if emit.is_finite() {
                    let mut source = (entry, FROM_ENTRY);
                    if k > 1 {
                        for candidate in [
                            (prev_m[k - 1] + bits(into.mm), FROM_M),
                            (prev_i[k - 1] + bits(into.im), FROM_I),
                            (prev_d[k - 1] + bits(into.dm), FROM_D),
                        ] {
                            if candidate.0 > source.0 {
                                source = candidate;
                            }
                        }
                    }
                    cur_m[k] = source.0 + emit;
                    tb |= source.1;
                    if cur_m[k] > best.0 {
                        best = (cur_m[k], j, k);
                    }
                }
                if k < m && fees.insert_fee(k, letter).is_finite() {
                    let here = fees.transition(k);
                    let from_m = prev_m[k] + bits(here.mi);
                    let from_i = prev_i[k] + bits(here.ii);
                    if from_i > from_m {
                        cur_i[k] = from_i;
                        tb |= I_FROM_I;
                    } else {
                        cur_i[k] = from_m;
                    }
                }
            }
            if k > 1 {
                let from_m = cur_m[k - 1] + bits(into.md);
                let from_d = cur_d[k - 1] + bits(into.dd);
                if from_d > from_m {
                    cur_d[k] = from_d;
                    tb |= D_FROM_D;
                } else {
                    cur_d[k] = from_m;
                }
            }
            trace[j * width + k] = tb;
        }
        mem::swap(&mut prev_m, &mut cur_m);
        mem::swap(&mut prev_i, &mut cur_i);
        mem::swap(&mut prev_d, &mut cur_d);
    }

    let (score, seq_to, hmm_to) = best;
    if !score.is_finite() {
        return None;
    }

    let (mut j, mut k) = (seq_to, hmm_to);
    let mut state = State::Match;
    let mut model_row = Vec::new();
    let mut target_row = Vec::new();
    let (seq_from, hmm_from) = loop {
        let tb = trace[j * width + k];
        match state {
            State::Match => {
                model_row.push(consensus[k - 1]);
                target_row.push(seq[j - 1].to_ascii_uppercase());
                state = match tb & M_SOURCE {
                    FROM_ENTRY => break (j, k),
                    FROM_M => State::Match,
                    FROM_I => State::Insert,
                    _ => State::Delete,
                };
                j -= 1;
                k -= 1;
            }
            State::Insert => {
                model_row.push(b'.');
                target_row.push(seq[j - 1].to_ascii_lowercase());
                if tb & I_FROM_I == 0 {
                    state = State::Match;
                }
                j -= 1;
            }
            State::Delete => {
                model_row.push(consensus[k - 1]);
                target_row.push(b'-');
                if tb & D_FROM_D == 0 {
                    state = State::Match;
                }
                k -= 1;
            }
        }
    };
    model_row.reverse();
    target_row.reverse();

    Some(LocalAlignment {
        score,
        hmm_from,
        hmm_to,
        seq_from,
        seq_to,
        model_row: String::from_utf8_lossy(&model_row).into_owned(),
        target_row: String::from_utf8_lossy(&target_row).into_owned(),
    })
}
