use super::{Hmm, HmmError};

/// Reporting/inclusion criterion: an E-value ceiling or a bit-score floor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Threshold {
    /// Accept when the E-value is at most this.
    EValue(f64),
    /// Accept when the bit score is at least this.
    Score(f64),
}

impl Threshold {
    /// Whether a (score, E-value) pair passes.
    pub fn accepts(self, score: f64, evalue: f64) -> bool {
        match self {
            Threshold::EValue(max) => evalue <= max,
            Threshold::Score(min) => score >= min,
        }
    }
}

/// Matcher settings mirroring the usual profile-search options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HmmerConfig {
    /// Prefer accessions over names in tabular output.
    pub acc: bool,
    /// Omit alignment rows from the debug dump.
    pub noali: bool,
    /// Sequence reporting E-value.
    pub e: f64,
    /// Sequence reporting score; overrides `e` when set.
    pub t: Option<f64>,
    /// Domain reporting E-value.
    pub dom_e: f64,
    /// Domain reporting score.
    pub dom_t: Option<f64>,
    /// Sequence inclusion E-value.
    pub inc_e: f64,
    /// Sequence inclusion score.
    pub inc_t: Option<f64>,
    /// Domain inclusion E-value.
    pub inc_dom_e: f64,
    /// Domain inclusion score.
    pub inc_dom_t: Option<f64>,
    /// Use the model's gathering cutoffs.
    pub cut_ga: bool,
    /// Use the model's noise cutoffs.
    pub cut_nc: bool,
    /// Use the model's trusted cutoffs.
    pub cut_tc: bool,
    /// Disable the acceleration filters.
    pub max: bool,
    /// MSV filter P-value.
    pub f1: f64,
    /// Viterbi filter P-value.
    pub f2: f64,
    /// Final-stage P-value.
    pub f3: f64,
}

impl Default for HmmerConfig {
    fn default() -> Self {
        Self {
            acc: false,
            noali: false,
            e: 10.0,
            t: None,
            dom_e: 10.0,
            dom_t: None,
            inc_e: 0.01,
            inc_t: None,
            inc_dom_e: 0.01,
            inc_dom_t: None,
            cut_ga: false,
            cut_nc: false,
            cut_tc: false,
            max: false,
            f1: 0.02,
            f2: 1e-3,
            f3: 1e-5,
        }
    }
}

impl HmmerConfig {
    /// Toggle the acceleration filters off.
    pub fn with_max(mut self, max: bool) -> Self {
        self.max = max;
        self
    }

    /// Set the sequence and domain reporting E-values.
    pub fn with_reporting_evalues(mut self, e: f64, dom_e: f64) -> Self {
        self.e = e;
        self.dom_e = dom_e;
        self
    }

    /// Set the sequence and domain inclusion E-values.
    pub fn with_inclusion_evalues(mut self, inc_e: f64, inc_dom_e: f64) -> Self {
        self.inc_e = inc_e;
        self.inc_dom_e = inc_dom_e;
        self
    }

    /// Request the gathering cutoffs.
    pub fn with_cut_ga(mut self, cut_ga: bool) -> Self {
        self.cut_ga = cut_ga;
        self
    }

    /// Resolve the four thresholds for one model.
    pub(crate) fn thresholds(&self, hmm: &Hmm) -> Result<Thresholds, HmmError> {
        let curated = if self.cut_ga {
            Some(("GA", hmm.cutoffs().ga))
        } else if self.cut_tc {
            Some(("TC", hmm.cutoffs().tc))
        } else if self.cut_nc {
            Some(("NC", hmm.cutoffs().nc))
        } else {
            None
        };
        if let Some((cutoff, values)) = curated {
            let (seq, dom) = values.ok_or_else(|| HmmError::MissingCutoff {
                model: hmm.name().to_string(),
                cutoff,
            })?;
            return Ok(Thresholds {
                report: Threshold::Score(seq),
                dom_report: Threshold::Score(dom),
                include: Threshold::Score(seq),
                dom_include: Threshold::Score(dom),
            });
        }
        let pick = |score: Option<f64>, evalue: f64| {
            score.map_or(Threshold::EValue(evalue), Threshold::Score)
        };
        Ok(Thresholds {
            report: pick(self.t, self.e),
            dom_report: pick(self.dom_t, self.dom_e),
            include: pick(self.inc_t, self.inc_e),
            dom_include: pick(self.inc_dom_t, self.inc_dom_e),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Thresholds {
    pub(crate) report: Threshold,
    pub(crate) dom_report: Threshold,
    pub(crate) include: Threshold,
    pub(crate) dom_include: Threshold,
}
