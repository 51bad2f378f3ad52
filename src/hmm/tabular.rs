//! Tabular hit reports in the column layout of the standard profile tools,
//! plus the human-readable tables of the debug dump.

use std::fmt::Write as _;
use std::io::{self, Write};

use super::HmmMatcher;

fn query_labels<'a>(matcher: &'a HmmMatcher<'_>) -> (&'a str, &'a str) {
    let hmm = matcher.hmm();
    let accession = hmm.accession().unwrap_or("-");
    if matcher.config().acc && hmm.accession().is_some() {
        (accession, accession)
    } else {
        (hmm.name(), accession)
    }
}

/// Per-target table (`--tblout`); reported hits only.
pub fn write_tblout<W: Write>(out: &mut W, matcher: &HmmMatcher<'_>) -> io::Result<()> {
    let (query, query_acc) = query_labels(matcher);
    writeln!(out, "#                                                               --- full sequence ---- --- best 1 domain ---- --- domain number estimation ----")?;
    writeln!(out, "# target name        accession  query name           accession    E-value  score  bias   E-value  score  bias   exp reg clu  ov env dom rep inc description of target")?;
    writeln!(out, "#------------------- ---------- -------------------- ---------- --------- ------ ----- --------- ------ -----   --- --- --- --- --- --- --- --- ---------------------")?;
    for hit in matcher.hits().iter().filter(|h| h.reported) {
        let Some(best) = hit.best_domain() else {
            continue;
        };
        let reported = hit.domains.iter().filter(|d| d.reported).count();
        let included = hit.domains.iter().filter(|d| d.included).count();
        writeln!(
            out,
            "{:<20} {:<10} {:<20} {:<10} {:>9.2e} {:>6.1} {:>5.1} {:>9.2e} {:>6.1} {:>5.1} {:>5.1} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} {:>3} -",
            hit.name,
            "-",
            query,
            query_acc,
            hit.evalue,
            hit.score,
            0.0,
            best.ievalue,
            best.score,
            0.0,
            hit.domains.len() as f64,
            hit.domains.len(),
            0,
            0,
            hit.domains.len(),
            hit.domains.len(),
            reported,
            included
        )?;
    }
    writeln!(out, "#")?;
    out.flush()
}

/// Per-domain table (`--domtblout`); reported domains of reported hits.
pub fn write_domtblout<W: Write>(out: &mut W, matcher: &HmmMatcher<'_>) -> io::Result<()> {
    let (query, query_acc) = query_labels(matcher);
    let qlen = matcher.hmm().len();
    writeln!(out, "#                                                                            --- full sequence --- -------------- this domain -------------   hmm coord   ali coord   env coord")?;
    writeln!(out, "# target name        accession   tlen query name           accession   qlen   E-value  score  bias   #  of  c-Evalue  i-Evalue  score  bias  from    to  from    to  from    to  acc description of target")?;
    writeln!(out, "#------------------- ---------- ----- -------------------- ---------- ----- --------- ------ ----- --- --- --------- --------- ------ ----- ----- ----- ----- ----- ----- ----- ---- ---------------------")?;
    for hit in matcher.hits().iter().filter(|h| h.reported) {
        let shown: Vec<_> = hit.domains.iter().filter(|d| d.reported).collect();
        for (idx, domain) in shown.iter().enumerate() {
            writeln!(
                out,
                "{:<20} {:<10} {:>5} {:<20} {:<10} {:>5} {:>9.2e} {:>6.1} {:>5.1} {:>3} {:>3} {:>9.2e} {:>9.2e} {:>6.1} {:>5.1} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>4.2} -",
                hit.name,
                "-",
                hit.seq_len,
                query,
                query_acc,
                qlen,
                hit.evalue,
                hit.score,
                0.0,
                idx + 1,
                shown.len(),
                domain.cevalue,
                domain.ievalue,
                domain.score,
                0.0,
                domain.hmm_from,
                domain.hmm_to,
                domain.seq_from,
                domain.seq_to,
                domain.seq_from,
                domain.seq_to,
                1.0
            )?;
        }
    }
    writeln!(out, "#")?;
    out.flush()
}

/// Pfam-style table (`--pfamtblout`): a sequence section and a domain section.
pub fn write_pfamtblout<W: Write>(out: &mut W, matcher: &HmmMatcher<'_>) -> io::Result<()> {
    let (query, _) = query_labels(matcher);
    writeln!(out, "# Sequence scores")?;
    writeln!(out, "# ---------------")?;
    writeln!(out, "#")?;
    writeln!(out, "# name                 bits   E-value   n   exp  bias    description")?;
    writeln!(out, "# ------------------- ------ --------- --- ----- -----  ---------------------")?;
    for hit in matcher.hits().iter().filter(|h| h.reported) {
        writeln!(
            out,
            "{:<22} {:>6.1} {:>9.2e} {:>3} {:>5.1} {:>5.1}  {}",
            hit.name,
            hit.score,
            hit.evalue,
            hit.domains.len(),
            hit.domains.len() as f64,
            0.0,
            query
        )?;
    }
    writeln!(out)?;
    writeln!(out, "# Domain scores")?;
    writeln!(out, "# -------------")?;
    writeln!(out, "#")?;
    writeln!(out, "# name                  bits   E-value hit  bias      env-st     env-en     ali-st     ali-en     hmm-st     hmm-en      description")?;
    writeln!(out, "# ------------------- ------ --------- --- ----- ---------- ---------- ---------- ---------- ---------- ----------      ---------------------")?;
    for hit in matcher.hits().iter().filter(|h| h.reported) {
        for (idx, domain) in hit.domains.iter().enumerate().filter(|(_, d)| d.reported) {
            writeln!(
                out,
                "{:<22} {:>6.1} {:>9.2e} {:>3} {:>5.1} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}      {}",
                hit.name,
                domain.score,
                domain.ievalue,
                idx + 1,
                0.0,
                domain.seq_from,
                domain.seq_to,
                domain.seq_from,
                domain.seq_to,
                domain.hmm_from,
                domain.hmm_to,
                query
            )?;
        }
    }
    out.flush()
}

/// Ranked target list of the debug dump.
pub fn render_target_table(matcher: &HmmMatcher<'_>) -> String {
    let stats = matcher.stats();
    let mut text = String::new();
    let _ = writeln!(text, "Query:       {}  [M={}]", matcher.hmm().name(), matcher.hmm().len());
    let _ = writeln!(
        text,
        "Targets: {}  residues: {}  passed MSV: {}  passed Viterbi: {}  passed final: {}",
        stats.targets, stats.residues, stats.passed_msv, stats.passed_viterbi, stats.passed_forward
    );
    let _ = writeln!(text, "   E-value  score    #dom  Sequence");
    let _ = writeln!(text, "   -------  -----    ----  --------");
    for hit in matcher.hits() {
        let marker = if hit.included {
            ' '
        } else if hit.reported {
            '?'
        } else {
            continue;
        };
        let _ = writeln!(
            text,
            "{marker} {:>9.2e} {:>6.1} {:>7}  {}",
            hit.evalue,
            hit.score,
            hit.domains.len(),
            hit.name
        );
    }
    text
}

/// Per-domain annotation of the debug dump; alignment rows unless `--noali`.
pub fn render_domain_table(matcher: &HmmMatcher<'_>) -> String {
    let mut text = String::new();
    for hit in matcher.hits().iter().filter(|h| h.reported) {
        let _ = writeln!(text, ">> {}", hit.name);
        let _ = writeln!(text, "   #    score  c-Evalue  i-Evalue hmmfrom  hmm to  alifrom  ali to");
        for (idx, domain) in hit.domains.iter().enumerate().filter(|(_, d)| d.reported) {
            let marker = if domain.included { '!' } else { '?' };
            let _ = writeln!(
                text,
                " {:>3} {marker} {:>6.1} {:>9.2e} {:>9.2e} {:>7} {:>7} {:>8} {:>7}",
                idx + 1,
                domain.score,
                domain.cevalue,
                domain.ievalue,
                domain.hmm_from,
                domain.hmm_to,
                domain.seq_from,
                domain.seq_to
            );
            if !matcher.config().noali {
                let _ = writeln!(text, "     {:>10} {}", matcher.hmm().name(), domain.model_row);
                let _ = writeln!(text, "     {:>10} {}", hit.name, domain.target_row);
            }
        }
    }
    text
}
