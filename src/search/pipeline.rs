use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use super::matching::{matched_edges, score_edges, MatchedEdges, Overhangs};
use super::neighbourhood::{extract_neighbourhoods, join_components};
use crate::config::SearchConfig;
use crate::cursor::{depth_subset, make_aa_cursors, EdgeCursor, GraphCursor};
use crate::graph::{render_component_dot, AssemblyGraph, EdgeId, GraphComponent};
use crate::hmm::{render_domain_table, render_target_table, Alphabet, Fees, Hmm, HmmMatcher};
use crate::output::OutputError;
use crate::solver::find_best_path;
use crate::PathSearchError;

/// Serialises the matcher dumps of concurrent workers on stdout.
static CONSOLE: Mutex<()> = Mutex::new(());

/// Extra profile columns searched beyond each overhang.
const FRONTIER_SLACK: i64 = 10;

/// One path found around a seed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PathInfo {
    /// Profile name.
    pub hmm_name: String,
    /// Seed edge of the neighbourhood searched.
    pub leader: EdgeId,
    /// Rank among the paths of this seed.
    pub priority: usize,
    /// Path cost in nats; lower is better.
    pub score: f64,
    /// Residues read along the path (amino acids for protein profiles).
    pub seq: String,
    /// Edges walked.
    pub path: Vec<EdgeId>,
    /// Run-length alignment against the profile.
    pub alignment: String,
}

/// A component rendered for `--draw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    /// File stem, e.g. `12` or `12_0`.
    pub name: String,
    /// DOT source.
    pub dot: String,
}

/// Everything one profile produced.
#[derive(Debug, Clone, Default)]
pub struct HmmReport {
    /// Profile name.
    pub hmm_name: String,
    /// Seeds with their overhangs.
    pub matched: MatchedEdges,
    /// Paths in ascending cost.
    pub results: Vec<PathInfo>,
    /// Seeds whose component exceeded the size ceiling.
    pub skipped: Vec<EdgeId>,
    /// DOT renderings, empty unless drawing was requested.
    pub drawings: Vec<Drawing>,
}

impl HmmReport {
    /// Distinct non-empty edge paths, ordered.
    pub fn unique_paths(&self) -> BTreeSet<Vec<EdgeId>> {
        self.results
            .iter()
            .filter(|r| !r.path.is_empty())
            .map(|r| r.path.clone())
            .collect()
    }

    /// Named walks for the annotated graph: `<hmm>_<idx>`.
    pub fn gfa_paths(&self) -> Vec<(String, Vec<EdgeId>)> {
        self.unique_paths()
            .into_iter()
            .enumerate()
            .map(|(idx, path)| (format!("{}_{}", self.hmm_name, idx), path))
            .collect()
    }
}

/// Edges offered to the matcher: all of them, or the one named by
/// `edge_id`.
pub fn candidate_edges(graph: &AssemblyGraph, edge_id: u64) -> Result<Vec<EdgeId>, PathSearchError> {
    if edge_id == 0 {
        return Ok(graph.edges().collect());
    }
    graph
        .edge_by_int_id(edge_id)
        .map(|e| vec![e])
        .ok_or_else(|| PathSearchError::Config(format!("edge id {edge_id} is not in the graph")))
}

/// Starting cursors around `seed`: a backward reach from its first
/// nucleotide, a forward reach from its last one, and the positions of the
/// seed itself that lie between the overhangs.
pub fn initial_frontier(
    component: &GraphComponent<'_>,
    seed: EdgeId,
    overhangs: Overhangs,
    coef: i64,
) -> Vec<EdgeCursor> {
    let left = (overhangs.left + FRONTIER_SLACK) * coef;
    let right = (overhangs.right + FRONTIER_SLACK) * coef;
    let len = component.graph().nucleotides(seed).len() as i64;

    let mut cursors = BTreeSet::new();
    if left > 0 {
        let start = [EdgeCursor::new(seed, 0)];
        cursors.extend(depth_subset(component, &start, (left * 2) as usize, false));
    }
    if right > 0 {
        let end = [EdgeCursor::new(seed, (len - 1) as usize)];
        cursors.extend(depth_subset(component, &end, (right * 2) as usize, true));
    }
    let from = (-left).max(0);
    let to = len - (-right).max(0);
    cursors.extend((from..to).map(|i| EdgeCursor::new(seed, i as usize)));
    cursors.into_iter().collect()
}

fn top_paths<C: GraphCursor>(
    fees: &Fees,
    component: &GraphComponent<'_>,
    initial: &[C],
    top: usize,
    hmm_name: &str,
    seed: EdgeId,
) -> Vec<PathInfo> {
    let found = find_best_path(fees, component, initial);
    info!(best = ?found.best_score(), nodes = found.node_count(), "path search done");
    let mut results = Vec::new();
    for path in found.top_k(top).iter() {
        let edges = path.edge_path();
        if edges.is_empty() {
            continue;
        }
        results.push(PathInfo {
            hmm_name: hmm_name.to_string(),
            leader: seed,
            priority: results.len(),
            score: path.score(),
            seq: String::from_utf8_lossy(&path.letters(component)).into_owned(),
            path: edges,
            alignment: path.alignment_string(),
        });
    }
    results
}

fn dump_matcher(hmm: &Hmm, matcher: &HmmMatcher<'_>) -> io::Result<()> {
    let _console = CONSOLE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Query:       {}  [M={}]", hmm.name(), hmm.len())?;
    if let Some(acc) = hmm.accession() {
        writeln!(out, "Accession:   {acc}")?;
    }
    if let Some(desc) = hmm.description() {
        writeln!(out, "Description: {desc}")?;
    }
    write!(out, "{}", render_target_table(matcher))?;
    write!(out, "{}", render_domain_table(matcher))?;
    out.flush()
}

/// Run the whole search for one profile.
pub fn trace_hmm(
    graph: &AssemblyGraph,
    hmm: &Hmm,
    config: &SearchConfig,
) -> Result<HmmReport, PathSearchError> {
    let span = info_span!("hmm", name = hmm.name());
    let _entered = span.enter();

    let edges = candidate_edges(graph, config.edge_id)?;
    let matcher = score_edges(graph, &edges, hmm, &config.hmmer)?;
    if config.debug {
        dump_matcher(hmm, &matcher).map_err(|source| OutputError::Write {
            path: "<stdout>".into(),
            source,
        })?;
    }
    let matched = matched_edges(&edges, &matcher);
    let mut report = HmmReport {
        hmm_name: hmm.name().to_string(),
        ..HmmReport::default()
    };
    if matched.is_empty() {
        info!("no edges matched the profile");
        return Ok(report);
    }
    info!(matched = matched.len(), "matched edges");

    let amino = hmm.alphabet() == Alphabet::Amino;
    let (mult, coef) = if amino { (6, 3) } else { (2, 1) };
    let neighbourhoods = join_components(graph, extract_neighbourhoods(graph, &matched, mult));
    let highlighted: Vec<EdgeId> = matched.keys().copied().collect();
    let fees = Fees::new(hmm).with_local(config.local);

    for neighbourhood in &neighbourhoods {
        let seed = neighbourhood.seed;
        let component =
            GraphComponent::from_vertices(graph, neighbourhood.vertices.iter().copied(), true);
        debug!(
            edge = %seed,
            vertices = component.v_size(),
            edges = component.e_size(),
            "neighbourhood component"
        );
        let size = component.e_size() / 2;
        if size > config.max_size {
            warn!(edge = %seed, size, max_size = config.max_size, "component is too large, skipping");
            report.skipped.push(seed);
            continue;
        }
        if config.draw {
            report.drawings.push(Drawing {
                name: seed.to_string(),
                dot: render_component_dot(&component, &highlighted),
            });
        }

        let frontier = initial_frontier(&component, seed, neighbourhood.overhangs, coef);
        let found = if amino {
            let codons = make_aa_cursors(&component, &frontier);
            top_paths(&fees, &component, &codons, config.top, hmm.name(), seed)
        } else {
            top_paths(&fees, &component, &frontier, config.top, hmm.name(), seed)
        };

        if config.draw {
            let paths: BTreeSet<&Vec<EdgeId>> = found.iter().map(|r| &r.path).collect();
            for (idx, path) in paths.into_iter().enumerate() {
                report.drawings.push(Drawing {
                    name: format!("{seed}_{idx}"),
                    dot: render_component_dot(&component, path),
                });
            }
        }
        info!(edge = %seed, paths = found.len(), "paths extracted around seed");
        report.results.extend(found);
    }

    report.results.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then(a.leader.cmp(&b.leader))
            .then(a.priority.cmp(&b.priority))
    });
    report.matched = matched;
    Ok(report)
}

/// Search every profile on a pool of `config.threads` workers. Reports come
/// back in profile order; the first error aborts the run.
pub fn run(
    graph: &AssemblyGraph,
    hmms: &[Hmm],
    config: &SearchConfig,
) -> Result<Vec<HmmReport>, PathSearchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.max(1))
        .build()
        .map_err(|e| PathSearchError::Config(format!("cannot start worker pool: {e}")))?;
    pool.install(|| {
        hmms.par_iter()
            .map(|hmm| trace_hmm(graph, hmm, config))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::hmm::fixtures::profile;
    use crate::hmm::HmmerConfig;

    const FAMILY: &[u8] = b"ACGTTGCAGGTACCATGACT";

    fn linear() -> (AssemblyGraph, Vec<EdgeId>) {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", &FAMILY[..8], 1.0, 1).unwrap();
        let b = builder.add_edge("b", &FAMILY[5..14], 1.0, 1).unwrap();
        let c = builder.add_edge("c", &FAMILY[11..], 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        builder.link(b, c).unwrap();
        (builder.build(), vec![a, b, c])
    }

    fn config() -> SearchConfig {
        SearchConfig::default()
            .with_threads(1)
            .with_hmmer(HmmerConfig::default().with_max(true))
    }

    #[test]
    fn frontier_of_matched_seed_covers_whole_edge() {
        let (graph, edges) = linear();
        let component = GraphComponent::whole(&graph);
        let frontier = initial_frontier(&component, edges[1], Overhangs { left: -20, right: -20 }, 1);
        // both overhangs end up negative: only the interior of b remains
        let positions: Vec<usize> = frontier.iter().map(|c| c.position()).collect();
        assert_eq!(positions, Vec::<usize>::new());

        let frontier = initial_frontier(&component, edges[1], Overhangs { left: -12, right: -11 }, 1);
        let positions: Vec<usize> = frontier.iter().map(|c| c.position()).collect();
        assert_eq!(positions, vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn frontier_reaches_neighbours() {
        let (graph, edges) = linear();
        let component = GraphComponent::whole(&graph);
        let frontier = initial_frontier(&component, edges[1], Overhangs::default(), 1);
        assert!(frontier.contains(&EdgeCursor::new(edges[0], 0)));
        assert!(frontier.contains(&EdgeCursor::new(edges[2], 8)));
        assert!(frontier.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linear_family_is_recovered() {
        let (graph, edges) = linear();
        let hmm = profile("fam", Alphabet::Dna, FAMILY);
        let report = trace_hmm(&graph, &hmm, &config()).unwrap();
        assert!(!report.matched.is_empty());
        let best = &report.results[0];
        assert_eq!(best.path, edges);
        assert_eq!(best.seq.as_bytes(), FAMILY);
        assert_eq!(best.alignment, "20M");
        assert!(report.results.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn unknown_edge_id_is_rejected() {
        let (graph, _) = linear();
        let hmm = profile("fam", Alphabet::Dna, FAMILY);
        let err = trace_hmm(&graph, &hmm, &config().with_edge_id(99)).unwrap_err();
        assert!(matches!(err, PathSearchError::Config(_)));
    }

    #[test]
    fn zero_max_size_skips_everything() {
        let (graph, _) = linear();
        let hmm = profile("fam", Alphabet::Dna, FAMILY);
        let report = trace_hmm(&graph, &hmm, &config().with_max_size(0)).unwrap();
        assert!(report.results.is_empty());
        assert!(!report.skipped.is_empty());
    }

    #[test]
    fn parallel_run_keeps_profile_order() {
        let (graph, _) = linear();
        let hmms = vec![
            profile("first", Alphabet::Dna, FAMILY),
            profile("second", Alphabet::Dna, b"TTTTGGGGCCCCAAAATTTT"),
        ];
        let reports = run(&graph, &hmms, &config().with_threads(2)).unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.hmm_name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(reports[1].results.is_empty());
    }
}
