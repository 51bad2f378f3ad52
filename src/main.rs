use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use graphhmm::hmm::HmmerConfig;
use graphhmm::output::create_output_dir;
use graphhmm::{load_graph, parse_hmm_file, run, save_reports, SearchConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Single-dash long options accepted for compatibility with profile-search tools.
const SINGLE_DASH_LONG: &[&str] = &["-domE", "-domT", "-incE", "-incT", "-incdomE", "-incdomT"];

#[derive(Parser, Debug)]
#[command(
    name = "graphhmm",
    about = "Search an assembly graph for paths matching profile HMMs"
)]
struct Cli {
    /// Profile HMM file (HMMER3 text format).
    hmm: PathBuf,
    /// Assembly graph: GFA (`.gfa`) or a basic graph dump prefix.
    graph: PathBuf,
    /// k-mer size of the graph.
    k: usize,

    /// Output directory.
    #[arg(short, long)]
    output: PathBuf,
    /// Paths reported per seed.
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Profiles searched in parallel.
    #[arg(long, default_value_t = 4)]
    threads: usize,
    /// Restrict matching to one edge id (0 = all edges).
    #[arg(long = "edge_id", default_value_t = 0)]
    edge_id: u64,
    /// Skip components with more than this many edge pairs.
    #[arg(long = "max_size", default_value_t = 1000)]
    max_size: usize,
    /// Allow local entry into and exit from the profile.
    #[arg(long)]
    local: bool,

    /// Prefer accessions in tabular output.
    #[arg(long)]
    acc: bool,
    /// Omit alignments in the debug dump.
    #[arg(long)]
    noali: bool,
    /// Sequence reporting E-value.
    #[arg(short = 'E', default_value_t = 10.0)]
    e: f64,
    /// Sequence reporting score.
    #[arg(short = 'T')]
    t: Option<f64>,
    /// Domain reporting E-value.
    #[arg(long = "domE", default_value_t = 10.0)]
    dom_e: f64,
    /// Domain reporting score.
    #[arg(long = "domT")]
    dom_t: Option<f64>,
    /// Sequence inclusion E-value.
    #[arg(long = "incE", default_value_t = 0.01)]
    inc_e: f64,
    /// Sequence inclusion score.
    #[arg(long = "incT")]
    inc_t: Option<f64>,
    /// Domain inclusion E-value.
    #[arg(long = "incdomE", default_value_t = 0.01)]
    inc_dom_e: f64,
    /// Domain inclusion score.
    #[arg(long = "incdomT")]
    inc_dom_t: Option<f64>,
    /// Use the profile's gathering cutoffs.
    #[arg(long = "cut_ga")]
    cut_ga: bool,
    /// Use the profile's noise cutoffs.
    #[arg(long = "cut_nc")]
    cut_nc: bool,
    /// Use the profile's trusted cutoffs.
    #[arg(long = "cut_tc")]
    cut_tc: bool,
    /// Turn off the acceleration filters.
    #[arg(long)]
    max: bool,
    /// MSV filter threshold.
    #[arg(long = "F1", default_value_t = 0.02)]
    f1: f64,
    /// Viterbi filter threshold.
    #[arg(long = "F2", default_value_t = 1e-3)]
    f2: f64,
    /// Final-stage threshold.
    #[arg(long = "F3", default_value_t = 1e-5)]
    f3: f64,

    /// Dump matcher tables and log at debug level.
    #[arg(long)]
    debug: bool,
    /// Write DOT drawings of the searched components.
    #[arg(long)]
    draw: bool,
    /// Write per-profile FASTA files.
    #[arg(long, num_args = 0..=1, default_value_t = true, default_missing_value = "true", action = ArgAction::Set)]
    save: bool,
    /// Rescore found paths and write tabular reports.
    #[arg(long, num_args = 0..=1, default_value_t = true, default_missing_value = "true", action = ArgAction::Set)]
    rescore: bool,
    /// Write the graph annotated with the found paths.
    #[arg(long = "annotate-graph", num_args = 0..=1, default_value_t = true, default_missing_value = "true", action = ArgAction::Set)]
    annotate_graph: bool,
}

impl Cli {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            top: self.top,
            threads: self.threads,
            edge_id: self.edge_id,
            max_size: self.max_size,
            local: self.local,
            debug: self.debug,
            draw: self.draw,
            save: self.save,
            rescore: self.rescore,
            annotate_graph: self.annotate_graph,
            hmmer: HmmerConfig {
                acc: self.acc,
                noali: self.noali,
                e: self.e,
                t: self.t,
                dom_e: self.dom_e,
                dom_t: self.dom_t,
                inc_e: self.inc_e,
                inc_t: self.inc_t,
                inc_dom_e: self.inc_dom_e,
                inc_dom_t: self.inc_dom_t,
                cut_ga: self.cut_ga,
                cut_nc: self.cut_nc,
                cut_tc: self.cut_tc,
                max: self.max,
                f1: self.f1,
                f2: self.f2,
                f3: self.f3,
            },
        }
    }
}

fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if SINGLE_DASH_LONG.contains(&flag) => OsString::from(format!("-{flag}")),
            _ => arg,
        })
        .collect()
}

fn parse_cli() -> Cli {
    match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            // a failed print leaves nothing else to report
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

fn main() -> Result<()> {
    let cli = parse_cli();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if !create_output_dir(&cli.output)? {
        warn!(dir = %cli.output.display(), "output directory exists");
    }

    let config = cli.search_config();
    let graph = load_graph(&cli.graph, cli.k)
        .with_context(|| format!("failed to load graph from {}", cli.graph.display()))?;
    info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );

    let hmms = parse_hmm_file(&cli.hmm)
        .with_context(|| format!("failed to read profiles from {}", cli.hmm.display()))?;
    info!(profiles = hmms.len(), threads = config.threads, "starting search");

    let reports = run(&graph, &hmms, &config).context("path search failed")?;
    let found: usize = reports.iter().map(|r| r.results.len()).sum();
    info!(paths = found, "search finished");

    save_reports(&cli.output, &graph, &hmms, &reports, &config)
        .with_context(|| format!("failed to write results to {}", cli.output.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let args = std::iter::once("graphhmm").chain(args.iter().copied()).map(OsString::from);
        Cli::try_parse_from(normalize_args(args))
    }

    #[test]
    fn defaults_follow_search_config() {
        let cli = parse(&["f.hmm", "g.gfa", "55", "-o", "out"]).unwrap();
        assert_eq!(cli.search_config(), SearchConfig::default());
        assert_eq!(cli.k, 55);
    }

    #[test]
    fn single_dash_thresholds_are_accepted() {
        let cli = parse(&["f.hmm", "g.gfa", "21", "-o", "out", "-incE", "0.5", "-domT", "3", "-E", "1"]).unwrap();
        let config = cli.search_config();
        assert_eq!(config.hmmer.inc_e, 0.5);
        assert_eq!(config.hmmer.dom_t, Some(3.0));
        assert_eq!(config.hmmer.e, 1.0);
    }

    #[test]
    fn optional_booleans() {
        let cli = parse(&["f.hmm", "g.gfa", "21", "-o", "out", "--save", "false", "--rescore"]).unwrap();
        assert!(!cli.save);
        assert!(cli.rescore);
        assert!(cli.annotate_graph);
    }

    #[test]
    fn missing_output_is_an_error() {
        assert!(parse(&["f.hmm", "g.gfa", "21"]).is_err());
    }
}
