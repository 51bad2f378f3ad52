//! Files written after the search: per-profile FASTA, rescoring tables,
//! edge-path exports, DOT drawings and the annotated graph.

mod fasta;

pub use fasta::{
    join_path, path_sequences, render_path_sequences, render_seed_sequences, write_edge_paths,
    write_path_sequences, write_seed_sequences, write_wrapped,
};

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::SearchConfig;
use crate::graph::{AssemblyGraph, EdgeId, GfaWriter, GraphError};
use crate::hmm::{
    score_sequences, write_domtblout, write_pfamtblout, write_tblout, Hmm, HmmError, HmmMatcher,
    HmmerConfig,
};
use crate::search::HmmReport;

/// Name of the annotated graph inside the output directory.
pub const ANNOTATED_GRAPH: &str = "graph_with_hmm_paths.gfa";
/// Name of the combined edge-path export.
pub const ALL_EDGES: &str = "all.edges.fa";

/// Errors raised while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Original I/O error.
        source: io::Error,
    },

    /// A result file could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Original I/O error.
        source: io::Error,
    },

    /// Rescoring the found paths failed.
    #[error("rescoring failed: {0}")]
    Rescore(#[from] HmmError),

    /// A result path is not a walk in the graph.
    #[error("cannot spell result path: {0}")]
    Path(#[from] GraphError),
}

/// Create `dir`; returns `false` when it already existed.
pub fn create_output_dir(dir: &Path) -> Result<bool, OutputError> {
    match fs::create_dir(dir) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(OutputError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

fn write_file<F>(path: &Path, body: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let wrap = |source: io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(wrap)?);
    body(&mut out).map_err(wrap)?;
    out.flush().map_err(wrap)
}

/// Score the merged sequences of `paths` against `hmm`; targets are named by
/// their joined edge ids.
pub fn rescore_paths<'h>(
    graph: &AssemblyGraph,
    hmm: &'h Hmm,
    paths: &BTreeSet<Vec<EdgeId>>,
    config: &HmmerConfig,
) -> Result<HmmMatcher<'h>, OutputError> {
    let (refs, seqs): (Vec<String>, Vec<Vec<u8>>) = path_sequences(graph, paths)?.into_iter().unzip();
    Ok(score_sequences(hmm, &seqs, &refs, config)?)
}

/// Write the annotated graph: segments, links and one `P` line per walk.
pub fn write_annotated_graph<W: Write>(
    out: W,
    graph: &AssemblyGraph,
    paths: &BTreeSet<(String, Vec<EdgeId>)>,
) -> io::Result<W> {
    let mut writer = GfaWriter::new(graph, out);
    writer.write_segments_and_links()?;
    for (name, path) in paths {
        writer.write_path(name, path)?;
    }
    writer.into_inner()
}

fn save_report(
    dir: &Path,
    graph: &AssemblyGraph,
    hmm: &Hmm,
    report: &HmmReport,
    config: &SearchConfig,
) -> Result<(), OutputError> {
    let name = &report.hmm_name;
    info!(hmm = %name, paths = report.results.len(), "saving results");

    if config.save && !report.results.is_empty() {
        write_file(&dir.join(format!("{name}.seqs.fa")), |out| {
            write_path_sequences(out, &report.results)
        })?;
        write_file(&dir.join(format!("{name}.fa")), |out| {
            write_seed_sequences(out, graph, &report.results)
        })?;
    }

    if config.rescore {
        let paths = report.unique_paths();
        info!(hmm = %name, paths = paths.len(), "paths to rescore");
        if !paths.is_empty() {
            write_file(&dir.join(format!("{name}.edges.fa")), |out| {
                write_edge_paths(out, graph, &paths)
            })?;
        }
        let matcher = rescore_paths(graph, hmm, &paths, &config.hmmer)?;
        write_file(&dir.join(format!("{name}.tblout")), |out| write_tblout(out, &matcher))?;
        write_file(&dir.join(format!("{name}.domtblout")), |out| {
            write_domtblout(out, &matcher)
        })?;
        write_file(&dir.join(format!("{name}.pfamtblout")), |out| {
            write_pfamtblout(out, &matcher)
        })?;
    }

    if config.draw {
        for drawing in &report.drawings {
            write_file(&dir.join(format!("{name}_{}.dot", drawing.name)), |out| {
                out.write_all(drawing.dot.as_bytes())
            })?;
        }
    }
    Ok(())
}

/// Write every output file for `reports` (paired with `hmms` by position)
/// into `dir`.
pub fn save_reports(
    dir: &Path,
    graph: &AssemblyGraph,
    hmms: &[Hmm],
    reports: &[HmmReport],
    config: &SearchConfig,
) -> Result<(), OutputError> {
    for (hmm, report) in hmms.iter().zip(reports) {
        save_report(dir, graph, hmm, report, config)?;
    }

    if config.rescore {
        let all: BTreeSet<Vec<EdgeId>> = reports.iter().flat_map(HmmReport::unique_paths).collect();
        info!(paths = all.len(), "total paths to rescore");
        if !all.is_empty() {
            write_file(&dir.join(ALL_EDGES), |out| write_edge_paths(out, graph, &all))?;
        }
    }

    if config.annotate_graph {
        let paths: BTreeSet<(String, Vec<EdgeId>)> =
            reports.iter().flat_map(HmmReport::gfa_paths).collect();
        let path = dir.join(ANNOTATED_GRAPH);
        info!(path = %path.display(), walks = paths.len(), "saving annotated graph");
        write_file(&path, |out| write_annotated_graph(out, graph, &paths).map(|_| ()))?;
    }
    Ok(())
}
