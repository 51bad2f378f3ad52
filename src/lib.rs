//! # Profile HMM path search over assembly graphs
//!
//! Finds the walks of a de Bruijn assembly graph whose spelled sequence best
//! matches a profile hidden Markov model.
//!
//! ## Pipeline
//!
//! 1. **Edge matching**: every edge label is scored against the profile and
//!    the accepted edges become seeds, each with the number of profile
//!    columns left over at both ends.
//! 2. **Neighbourhoods**: edge-bounded searches from the seed endpoints
//!    collect the part of the graph the rest of the profile can reach;
//!    neighbourhoods sharing seeds are merged.
//! 3. **Path search**: a Viterbi-like pass over (profile state, graph cursor)
//!    pairs followed by best-first k-best enumeration. Protein profiles walk
//!    the graph codon by codon.
//!
//! ## Usage Example
//!
//! ```ignore
//! use graphhmm::{load_graph, parse_hmm_file, run, SearchConfig};
//!
//! let graph = load_graph("assembly.gfa", 55)?;
//! let hmms = parse_hmm_file("family.hmm")?;
//! let reports = run(&graph, &hmms, &SearchConfig::default())?;
//! for path in &reports[0].results {
//!     println!("{} {:?}", path.score, path.path);
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod cursor;
pub mod graph;
pub mod hmm;
pub mod output;
pub mod search;
pub mod solver;

pub use config::SearchConfig;
pub use cursor::{CodonCursor, EdgeCursor, GraphCursor};
pub use graph::{load_graph, AssemblyGraph, EdgeId, GraphBuilder, GraphComponent, GraphError, VertexId};
pub use hmm::{parse_hmm_file, Alphabet, Hmm, HmmError, HmmerConfig};
pub use output::{save_reports, OutputError};
pub use search::{run, trace_hmm, HmmReport, PathInfo};
pub use solver::{find_best_path, AnnotatedPath, PathSet};

use thiserror::Error;

/// Errors of a search run.
#[derive(Error, Debug)]
pub enum PathSearchError {
    /// Graph loading or validation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Profile loading or scoring failed.
    #[error(transparent)]
    Hmm(#[from] HmmError),

    /// Writing results failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Invalid search settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}
