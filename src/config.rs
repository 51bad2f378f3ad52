//! Search configuration shared by the library pipeline and the CLI.

use crate::hmm::HmmerConfig;

/// Options of one search run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchConfig {
    /// Paths reported per seed.
    pub top: usize,
    /// Worker threads for the per-profile fan-out.
    pub threads: usize,
    /// Restrict seeding to this edge (external id; 0 = every edge).
    pub edge_id: u64,
    /// Skip components with more than this many edge pairs.
    pub max_size: usize,
    /// Allow local entry into and exit from the profile.
    pub local: bool,
    /// Dump matcher tables to stdout and log at debug level.
    pub debug: bool,
    /// Render every searched component as DOT.
    pub draw: bool,
    /// Write per-profile FASTA files.
    pub save: bool,
    /// Rescore the found paths and write the tabular reports.
    pub rescore: bool,
    /// Write the input graph with the found paths.
    pub annotate_graph: bool,
    /// Matcher thresholds.
    pub hmmer: HmmerConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top: 10,
            threads: 4,
            edge_id: 0,
            max_size: 1000,
            local: false,
            debug: false,
            draw: false,
            save: true,
            rescore: true,
            annotate_graph: true,
            hmmer: HmmerConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Set the number of paths per seed.
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Set the worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Restrict seeding to one edge.
    pub fn with_edge_id(mut self, edge_id: u64) -> Self {
        self.edge_id = edge_id;
        self
    }

    /// Set the component size ceiling.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Toggle local profile termination.
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    /// Toggle DOT rendering.
    pub fn with_draw(mut self, draw: bool) -> Self {
        self.draw = draw;
        self
    }

    /// Replace the matcher settings.
    pub fn with_hmmer(mut self, hmmer: HmmerConfig) -> Self {
        self.hmmer = hmmer;
        self
    }
}
