//! Read-only assembly graph with reverse-complement (conjugate) pairing.
//!
//! Edges are stored in conjugate pairs inside a flat arena: the edge at an
//! even index is the canonical strand and `index ^ 1` is its reverse
//! complement. Vertices carry an explicit conjugate sibling because a vertex
//! may be its own reverse complement. Nothing in this module owns a reference
//! to anything else; all relations are arena indices.

mod builder;
mod component;
mod dijkstra;
mod dot;
mod gfa;
mod grp;

pub use builder::GraphBuilder;
pub use component::GraphComponent;
pub use dijkstra::{edge_bounded_reach, Direction};
pub use dot::{render_component_dot, write_component_dot};
pub use gfa::{load_gfa, read_gfa, GfaWriter};
pub use grp::load_basic_graph;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Arena handle of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EdgeId(u32);

impl EdgeId {
    /// Sentinel used by empty cursors; never stored in a graph.
    pub const NONE: EdgeId = EdgeId(u32::MAX);

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the edge inside the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// External integer id (1-based, so that 0 can mean "no edge").
    pub fn int_id(self) -> u64 {
        u64::from(self.0) + 1
    }

    /// Whether the edge is the canonical member of its conjugate pair.
    pub fn is_canonical(self) -> bool {
        self.0 % 2 == 0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.int_id())
    }
}

/// Arena handle of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(u32);

impl VertexId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the vertex inside the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// External integer id (1-based).
    pub fn int_id(self) -> u64 {
        u64::from(self.0) + 1
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.int_id())
    }
}

/// Errors raised while loading or validating a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Underlying file could not be read.
    #[error("cannot read graph file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Original I/O error.
        source: io::Error,
    },

    /// A record could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Edge sequence shorter than `k + 1`.
    #[error("edge '{name}' has {len} nucleotides, at least {min} required")]
    EdgeTooShort {
        /// Edge name.
        name: String,
        /// Sequence length found.
        len: usize,
        /// Minimum length (`k + 1`).
        min: usize,
    },

    /// Edge equal to its own reverse complement.
    #[error("edge '{0}' is its own reverse complement")]
    Palindrome(String),

    /// Character outside `ACGTN`.
    #[error("unsupported nucleotide '{ch}' in edge '{name}'")]
    InvalidNucleotide {
        /// Edge name.
        name: String,
        /// Offending character.
        ch: char,
    },

    /// Two linked edges do not share a k-nucleotide overlap.
    #[error("edges '{from}' and '{to}' do not overlap by {k} nucleotides")]
    OverlapMismatch {
        /// Source edge name.
        from: String,
        /// Target edge name.
        to: String,
        /// Expected overlap.
        k: usize,
    },

    /// Link overlap disagrees with the requested k.
    #[error("link overlap {found} disagrees with k = {k}")]
    KMismatch {
        /// Overlap declared by the file.
        found: usize,
        /// Requested k.
        k: usize,
    },

    /// Reference to a segment/edge that was never declared.
    #[error("unknown segment '{0}'")]
    UnknownSegment(String),

    /// Segment declared twice.
    #[error("duplicate segment '{0}'")]
    DuplicateSegment(String),

    /// Conjugate bookkeeping inconsistent in an input dump.
    #[error("inconsistent conjugate pairing: {0}")]
    Conjugate(String),

    /// Consecutive path edges do not share a vertex.
    #[error("edges {from} and {to} are not adjacent")]
    NotAWalk {
        /// Earlier edge.
        from: EdgeId,
        /// Edge that does not continue it.
        to: EdgeId,
    },
}

#[derive(Debug, Clone)]
struct EdgeData {
    name: String,
    nucls: Vec<u8>,
    start: VertexId,
    end: VertexId,
    coverage: f64,
    multiplicity: u64,
}

#[derive(Debug, Clone)]
struct VertexData {
    conjugate: VertexId,
    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

/// Immutable de Bruijn-style assembly graph.
///
/// Consecutive edges overlap by `k` nucleotides; `length(e)` counts the
/// nucleotides of `e` that are not part of its trailing overlap.
#[derive(Debug, Clone)]
pub struct AssemblyGraph {
    k: usize,
    edges: Vec<EdgeData>,
    vertices: Vec<VertexData>,
}

impl AssemblyGraph {
    /// Overlap length shared by adjacent edges.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of edges, both strands included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of vertices, both strands included.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::from_index)
    }

    /// One representative per conjugate pair.
    pub fn canonical_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges().filter(|e| e.is_canonical())
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::from_index)
    }

    /// One representative per conjugate vertex pair.
    pub fn canonical_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices().filter(move |&v| v <= self.conjugate_vertex(v))
    }

    /// Reverse-complement partner of an edge.
    pub fn conjugate(&self, e: EdgeId) -> EdgeId {
        EdgeId(e.0 ^ 1)
    }

    /// Reverse-complement partner of a vertex.
    pub fn conjugate_vertex(&self, v: VertexId) -> VertexId {
        self.vertices[v.index()].conjugate
    }

    /// Vertex at which the edge starts.
    pub fn start(&self, e: EdgeId) -> VertexId {
        self.edges[e.index()].start
    }

    /// Vertex at which the edge ends.
    pub fn end(&self, e: EdgeId) -> VertexId {
        self.edges[e.index()].end
    }

    /// Edges ending at `v`, sorted by id.
    pub fn incoming(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.index()].incoming
    }

    /// Edges starting at `v`, sorted by id.
    pub fn outgoing(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.index()].outgoing
    }

    /// Full nucleotide label, trailing overlap included.
    pub fn nucleotides(&self, e: EdgeId) -> &[u8] {
        &self.edges[e.index()].nucls
    }

    /// Edge length in k-mers (`nucleotides(e).len() - k`).
    pub fn length(&self, e: EdgeId) -> usize {
        self.edges[e.index()].nucls.len() - self.k
    }

    /// External integer id of an edge.
    pub fn int_id(&self, e: EdgeId) -> u64 {
        e.int_id()
    }

    /// External integer id of a vertex.
    pub fn vertex_int_id(&self, v: VertexId) -> u64 {
        v.int_id()
    }

    /// Look an edge up by its external integer id.
    pub fn edge_by_int_id(&self, id: u64) -> Option<EdgeId> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        (index < self.edges.len()).then(|| EdgeId::from_index(index))
    }

    /// Segment name shared by both strands of the pair.
    pub fn name(&self, e: EdgeId) -> &str {
        &self.edges[e.index()].name
    }

    /// Average k-mer coverage.
    pub fn coverage(&self, e: EdgeId) -> f64 {
        self.edges[e.index()].coverage
    }

    /// Total k-mer multiplicity.
    pub fn multiplicity(&self, e: EdgeId) -> u64 {
        self.edges[e.index()].multiplicity
    }

    /// Sequence spelled by a walk, overlaps merged.
    pub fn merge_sequences(&self, path: &[EdgeId]) -> Result<Vec<u8>, GraphError> {
        let mut merged = Vec::new();
        for (idx, &e) in path.iter().enumerate() {
            if idx == 0 {
                merged.extend_from_slice(self.nucleotides(e));
                continue;
            }
            if self.end(path[idx - 1]) != self.start(e) {
                return Err(GraphError::NotAWalk {
                    from: path[idx - 1],
                    to: e,
                });
            }
            merged.extend_from_slice(&self.nucleotides(e)[self.k..]);
        }
        Ok(merged)
    }

    /// Whether consecutive edges of `path` share vertices.
    pub fn is_walk(&self, path: &[EdgeId]) -> bool {
        path.windows(2)
            .all(|pair| self.end(pair[0]) == self.start(pair[1]))
    }
}

/// Load a graph, dispatching on the `.gfa` suffix.
pub fn load_graph<P: AsRef<Path>>(path: P, k: usize) -> Result<AssemblyGraph, GraphError> {
    let path = path.as_ref();
    if path.to_string_lossy().ends_with(".gfa") {
        load_gfa(path, k)
    } else {
        load_basic_graph(path, k)
    }
}

/// Reverse complement over `ACGTN`; other bytes map to `N`.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&base| match base {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            _ => b'N',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_graph() -> AssemblyGraph {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", b"ACGTTG", 2.0, 6).unwrap();
        let b = builder.add_edge("b", b"TTGCAAT", 3.0, 12).unwrap();
        builder.link(a, b).unwrap();
        builder.build()
    }

    #[test]
    fn conjugate_pairs_are_involutions() {
        let graph = toy_graph();
        for e in graph.edges() {
            assert_ne!(graph.conjugate(e), e);
            assert_eq!(graph.conjugate(graph.conjugate(e)), e);
            assert_eq!(graph.start(e), graph.conjugate_vertex(graph.end(graph.conjugate(e))));
        }
        for v in graph.vertices() {
            assert_eq!(graph.conjugate_vertex(graph.conjugate_vertex(v)), v);
        }
    }

    #[test]
    fn merge_sequences_drops_overlaps() {
        let graph = toy_graph();
        let a = graph.edge_by_int_id(1).unwrap();
        let b = graph.edge_by_int_id(3).unwrap();
        assert_eq!(graph.merge_sequences(&[a, b]).unwrap(), b"ACGTTGCAAT".to_vec());
        assert!(graph.is_walk(&[a, b]));
        assert!(!graph.is_walk(&[b, a]));
        assert!(matches!(
            graph.merge_sequences(&[b, a]),
            Err(GraphError::NotAWalk { from, to }) if from == b && to == a
        ));
    }

    #[test]
    fn lengths_exclude_trailing_overlap() {
        let graph = toy_graph();
        let a = graph.edge_by_int_id(1).unwrap();
        assert_eq!(graph.length(a), 3);
        assert_eq!(graph.nucleotides(graph.conjugate(a)), b"CAACGT");
        assert_eq!(graph.edge_by_int_id(0), None);
        assert_eq!(graph.edge_by_int_id(5), None);
    }
}
