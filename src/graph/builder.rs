use std::collections::HashMap;

use super::{reverse_complement, AssemblyGraph, EdgeData, EdgeId, GraphError, VertexData, VertexId};

#[derive(Debug, Clone)]
struct PendingEdge {
    name: String,
    nucls: Vec<u8>,
    coverage: f64,
    multiplicity: u64,
}

/// Incremental constructor for [`AssemblyGraph`].
///
/// Every added edge brings its reverse complement along, and every link
/// brings its mirror. Vertices are derived at [`build`](Self::build) time by
/// gluing edge endpoints that links (or shared starts and ends) declare equal.
#[derive(Debug)]
pub struct GraphBuilder {
    k: usize,
    edges: Vec<PendingEdge>,
    /// Pairs of endpoint slots glued into one vertex.
    glued: Vec<(usize, usize)>,
    names: HashMap<String, EdgeId>,
}

impl GraphBuilder {
    /// Start an empty graph whose edges overlap by `k` nucleotides.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            edges: Vec::new(),
            glued: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Overlap length the builder validates against.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Add an edge and its conjugate; returns the forward strand.
    pub fn add_edge(
        &mut self,
        name: &str,
        nucls: &[u8],
        coverage: f64,
        multiplicity: u64,
    ) -> Result<EdgeId, GraphError> {
        if self.names.contains_key(name) {
            return Err(GraphError::DuplicateSegment(name.to_string()));
        }
        let mut forward = Vec::with_capacity(nucls.len());
        for &base in nucls {
            let upper = base.to_ascii_uppercase();
            if !matches!(upper, b'A' | b'C' | b'G' | b'T' | b'N') {
                return Err(GraphError::InvalidNucleotide {
                    name: name.to_string(),
                    ch: base as char,
                });
            }
            forward.push(upper);
        }
        if forward.len() < self.k + 1 {
            return Err(GraphError::EdgeTooShort {
                name: name.to_string(),
                len: forward.len(),
                min: self.k + 1,
            });
        }
        let backward = reverse_complement(&forward);
        if backward == forward {
            return Err(GraphError::Palindrome(name.to_string()));
        }

        let id = EdgeId::from_index(self.edges.len());
        for seq in [forward, backward] {
            self.edges.push(PendingEdge {
                name: name.to_string(),
                nucls: seq,
                coverage,
                multiplicity,
            });
        }
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Forward strand of a previously added edge.
    pub fn edge_by_name(&self, name: &str) -> Option<EdgeId> {
        self.names.get(name).copied()
    }

    /// Conjugate strand of an edge handle.
    pub fn conjugate(&self, e: EdgeId) -> EdgeId {
        EdgeId::from_index(e.index() ^ 1)
    }

    /// Glue the end of `from` to the start of `to`.
    pub fn link(&mut self, from: EdgeId, to: EdgeId) -> Result<(), GraphError> {
        let k = self.k;
        let lhs = &self.edges[from.index()];
        let rhs = &self.edges[to.index()];
        self.check_overlap(from, to, &lhs.nucls[lhs.nucls.len() - k..], &rhs.nucls[..k])?;
        self.glued.push((end_slot(from.index()), start_slot(to.index())));
        Ok(())
    }

    /// Make `a` and `b` leave the same vertex.
    pub fn share_start(&mut self, a: EdgeId, b: EdgeId) -> Result<(), GraphError> {
        let k = self.k;
        let (lhs, rhs) = (&self.edges[a.index()], &self.edges[b.index()]);
        self.check_overlap(a, b, &lhs.nucls[..k], &rhs.nucls[..k])?;
        self.glued.push((start_slot(a.index()), start_slot(b.index())));
        Ok(())
    }

    /// Make `a` and `b` enter the same vertex.
    pub fn share_end(&mut self, a: EdgeId, b: EdgeId) -> Result<(), GraphError> {
        let k = self.k;
        let (lhs, rhs) = (&self.edges[a.index()], &self.edges[b.index()]);
        self.check_overlap(
            a,
            b,
            &lhs.nucls[lhs.nucls.len() - k..],
            &rhs.nucls[rhs.nucls.len() - k..],
        )?;
        self.glued.push((end_slot(a.index()), end_slot(b.index())));
        Ok(())
    }

    fn check_overlap(&self, a: EdgeId, b: EdgeId, lhs: &[u8], rhs: &[u8]) -> Result<(), GraphError> {
        if lhs == rhs {
            return Ok(());
        }
        Err(GraphError::OverlapMismatch {
            from: self.edges[a.index()].name.clone(),
            to: self.edges[b.index()].name.clone(),
            k: self.k,
        })
    }

    /// Derive vertices and freeze the graph.
    pub fn build(self) -> AssemblyGraph {
        let slots = self.edges.len() * 2;
        let mut sets = DisjointSets::new(slots);
        for &(x, y) in &self.glued {
            sets.union(x, y);
            sets.union(conjugate_slot(x), conjugate_slot(y));
        }

        let mut vertex_of_root: Vec<Option<VertexId>> = vec![None; slots];
        let mut vertices: Vec<VertexData> = Vec::new();
        for slot in 0..slots {
            let root = sets.find(slot);
            if vertex_of_root[root].is_some() {
                continue;
            }
            let v = VertexId::from_index(vertices.len());
            vertex_of_root[root] = Some(v);
            let conj_root = sets.find(conjugate_slot(slot));
            if conj_root == root {
                vertices.push(VertexData {
                    conjugate: v,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                });
            } else {
                let w = VertexId::from_index(vertices.len() + 1);
                vertex_of_root[conj_root] = Some(w);
                vertices.push(VertexData {
                    conjugate: w,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                });
                vertices.push(VertexData {
                    conjugate: v,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                });
            }
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for (index, pending) in self.edges.into_iter().enumerate() {
            let start = vertex_of_root[sets.find(start_slot(index))]
                .unwrap_or_else(|| unreachable!("every slot was assigned a vertex"));
            let end = vertex_of_root[sets.find(end_slot(index))]
                .unwrap_or_else(|| unreachable!("every slot was assigned a vertex"));
            let id = EdgeId::from_index(index);
            vertices[start.index()].outgoing.push(id);
            vertices[end.index()].incoming.push(id);
            edges.push(EdgeData {
                name: pending.name,
                nucls: pending.nucls,
                start,
                end,
                coverage: pending.coverage,
                multiplicity: pending.multiplicity,
            });
        }

        AssemblyGraph {
            k: self.k,
            edges,
            vertices,
        }
    }
}

fn start_slot(edge: usize) -> usize {
    edge * 2
}

fn end_slot(edge: usize) -> usize {
    edge * 2 + 1
}

/// Start of `e` mirrors the end of `conj(e)` and vice versa.
fn conjugate_slot(slot: usize) -> usize {
    let edge = slot / 2;
    if slot % 2 == 0 {
        end_slot(edge ^ 1)
    } else {
        start_slot(edge ^ 1)
    }
}

#[derive(Debug)]
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
