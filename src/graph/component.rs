use std::collections::{BTreeSet, HashSet};

use super::{AssemblyGraph, EdgeId, VertexId};

/// Induced subgraph over a vertex set.
///
/// Contains every edge whose both endpoints are in the set. Built with
/// `add_conjugate`, the vertex set is first closed under conjugation so the
/// component holds both strands and `e_size()` counts each pair twice.
#[derive(Debug, Clone)]
pub struct GraphComponent<'g> {
    graph: &'g AssemblyGraph,
    vertices: BTreeSet<VertexId>,
    edges: BTreeSet<EdgeId>,
    edge_lookup: HashSet<EdgeId>,
}

impl<'g> GraphComponent<'g> {
    /// Build the component induced by `vertices`.
    pub fn from_vertices<I>(graph: &'g AssemblyGraph, vertices: I, add_conjugate: bool) -> Self
    where
        I: IntoIterator<Item = VertexId>,
    {
        let mut set = BTreeSet::new();
        for v in vertices {
            set.insert(v);
            if add_conjugate {
                set.insert(graph.conjugate_vertex(v));
            }
        }

        let mut edges = BTreeSet::new();
        for &v in &set {
            for &e in graph.outgoing(v) {
                if set.contains(&graph.end(e)) {
                    edges.insert(e);
                }
            }
        }
        let edge_lookup = edges.iter().copied().collect();

        Self {
            graph,
            vertices: set,
            edges,
            edge_lookup,
        }
    }

    /// Whole-graph component; handy for tests and small graphs.
    pub fn whole(graph: &'g AssemblyGraph) -> Self {
        Self::from_vertices(graph, graph.vertices(), false)
    }

    /// Graph the component was cut from.
    pub fn graph(&self) -> &'g AssemblyGraph {
        self.graph
    }

    /// Vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    /// Vertex membership.
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// Edge membership.
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edge_lookup.contains(&e)
    }

    /// Number of vertices.
    pub fn v_size(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges (both strands).
    pub fn e_size(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn component_is_closed_over_conjugates() {
        let mut builder = GraphBuilder::new(2);
        let a = builder.add_edge("a", b"AACCGA", 1.0, 1).unwrap();
        let b = builder.add_edge("b", b"GATTT", 1.0, 1).unwrap();
        let c = builder.add_edge("c", b"TTGGC", 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        builder.link(b, c).unwrap();
        let graph = builder.build();

        let component =
            GraphComponent::from_vertices(&graph, [graph.start(a), graph.end(a)], true);
        assert!(component.contains_edge(a));
        assert!(component.contains_edge(graph.conjugate(a)));
        assert!(!component.contains_edge(b));
        assert_eq!(component.e_size(), 2);
        assert_eq!(component.v_size(), 4);

        let open = GraphComponent::from_vertices(&graph, [graph.start(a), graph.end(a)], false);
        assert_eq!(open.e_size(), 1);
    }
}
