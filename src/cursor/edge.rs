use std::fmt;

use super::GraphCursor;
use crate::graph::{EdgeId, GraphComponent};

/// One nucleotide of an edge label: `(edge, position)` with
/// `position < length(edge) + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EdgeCursor {
    edge: EdgeId,
    position: u32,
}

impl EdgeCursor {
    /// Cursor at `position` of `edge`.
    pub fn new(edge: EdgeId, position: usize) -> Self {
        Self {
            edge,
            position: position as u32,
        }
    }

    /// Edge the cursor lives on.
    pub fn edge(self) -> EdgeId {
        self.edge
    }

    /// Offset inside the edge label.
    pub fn position(self) -> usize {
        self.position as usize
    }
}

impl fmt::Display for EdgeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edge == EdgeId::NONE {
            write!(f, "(empty)")
        } else {
            write!(f, "({}, {})", self.edge, self.position)
        }
    }
}

impl GraphCursor for EdgeCursor {
    fn empty() -> Self {
        Self {
            edge: EdgeId::NONE,
            position: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.edge == EdgeId::NONE
    }

    fn letter(&self, component: &GraphComponent<'_>) -> u8 {
        component.graph().nucleotides(self.edge)[self.position()]
    }

    fn next(&self, component: &GraphComponent<'_>) -> Vec<Self> {
        if self.is_empty() {
            return Vec::new();
        }
        let graph = component.graph();
        let position = self.position();
        if position + 1 < graph.nucleotides(self.edge).len() {
            return vec![Self::new(self.edge, position + 1)];
        }
        graph
            .outgoing(graph.end(self.edge))
            .iter()
            .filter(|&&e| component.contains_edge(e))
            .map(|&e| Self::new(e, graph.k()))
            .collect()
    }

    fn prev(&self, component: &GraphComponent<'_>) -> Vec<Self> {
        if self.is_empty() {
            return Vec::new();
        }
        let graph = component.graph();
        if self.position > 0 {
            return vec![Self::new(self.edge, self.position() - 1)];
        }
        graph
            .incoming(graph.start(self.edge))
            .iter()
            .filter(|&&e| component.contains_edge(e))
            .map(|&e| Self::new(e, graph.length(e) - 1))
            .collect()
    }

    fn nucleotide_cursors(&self) -> Vec<EdgeCursor> {
        vec![*self]
    }

    fn edge(&self) -> EdgeId {
        self.edge
    }
}
