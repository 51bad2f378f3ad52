//! GraphViz DOT output for a graph component (`--draw`).

use std::collections::HashSet;
use std::io::{self, Write};

use super::{EdgeId, GraphComponent};

/// Write the component; `highlighted` edges are drawn green.
pub fn write_component_dot<W: Write>(
    out: &mut W,
    component: &GraphComponent<'_>,
    highlighted: &[EdgeId],
) -> io::Result<()> {
    let graph = component.graph();
    let marked: HashSet<EdgeId> = highlighted.iter().copied().collect();

    writeln!(out, "digraph component {{")?;
    writeln!(out, "  rankdir=LR;")?;
    writeln!(out, "  node [shape=point];")?;
    for v in component.vertices() {
        writeln!(out, "  v{};", v.int_id())?;
    }
    for e in component.edges() {
        let color = if marked.contains(&e) { "green" } else { "black" };
        writeln!(
            out,
            "  v{} -> v{} [label=\"{} ({}) cov {:.1}\", color={}];",
            graph.start(e).int_id(),
            graph.end(e).int_id(),
            e.int_id(),
            graph.length(e),
            graph.coverage(e),
            color
        )?;
    }
    writeln!(out, "}}")
}

/// Render the component into a DOT string.
pub fn render_component_dot(component: &GraphComponent<'_>, highlighted: &[EdgeId]) -> String {
    let mut buffer = Vec::new();
    write_component_dot(&mut buffer, component, highlighted)
        .unwrap_or_else(|_| unreachable!("writing into a Vec cannot fail"));
    String::from_utf8_lossy(&buffer).into_owned()
}
