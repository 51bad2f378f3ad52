use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::graph::{AssemblyGraph, EdgeId, GraphError};
use crate::search::PathInfo;

const LINE_WIDTH: usize = 60;

/// Sequence body wrapped at 60 columns.
pub fn write_wrapped<W: Write>(out: &mut W, seq: &[u8]) -> io::Result<()> {
    for line in seq.chunks(LINE_WIDTH) {
        out.write_all(line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Edge ids joined by `_`.
pub fn join_path(path: &[EdgeId]) -> String {
    path.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("_")
}

/// `<hmm>.seqs.fa`: one record per path with a non-empty sequence.
pub fn write_path_sequences<W: Write>(out: &mut W, results: &[PathInfo]) -> io::Result<()> {
    for result in results.iter().filter(|r| !r.seq.is_empty()) {
        writeln!(
            out,
            ">Score={:.4}|Edges={}|Alignment={}",
            result.score,
            join_path(&result.path),
            result.alignment
        )?;
        write_wrapped(out, result.seq.as_bytes())?;
    }
    Ok(())
}

/// `<hmm>.fa`: records named `<leader>_<priority>`; an empty trace falls
/// back to the whole leader edge.
pub fn write_seed_sequences<W: Write>(
    out: &mut W,
    graph: &AssemblyGraph,
    results: &[PathInfo],
) -> io::Result<()> {
    for result in results {
        if result.seq.is_empty() {
            writeln!(out, ">{}_{} (whole edge)", result.leader, result.priority)?;
            write_wrapped(out, graph.nucleotides(result.leader))?;
        } else {
            writeln!(out, ">{}_{}", result.leader, result.priority)?;
            write_wrapped(out, result.seq.as_bytes())?;
        }
    }
    Ok(())
}

/// Walk sequences named by their joined edge ids, sorted by name.
pub fn path_sequences(
    graph: &AssemblyGraph,
    paths: &BTreeSet<Vec<EdgeId>>,
) -> Result<Vec<(String, Vec<u8>)>, GraphError> {
    let mut named = paths
        .iter()
        .map(|path| Ok((join_path(path), graph.merge_sequences(path)?)))
        .collect::<Result<Vec<_>, GraphError>>()?;
    named.sort();
    Ok(named)
}

/// `<hmm>.edges.fa` / `all.edges.fa`.
pub fn write_edge_paths<W: Write>(
    out: &mut W,
    graph: &AssemblyGraph,
    paths: &BTreeSet<Vec<EdgeId>>,
) -> io::Result<()> {
    let named = path_sequences(graph, paths)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    for (name, seq) in named {
        writeln!(out, ">{name}")?;
        write_wrapped(out, &seq)?;
    }
    Ok(())
}

/// Render `<hmm>.seqs.fa` into a string.
pub fn render_path_sequences(results: &[PathInfo]) -> String {
    let mut buffer = Vec::new();
    write_path_sequences(&mut buffer, results)
        .unwrap_or_else(|_| unreachable!("writing into a Vec cannot fail"));
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Render `<hmm>.fa` into a string.
pub fn render_seed_sequences(graph: &AssemblyGraph, results: &[PathInfo]) -> String {
    let mut buffer = Vec::new();
    write_seed_sequences(&mut buffer, graph, results)
        .unwrap_or_else(|_| unreachable!("writing into a Vec cannot fail"));
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn result(leader: EdgeId, priority: usize, seq: &str, path: Vec<EdgeId>) -> PathInfo {
        PathInfo {
            hmm_name: "fam".into(),
            leader,
            priority,
            score: 1.5,
            seq: seq.into(),
            path,
            alignment: "4M".into(),
        }
    }

    #[test]
    fn long_sequences_wrap_at_sixty() {
        let seq = vec![b'A'; 130];
        let mut out = Vec::new();
        write_wrapped(&mut out, &seq).unwrap();
        let text = String::from_utf8(out).unwrap();
        let widths: Vec<usize> = text.lines().map(str::len).collect();
        assert_eq!(widths, [60, 60, 10]);
    }

    #[test]
    fn headers_carry_score_edges_and_alignment() {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", b"ACGTTG", 1.0, 1).unwrap();
        let b = builder.add_edge("b", b"TTGCAAT", 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        let graph = builder.build();
        let results = vec![
            result(a, 0, "ACGT", vec![a, b]),
            result(b, 1, "", vec![]),
        ];

        let seqs = render_path_sequences(&results);
        assert_eq!(seqs, ">Score=1.5000|Edges=1_3|Alignment=4M\nACGT\n");

        let seeds = render_seed_sequences(&graph, &results);
        assert_eq!(seeds, ">1_0\nACGT\n>3_1 (whole edge)\nTTGCAAT\n");
    }

    #[test]
    fn edge_paths_are_sorted_by_name() {
        let mut builder = GraphBuilder::new(3);
        let a = builder.add_edge("a", b"ACGTTG", 1.0, 1).unwrap();
        let b = builder.add_edge("b", b"TTGCAAT", 1.0, 1).unwrap();
        builder.link(a, b).unwrap();
        let graph = builder.build();
        let paths: BTreeSet<Vec<EdgeId>> = [vec![b], vec![a, b]].into_iter().collect();

        let named = path_sequences(&graph, &paths).unwrap();
        assert_eq!(named[0].0, "1_3");
        assert_eq!(named[0].1, b"ACGTTGCAAT".to_vec());
        assert_eq!(named[1].0, "3");

        let broken: BTreeSet<Vec<EdgeId>> = [vec![b, a]].into_iter().collect();
        assert!(path_sequences(&graph, &broken).is_err());
        let err = write_edge_paths(&mut Vec::new(), &graph, &broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
