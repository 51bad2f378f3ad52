//! Reader for the assembler's basic graph dump: `<prefix>.grp` holds the
//! topology, `<prefix>.sqn` the edge sequences and the optional
//! `<prefix>.cvr` the edge coverages.
//!
//! ```text
//! 4 2
//! Vertex 1 ~ 2 .
//! Vertex 2 ~ 1 .
//! Edge 3 : 1 -> 2, l = 12 ~ 4 .
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{reverse_complement, AssemblyGraph, EdgeId, GraphBuilder, GraphError};

#[derive(Debug, Clone, Copy)]
struct EdgeRecord {
    start: u64,
    end: u64,
    length: usize,
    conjugate: u64,
}

/// Load `<prefix>.grp`/`.sqn`/`.cvr`; `path` may name the `.grp` file or the prefix.
pub fn load_basic_graph<P: AsRef<Path>>(path: P, k: usize) -> Result<AssemblyGraph, GraphError> {
    let path = path.as_ref();
    let text = path.to_string_lossy();
    let prefix = text.strip_suffix(".grp").unwrap_or(text.as_ref()).to_string();

    let topology = read_file(&PathBuf::from(format!("{prefix}.grp")))?;
    let sequences = read_file(&PathBuf::from(format!("{prefix}.sqn")))?;
    let coverage_path = PathBuf::from(format!("{prefix}.cvr"));
    let coverages = if coverage_path.exists() {
        parse_coverage(&read_file(&coverage_path)?)?
    } else {
        HashMap::new()
    };

    let edges = parse_topology(&topology)?;
    let seqs = parse_sequences(&sequences)?;
    info!(edges = edges.len(), "basic graph topology parsed");
    assemble(k, &edges, &seqs, &coverages)
}

fn read_file(path: &Path) -> Result<String, GraphError> {
    fs::read_to_string(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_topology(text: &str) -> Result<BTreeMap<u64, EdgeRecord>, GraphError> {
    let mut edges = BTreeMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.first() != Some(&"Edge") {
            continue;
        }
        // Edge <id> : <start> -> <end> l = <len> ~ <conj> .
        let bad = || GraphError::Parse {
            line: line_no,
            message: format!("malformed edge record '{line}'"),
        };
        if tokens.len() < 11 || tokens[2] != ":" || tokens[4] != "->" || tokens[9] != "~" {
            return Err(bad());
        }
        let number = |token: &str| token.parse::<u64>().map_err(|_| bad());
        let id = number(tokens[1])?;
        let record = EdgeRecord {
            start: number(tokens[3])?,
            end: number(tokens[5])?,
            length: number(tokens[8])? as usize,
            conjugate: number(tokens[10])?,
        };
        edges.insert(id, record);
    }
    Ok(edges)
}

fn parse_sequences(text: &str) -> Result<HashMap<u64, Vec<u8>>, GraphError> {
    let mut seqs = HashMap::new();
    let mut current: Option<(u64, Vec<u8>)> = None;
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, seq)) = current.take() {
                seqs.insert(id, seq);
            }
            let id = header
                .split_whitespace()
                .next()
                .and_then(|token| token.parse::<u64>().ok())
                .ok_or_else(|| GraphError::Parse {
                    line: idx + 1,
                    message: format!("sequence header '{line}' lacks an edge id"),
                })?;
            current = Some((id, Vec::new()));
        } else if let Some((_, seq)) = current.as_mut() {
            seq.extend_from_slice(line.as_bytes());
        }
    }
    if let Some((id, seq)) = current {
        seqs.insert(id, seq);
    }
    Ok(seqs)
}

fn parse_coverage(text: &str) -> Result<HashMap<u64, f64>, GraphError> {
    let mut coverage = HashMap::new();
    for (idx, line) in text.lines().enumerate().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        let parsed = tokens[0]
            .parse::<u64>()
            .ok()
            .zip(tokens[1].parse::<f64>().ok())
            .ok_or_else(|| GraphError::Parse {
                line: idx + 1,
                message: format!("malformed coverage record '{line}'"),
            })?;
        coverage.insert(parsed.0, parsed.1);
    }
    Ok(coverage)
}

fn assemble(
    k: usize,
    edges: &BTreeMap<u64, EdgeRecord>,
    seqs: &HashMap<u64, Vec<u8>>,
    coverages: &HashMap<u64, f64>,
) -> Result<AssemblyGraph, GraphError> {
    let mut builder = GraphBuilder::new(k);
    let mut handles: HashMap<u64, EdgeId> = HashMap::new();

    for (&id, record) in edges {
        if handles.contains_key(&id) {
            continue;
        }
        let seq = seqs
            .get(&id)
            .ok_or_else(|| GraphError::UnknownSegment(id.to_string()))?;
        if seq.len() != record.length + k {
            return Err(GraphError::Conjugate(format!(
                "edge {id} declares length {} but carries {} nucleotides with k = {k}",
                record.length,
                seq.len()
            )));
        }
        let conj = edges
            .get(&record.conjugate)
            .ok_or_else(|| GraphError::Conjugate(format!("edge {id} has no conjugate")))?;
        if conj.conjugate != id {
            return Err(GraphError::Conjugate(format!(
                "edges {id} and {} are not mutual conjugates",
                record.conjugate
            )));
        }
        if let Some(conj_seq) = seqs.get(&record.conjugate) {
            if *conj_seq != reverse_complement(seq) {
                return Err(GraphError::Conjugate(format!(
                    "edge {} is not the reverse complement of edge {id}",
                    record.conjugate
                )));
            }
        }
        let coverage = coverages.get(&id).copied().unwrap_or(0.0);
        let multiplicity = (coverage * record.length as f64).round() as u64;
        let forward = builder.add_edge(&id.to_string(), seq, coverage, multiplicity)?;
        handles.insert(id, forward);
        handles.insert(record.conjugate, builder.conjugate(forward));
    }

    // Declared vertex ids glue endpoints even where no edge passes through.
    let mut by_start: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    let mut by_end: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for (&id, record) in edges {
        by_start.entry(record.start).or_default().push(id);
        by_end.entry(record.end).or_default().push(id);
    }
    for (&id, record) in edges {
        for &next in by_start.get(&record.end).into_iter().flatten() {
            builder.link(handles[&id], handles[&next])?;
        }
    }
    for group in by_start.values() {
        for pair in group.windows(2) {
            builder.share_start(handles[&pair[0]], handles[&pair[1]])?;
        }
    }
    for group in by_end.values() {
        for pair in group.windows(2) {
            builder.share_end(handles[&pair[0]], handles[&pair[1]])?;
        }
    }

    Ok(builder.build())
}
