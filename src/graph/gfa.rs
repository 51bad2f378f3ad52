//! GFA 1 segment/link reader and writer.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::info;

use super::{AssemblyGraph, EdgeId, GraphBuilder, GraphError};

struct SegmentRecord {
    line: usize,
    name: String,
    seq: Vec<u8>,
    coverage: f64,
    kmers: u64,
}

struct LinkRecord {
    line: usize,
    from: String,
    from_forward: bool,
    to: String,
    to_forward: bool,
}

/// Load a GFA file from disk.
pub fn load_gfa<P: AsRef<Path>>(path: P, k: usize) -> Result<AssemblyGraph, GraphError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_gfa(BufReader::new(file), k).map_err(|err| match err {
        GraphError::Io { source, .. } => GraphError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parse `S` and `L` records; every other record type is skipped.
pub fn read_gfa<R: BufRead>(reader: R, k: usize) -> Result<AssemblyGraph, GraphError> {
    let mut segments = Vec::new();
    let mut links = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| GraphError::Io {
            path: Default::default(),
            source,
        })?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields[0] {
            "S" => segments.push(parse_segment(&fields, line_no)?),
            "L" => links.push(parse_link(&fields, line_no, k)?),
            _ => {}
        }
    }

    info!(segments = segments.len(), links = links.len(), "GFA records parsed");

    let mut builder = GraphBuilder::new(k);
    for segment in &segments {
        builder
            .add_edge(&segment.name, &segment.seq, segment.coverage, segment.kmers)
            .map_err(|err| match err {
                GraphError::DuplicateSegment(_) | GraphError::Palindrome(_) => err,
                other => GraphError::Parse {
                    line: segment.line,
                    message: other.to_string(),
                },
            })?;
    }
    for link in &links {
        let from = oriented(&builder, &link.from, link.from_forward)?;
        let to = oriented(&builder, &link.to, link.to_forward)?;
        builder.link(from, to).map_err(|err| GraphError::Parse {
            line: link.line,
            message: err.to_string(),
        })?;
    }

    Ok(builder.build())
}

fn oriented(builder: &GraphBuilder, name: &str, forward: bool) -> Result<EdgeId, GraphError> {
    let e = builder
        .edge_by_name(name)
        .ok_or_else(|| GraphError::UnknownSegment(name.to_string()))?;
    Ok(if forward { e } else { builder.conjugate(e) })
}

fn parse_segment(fields: &[&str], line: usize) -> Result<SegmentRecord, GraphError> {
    if fields.len() < 3 || fields[2] == "*" {
        return Err(GraphError::Parse {
            line,
            message: "segment record needs a name and an explicit sequence".to_string(),
        });
    }
    let mut coverage = 0.0;
    let mut kmers = 0;
    for tag in &fields[3..] {
        if let Some(value) = tag.strip_prefix("DP:f:") {
            coverage = value.parse().map_err(|_| GraphError::Parse {
                line,
                message: format!("invalid DP tag '{tag}'"),
            })?;
        } else if let Some(value) = tag.strip_prefix("KC:i:") {
            kmers = value.parse().map_err(|_| GraphError::Parse {
                line,
                message: format!("invalid KC tag '{tag}'"),
            })?;
        }
    }
    Ok(SegmentRecord {
        line,
        name: fields[1].to_string(),
        seq: fields[2].as_bytes().to_vec(),
        coverage,
        kmers,
    })
}

fn parse_link(fields: &[&str], line: usize, k: usize) -> Result<LinkRecord, GraphError> {
    if fields.len() < 6 {
        return Err(GraphError::Parse {
            line,
            message: "link record needs six fields".to_string(),
        });
    }
    let orientation = |field: &str| match field {
        "+" => Ok(true),
        "-" => Ok(false),
        other => Err(GraphError::Parse {
            line,
            message: format!("invalid orientation '{other}'"),
        }),
    };
    let overlap = fields[5]
        .strip_suffix('M')
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| GraphError::Parse {
            line,
            message: format!("unsupported overlap '{}'", fields[5]),
        })?;
    if overlap != k {
        return Err(GraphError::KMismatch { found: overlap, k });
    }
    Ok(LinkRecord {
        line,
        from: fields[1].to_string(),
        from_forward: orientation(fields[2])?,
        to: fields[3].to_string(),
        to_forward: orientation(fields[4])?,
    })
}

/// Writes a graph (and optional named walks) as GFA 1.
#[derive(Debug)]
pub struct GfaWriter<'g, W: Write> {
    graph: &'g AssemblyGraph,
    out: W,
}

impl<'g, W: Write> GfaWriter<'g, W> {
    /// Wrap an output stream.
    pub fn new(graph: &'g AssemblyGraph, out: W) -> Self {
        Self { graph, out }
    }

    /// `S` lines for canonical edges.
    pub fn write_segments(&mut self) -> io::Result<()> {
        for e in self.graph.canonical_edges() {
            writeln!(
                self.out,
                "S\t{}\t{}\tDP:f:{}\tKC:i:{}",
                self.graph.name(e),
                String::from_utf8_lossy(self.graph.nucleotides(e)),
                self.graph.coverage(e) as f32,
                self.graph.multiplicity(e)
            )?;
        }
        Ok(())
    }

    /// `L` lines for every incoming/outgoing pair at canonical vertices.
    pub fn write_links(&mut self) -> io::Result<()> {
        let k = self.graph.k();
        for v in self.graph.canonical_vertices() {
            for &inc in self.graph.incoming(v) {
                for &out in self.graph.outgoing(v) {
                    writeln!(
                        self.out,
                        "L\t{}\t{}\t{}M",
                        self.orientation_string(inc, "\t"),
                        self.orientation_string(out, "\t"),
                        k
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Segments followed by links.
    pub fn write_segments_and_links(&mut self) -> io::Result<()> {
        self.write_segments()?;
        self.write_links()
    }

    /// One `P` line for a walk.
    pub fn write_path(&mut self, name: &str, path: &[EdgeId]) -> io::Result<()> {
        let segments: Vec<String> = path
            .iter()
            .map(|&e| self.orientation_string(e, ""))
            .collect();
        writeln!(self.out, "P\t{}\t{}\t*", name, segments.join(","))
    }

    /// Flush and hand back the stream.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn orientation_string(&self, e: EdgeId, sep: &str) -> String {
        let sign = if e.is_canonical() { '+' } else { '-' };
        format!("{}{}{}", self.graph.name(e), sep, sign)
    }
}
