#![allow(dead_code)]

use std::fmt::Write;

use graphhmm::hmm::{read_hmms, Alphabet, Hmm, HmmerConfig};
use graphhmm::{AssemblyGraph, EdgeId, GraphBuilder, SearchConfig};

/// Family spelled by the linear test graph.
pub const FAMILY: &[u8] = b"ACGTTGCAGGTACCATGACTCGATAGCTTA";

/// Unrelated to every test graph.
pub const STRANGER: &[u8] = b"TTTTGGGGCCCCAAAATTTTGGGGCCCCAA";

fn cost(p: f64) -> String {
    if p <= 0.0 {
        "*".to_string()
    } else {
        format!("{:.5}", -p.ln())
    }
}

fn row(values: impl IntoIterator<Item = f64>) -> String {
    values.into_iter().map(|p| format!(" {:>8}", cost(p))).collect()
}

/// HMMER3 text of a profile whose match columns prefer `consensus`.
pub fn profile_text(name: &str, alphabet: Alphabet, consensus: &[u8]) -> String {
    let symbols = alphabet.symbols();
    let k = symbols.len();
    let (hit, miss) = match alphabet {
        Alphabet::Dna => (0.85, 0.05),
        Alphabet::Amino => (0.81, 0.01),
    };
    let uniform = vec![1.0 / k as f64; k];
    let m = consensus.len();
    let mut text = String::new();

    writeln!(text, "HMMER3/f [3.1b2 | February 2015]").unwrap();
    writeln!(text, "NAME  {name}").unwrap();
    writeln!(text, "LENG  {m}").unwrap();
    writeln!(text, "ALPH  {}", alphabet.hmmer_name()).unwrap();
    writeln!(text, "STATS LOCAL MSV       -5.0000  0.69315").unwrap();
    writeln!(text, "STATS LOCAL VITERBI   -5.5000  0.69315").unwrap();
    writeln!(text, "STATS LOCAL FORWARD   -4.0000  0.69315").unwrap();
    let header: String = symbols.iter().map(|&s| format!(" {:>8}", s as char)).collect();
    writeln!(text, "HMM     {header}").unwrap();
    writeln!(
        text,
        "            m->m     m->i     m->d     i->m     i->i     d->m     d->d"
    )
    .unwrap();
    writeln!(text, "        {}", row(uniform.iter().copied())).unwrap();
    writeln!(text, "        {}", row([0.9, 0.05, 0.05, 0.5, 0.5, 1.0, 0.0])).unwrap();
    for (idx, &residue) in consensus.iter().enumerate() {
        let node = idx + 1;
        let emissions = symbols
            .iter()
            .map(|&s| if s == residue { hit } else { miss });
        writeln!(text, "  {node:>5} {}", row(emissions)).unwrap();
        writeln!(text, "        {}", row(uniform.iter().copied())).unwrap();
        let transitions = if node == m {
            [1.0, 0.0, 0.0, 0.5, 0.5, 1.0, 0.0]
        } else {
            [0.9, 0.05, 0.05, 0.5, 0.5, 0.5, 0.5]
        };
        writeln!(text, "        {}", row(transitions)).unwrap();
    }
    writeln!(text, "//").unwrap();
    text
}

pub fn profile(name: &str, alphabet: Alphabet, consensus: &[u8]) -> Hmm {
    let text = profile_text(name, alphabet, consensus);
    read_hmms(text.as_bytes())
        .expect("test profile parses")
        .remove(0)
}

pub fn dna_profile(name: &str, consensus: &[u8]) -> Hmm {
    profile(name, Alphabet::Dna, consensus)
}

/// Edges `pieces[i]` linked in order; consecutive pieces must overlap by `k`.
pub fn chain(k: usize, pieces: &[&[u8]]) -> (AssemblyGraph, Vec<EdgeId>) {
    let mut builder = GraphBuilder::new(k);
    let edges: Vec<EdgeId> = pieces
        .iter()
        .enumerate()
        .map(|(idx, seq)| {
            builder
                .add_edge(&format!("e{}", idx + 1), seq, 10.0, 20)
                .expect("valid edge")
        })
        .collect();
    for pair in edges.windows(2) {
        builder.link(pair[0], pair[1]).expect("edges overlap");
    }
    (builder.build(), edges)
}

/// `FAMILY` split into three edges of twelve nucleotides, k = 3.
pub fn linear_family() -> (AssemblyGraph, Vec<EdgeId>) {
    chain(3, &[&FAMILY[..12], &FAMILY[9..21], &FAMILY[18..]])
}

/// Single-threaded search with the acceleration filters off.
pub fn search_config() -> SearchConfig {
    SearchConfig::default()
        .with_threads(1)
        .with_hmmer(HmmerConfig::default().with_max(true))
}
