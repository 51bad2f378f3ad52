mod common;

use common::{dna_profile, linear_family, profile, search_config, FAMILY, STRANGER};
use graphhmm::cursor::{make_aa_cursors, GraphCursor};
use graphhmm::hmm::{Alphabet, Fees};
use graphhmm::search::{extract_neighbourhoods, join_components, matched_edges, score_edges};
use graphhmm::{trace_hmm, EdgeCursor, GraphBuilder, GraphComponent};

#[test]
fn linear_graph_spells_the_family() {
    let (graph, edges) = linear_family();
    let hmm = dna_profile("fam", FAMILY);
    let report = trace_hmm(&graph, &hmm, &search_config()).unwrap();

    let best = &report.results[0];
    assert_eq!(best.path, edges);
    assert_eq!(best.seq.as_bytes(), FAMILY);
    assert_eq!(best.alignment, "30M");
    let self_score = Fees::new(&hmm).all_match_cost(FAMILY).unwrap();
    assert!((best.score - self_score).abs() < 1e-9);
    for result in &report.results {
        assert!(graph.is_walk(&result.path));
    }
}

#[test]
fn branch_point_prefers_matching_arm() {
    let mut builder = GraphBuilder::new(3);
    let stem = builder.add_edge("stem", &FAMILY[..16], 1.0, 1).unwrap();
    let good = builder.add_edge("good", &FAMILY[13..], 1.0, 1).unwrap();
    let bad = builder
        .add_edge("bad", b"CATGGCTTAGCATTGGACCA", 1.0, 1)
        .unwrap();
    builder.link(stem, good).unwrap();
    builder.link(stem, bad).unwrap();
    let graph = builder.build();

    let hmm = dna_profile("fam", FAMILY);
    let report = trace_hmm(&graph, &hmm, &search_config()).unwrap();
    assert_eq!(report.results[0].path, vec![stem, good]);
    if let Some(other) = report.results.iter().find(|r| r.path.contains(&bad)) {
        assert!(other.score > report.results[0].score);
    }
}

#[test]
fn overlapping_seeds_share_one_component() {
    let (graph, edges) = linear_family();
    let hmm = dna_profile("fam", FAMILY);
    let config = search_config();

    let candidates: Vec<_> = graph.edges().collect();
    let matcher = score_edges(&graph, &candidates, &hmm, &config.hmmer).unwrap();
    let matched = matched_edges(&candidates, &matcher);
    for edge in &edges {
        assert!(matched.contains_key(edge), "edge {edge} not matched");
    }

    let joined = join_components(&graph, extract_neighbourhoods(&graph, &matched, 2));
    let holder = joined
        .iter()
        .find(|n| edges.contains(&n.seed))
        .expect("chain neighbourhood survives");
    for edge in &edges {
        assert!(*edge == holder.seed || holder.absorbed.contains(edge));
    }

    let report = trace_hmm(&graph, &hmm, &config).unwrap();
    let along_chain: Vec<_> = report.results.iter().filter(|r| r.path == edges).collect();
    assert!(!along_chain.is_empty());
    assert!(along_chain.iter().all(|r| r.leader == holder.seed));
}

#[test]
fn amino_profile_follows_codon_across_branch() {
    // a ends in the first base of the V codon; good continues GTG, bad GCC
    let mut builder = GraphBuilder::new(3);
    let a = builder.add_edge("a", b"ATGAAAG", 1.0, 1).unwrap();
    let good = builder.add_edge("good", b"AAGTGCTGGCGTGG", 1.0, 1).unwrap();
    let bad = builder.add_edge("bad", b"AAGCCATTCGGATAC", 1.0, 1).unwrap();
    builder.link(a, good).unwrap();
    builder.link(a, bad).unwrap();
    let graph = builder.build();

    let whole = GraphComponent::whole(&graph);
    let split = make_aa_cursors(&whole, &[EdgeCursor::new(a, 6)]);
    let mut letters: Vec<u8> = split.iter().map(|c| c.letter(&whole)).collect();
    letters.sort_unstable();
    assert_eq!(letters, b"AV".to_vec());
    for codon in &split {
        let walked = codon.nucleotide_cursors();
        assert_eq!(walked.len(), 3);
        assert_eq!(walked[1].position(), 3);
        assert_eq!(walked[2].position(), 4);
    }

    let hmm = profile("prot", Alphabet::Amino, b"MKVLAW");
    let report = trace_hmm(&graph, &hmm, &search_config()).unwrap();
    let best = &report.results[0];
    assert_eq!(best.seq, "MKVLAW");
    assert_eq!(best.path, vec![a, good]);
}

#[test]
fn oversized_component_is_skipped_alone() {
    let mut builder = GraphBuilder::new(3);
    let pieces: [&[u8]; 3] = [&FAMILY[..12], &FAMILY[9..21], &FAMILY[18..]];
    let chain_edges: Vec<_> = pieces
        .iter()
        .enumerate()
        .map(|(idx, seq)| builder.add_edge(&format!("c{idx}"), seq, 1.0, 1).unwrap())
        .collect();
    builder.link(chain_edges[0], chain_edges[1]).unwrap();
    builder.link(chain_edges[1], chain_edges[2]).unwrap();
    let lone = builder.add_edge("lone", &FAMILY[..16], 1.0, 1).unwrap();
    let graph = builder.build();

    let hmm = dna_profile("fam", FAMILY);
    let report = trace_hmm(&graph, &hmm, &search_config().with_max_size(2)).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert!(chain_edges.contains(&report.skipped[0]));
    assert!(!report.results.is_empty());
    assert!(report.results.iter().all(|r| r.leader == lone && r.path == vec![lone]));
}

#[test]
fn unrelated_profile_finds_nothing() {
    let (graph, _) = linear_family();
    let hmm = dna_profile("stranger", STRANGER);
    let report = trace_hmm(&graph, &hmm, &search_config()).unwrap();
    assert!(report.matched.is_empty());
    assert!(report.results.is_empty());
    assert!(report.gfa_paths().is_empty());
}

#[test]
fn self_loop_is_walked() {
    let mut builder = GraphBuilder::new(3);
    let looped = builder.add_edge("loop", b"ACGTTACG", 1.0, 1).unwrap();
    builder.link(looped, looped).unwrap();
    let looped_graph = builder.build();

    let hmm = dna_profile("loop", b"ACGTTACGTTACGTTACG");
    let report = trace_hmm(&looped_graph, &hmm, &search_config()).unwrap();
    let best = &report.results[0];
    assert!(!best.path.is_empty());
    assert!(best.path.iter().all(|&e| e == looped));
    assert!(looped_graph.is_walk(&best.path));
    assert_eq!(best.seq.as_bytes(), b"ACGTTACGTTACGTTACG");
}

#[test]
fn zero_max_size_skips_every_component() {
    let (graph, _) = linear_family();
    let hmm = dna_profile("fam", FAMILY);
    let report = trace_hmm(&graph, &hmm, &search_config().with_max_size(0)).unwrap();
    assert!(report.results.is_empty());
    assert!(!report.skipped.is_empty());
}
