mod common;

use std::collections::HashSet;

use blake3::hash;
use common::{dna_profile, linear_family, search_config, FAMILY};
use graphhmm::output::{render_path_sequences, render_seed_sequences};
use graphhmm::run;

#[test]
fn repeated_runs_render_identical_results() {
    let (graph, _) = linear_family();
    let hmms = vec![
        dna_profile("fam", FAMILY),
        dna_profile("head", &FAMILY[..20]),
        dna_profile("tail", &FAMILY[10..]),
    ];

    let mut fingerprints = HashSet::new();
    for threads in [1, 2, 4, 4, 1] {
        let reports = run(&graph, &hmms, &search_config().with_threads(threads))
            .expect("search succeeds");
        let mut rendered = String::new();
        for report in &reports {
            rendered.push_str(&render_path_sequences(&report.results));
            rendered.push_str(&render_seed_sequences(&graph, &report.results));
        }
        fingerprints.insert(hash(rendered.as_bytes()));
    }

    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
