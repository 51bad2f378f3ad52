//! Synthetic profiles for unit tests: each column strongly prefers one residue
//! of a consensus string.

use std::fmt::Write;

use super::{read_hmms, Alphabet, Hmm};

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

/// HMMER3 text of a profile whose columns emit `consensus`.
pub(crate) fn profile_text(name: &str, alphabet: Alphabet, consensus: &[u8]) -> String {
    let symbols = alphabet.symbols();
    let k = symbols.len();
    let (hit, miss) = match alphabet {
        Alphabet::Dna => (0.85, 0.05),
        Alphabet::Amino => (0.81, 0.01),
    };
    let uniform = vec![1.0 / k as f64; k];
    let m = consensus.len();
    let mut text = String::new();

    let _ = writeln!(text, "HMMER3/f [3.1b2 | February 2015]");
    let _ = writeln!(text, "NAME  {name}");
    let _ = writeln!(text, "ACC   PF{:05}.1", m);
    let _ = writeln!(text, "DESC  synthetic {name} family");
    let _ = writeln!(text, "LENG  {m}");
    let _ = writeln!(text, "ALPH  {}", alphabet.hmmer_name());
    let _ = writeln!(text, "GA    5.00 4.00;");
    let _ = writeln!(text, "STATS LOCAL MSV       -5.0000  0.69315");
    let _ = writeln!(text, "STATS LOCAL VITERBI   -5.5000  0.69315");
    let _ = writeln!(text, "STATS LOCAL FORWARD   -4.0000  0.69315");
    let header: String = symbols.iter().map(|&s| format!(" {:>8}", s as char)).collect();
    let _ = writeln!(text, "HMM     {header}");
    let _ = writeln!(
        text,
        "            m->m     m->i     m->d     i->m     i->i     d->m     d->d"
    );
    let _ = writeln!(text, "  COMPO {}", row(uniform.iter().copied()));
    let _ = writeln!(text, "        {}", row(uniform.iter().copied()));
    let _ = writeln!(text, "        {}", row([0.9, 0.05, 0.05, 0.5, 0.5, 1.0, 0.0]));
    for (idx, &residue) in consensus.iter().enumerate() {
        let node = idx + 1;
        let emissions = symbols
            .iter()
            .map(|&s| if s == residue.to_ascii_uppercase() { hit } else { miss });
        let _ = writeln!(
            text,
            "  {node:>5} {} {node} {} - - -",
            row(emissions),
            residue.to_ascii_lowercase() as char
        );
        let _ = writeln!(text, "        {}", row(uniform.iter().copied()));
        let transitions = if node == m {
            [1.0, 0.0, 0.0, 0.5, 0.5, 1.0, 0.0]
        } else {
            [0.9, 0.05, 0.05, 0.5, 0.5, 0.5, 0.5]
        };
        let _ = writeln!(text, "        {}", row(transitions));
    }
    let _ = writeln!(text, "//");
    text
}

/// Parsed profile whose columns emit `consensus`.
pub(crate) fn profile(name: &str, alphabet: Alphabet, consensus: &[u8]) -> Hmm {
    let text = profile_text(name, alphabet, consensus);
    let mut models = read_hmms(text.as_bytes()).expect("synthetic profile parses");
    models.remove(0)
}
