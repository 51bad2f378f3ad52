//! Residue alphabets, background composition and codon translation.

/// Residue alphabet of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Alphabet {
    /// Nucleotides, K = 4.
    Dna,
    /// Amino acids, K = 20.
    Amino,
}

/// Classification of a residue byte within an alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residue {
    /// Index into the canonical symbols.
    Canonical(usize),
    /// Ambiguity code standing for any canonical symbol.
    Degenerate,
    /// Not representable (stop codon, gap, junk).
    Forbidden,
}

const DNA_SYMBOLS: &[u8] = b"ACGT";
const AMINO_SYMBOLS: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

const DNA_BACKGROUND: [f64; 4] = [0.25, 0.25, 0.25, 0.25];

// BLOSUM62 background composition, in AMINO_SYMBOLS order.
const AMINO_BACKGROUND: [f64; 20] = [
    0.0787945, 0.0151600, 0.0535222, 0.0668298, 0.0397062, 0.0695071, 0.0229198, 0.0590092,
    0.0594422, 0.0963728, 0.0237718, 0.0414386, 0.0482904, 0.0395639, 0.0540978, 0.0683364,
    0.0540687, 0.0673417, 0.0114135, 0.0304133,
];

impl Alphabet {
    /// Parse the `ALPH` field of a profile file.
    pub fn from_hmmer_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dna" | "rna" => Some(Alphabet::Dna),
            "amino" => Some(Alphabet::Amino),
            _ => None,
        }
    }

    /// Name written back into profile headers.
    pub fn hmmer_name(self) -> &'static str {
        match self {
            Alphabet::Dna => "DNA",
            Alphabet::Amino => "amino",
        }
    }

    /// Number of canonical symbols (K).
    pub fn size(self) -> usize {
        self.symbols().len()
    }

    /// Canonical symbols in column order.
    pub fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Dna => DNA_SYMBOLS,
            Alphabet::Amino => AMINO_SYMBOLS,
        }
    }

    /// Background frequencies in column order.
    pub fn background(self) -> &'static [f64] {
        match self {
            Alphabet::Dna => &DNA_BACKGROUND,
            Alphabet::Amino => &AMINO_BACKGROUND,
        }
    }

    /// Classify a residue byte (case-insensitive).
    pub fn residue(self, byte: u8) -> Residue {
        let upper = byte.to_ascii_uppercase();
        match self {
            Alphabet::Dna => match upper {
                b'A' => Residue::Canonical(0),
                b'C' => Residue::Canonical(1),
                b'G' => Residue::Canonical(2),
                b'T' | b'U' => Residue::Canonical(3),
                b'N' | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M' | b'B' | b'D' | b'H' | b'V' => {
                    Residue::Degenerate
                }
                _ => Residue::Forbidden,
            },
            Alphabet::Amino => match AMINO_SYMBOLS.iter().position(|&s| s == upper) {
                Some(idx) => Residue::Canonical(idx),
                None if matches!(upper, b'X' | b'B' | b'Z' | b'J' | b'U' | b'O') => {
                    Residue::Degenerate
                }
                None => Residue::Forbidden,
            },
        }
    }
}

// Standard genetic code, codons enumerated in TCAG order.
const CODON_TABLE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn tcag_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Amino acid for a codon; `*` for stops, `X` when a base is ambiguous.
pub fn translate_codon(codon: [u8; 3]) -> u8 {
    match (tcag_index(codon[0]), tcag_index(codon[1]), tcag_index(codon[2])) {
        (Some(a), Some(b), Some(c)) => CODON_TABLE[a * 16 + b * 4 + c],
        _ => b'X',
    }
}

/// Translate whole codons of `seq` in frame 0; a trailing partial codon is dropped.
pub fn translate(seq: &[u8]) -> Vec<u8> {
    seq.chunks_exact(3)
        .map(|codon| translate_codon([codon[0], codon[1], codon[2]]))
        .collect()
}
