//! HMMER3 ASCII profile reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::{Alphabet, Calibration, Cutoffs, Hmm, HmmError, ScoreDistribution};

/// Read every model of a profile file.
pub fn parse_hmm_file<P: AsRef<Path>>(path: P) -> Result<Vec<Hmm>, HmmError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| HmmError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let models = read_hmms(BufReader::new(file)).map_err(|err| match err {
        HmmError::Io { source, .. } => HmmError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    if models.is_empty() {
        return Err(HmmError::Empty(path.to_path_buf()));
    }
    Ok(models)
}

/// Parse all models from a reader; an empty input yields an empty vector.
pub fn read_hmms<R: BufRead>(reader: R) -> Result<Vec<Hmm>, HmmError> {
    let mut lines = Lines::new(reader);
    let mut models = Vec::new();
    while let Some((line_no, line)) = lines.next_line()? {
        if !line.starts_with("HMMER3") {
            return Err(HmmError::Parse {
                line: line_no,
                message: format!("expected a HMMER3 header, found '{line}'"),
            });
        }
        let model = parse_model(&mut lines, line_no)?;
        debug!(name = %model.name, len = model.len(), "profile parsed");
        models.push(model);
    }
    Ok(models)
}

struct Lines<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }

    /// Next non-blank line, trimmed at the end.
    fn next_line(&mut self) -> Result<Option<(usize, String)>, HmmError> {
        loop {
            let mut buffer = String::new();
            let read = self
                .reader
                .read_line(&mut buffer)
                .map_err(|source| HmmError::Io {
                    path: Default::default(),
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = buffer.trim_end();
            if !trimmed.trim_start().is_empty() {
                return Ok(Some((self.line_no, trimmed.to_string())));
            }
        }
    }

    fn expect_line(&mut self, what: &str) -> Result<(usize, String), HmmError> {
        self.next_line()?.ok_or_else(|| HmmError::Parse {
            line: self.line_no,
            message: format!("unexpected end of file, expected {what}"),
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> HmmError {
    HmmError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_cost(token: &str, line: usize) -> Result<f64, HmmError> {
    if token == "*" {
        return Ok(f64::INFINITY);
    }
    token
        .parse::<f64>()
        .map_err(|_| parse_error(line, format!("invalid value '{token}'")))
}

fn parse_costs(tokens: &[&str], count: usize, line: usize) -> Result<Vec<f64>, HmmError> {
    if tokens.len() < count {
        return Err(parse_error(
            line,
            format!("expected {count} values, found {}", tokens.len()),
        ));
    }
    tokens[..count].iter().map(|t| parse_cost(t, line)).collect()
}

fn parse_pair(rest: &[&str], line: usize) -> Result<(f64, f64), HmmError> {
    let values: Vec<f64> = rest
        .iter()
        .map(|t| t.trim_end_matches(';'))
        .filter(|t| !t.is_empty())
        .take(2)
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| parse_error(line, format!("invalid cutoff '{t}'")))
        })
        .collect::<Result<_, _>>()?;
    match values.as_slice() {
        [a, b] => Ok((*a, *b)),
        [a] => Ok((*a, *a)),
        _ => Err(parse_error(line, "cutoff line needs a value")),
    }
}

#[derive(Default)]
struct Header {
    name: Option<String>,
    accession: Option<String>,
    description: Option<String>,
    length: Option<usize>,
    alphabet: Option<Alphabet>,
    msv: Option<ScoreDistribution>,
    viterbi: Option<ScoreDistribution>,
    forward: Option<ScoreDistribution>,
    cutoffs: Cutoffs,
}

fn parse_model<R: BufRead>(lines: &mut Lines<R>, header_line: usize) -> Result<Hmm, HmmError> {
    let mut header = Header::default();

    let (hmm_line, columns) = loop {
        let (line_no, line) = lines.expect_line("the HMM block")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&tag, rest)) = tokens.split_first() else {
            continue;
        };
        match tag {
            "HMM" => break (line_no, rest.len()),
            "NAME" => header.name = rest.first().map(|s| s.to_string()),
            "ACC" => header.accession = rest.first().map(|s| s.to_string()),
            "DESC" => header.description = Some(rest.join(" ")),
            "LENG" => {
                let value = rest
                    .first()
                    .and_then(|t| t.parse::<usize>().ok())
                    .filter(|&m| m > 0)
                    .ok_or_else(|| parse_error(line_no, "LENG must be a positive integer"))?;
                header.length = Some(value);
            }
            "ALPH" => {
                let name = rest.first().copied().unwrap_or_default();
                header.alphabet = Some(
                    Alphabet::from_hmmer_name(name)
                        .ok_or_else(|| parse_error(line_no, format!("unsupported alphabet '{name}'")))?,
                );
            }
            "GA" => header.cutoffs.ga = Some(parse_pair(rest, line_no)?),
            "TC" => header.cutoffs.tc = Some(parse_pair(rest, line_no)?),
            "NC" => header.cutoffs.nc = Some(parse_pair(rest, line_no)?),
            "STATS" => {
                if rest.len() < 4 || rest[0] != "LOCAL" {
                    return Err(parse_error(line_no, "malformed STATS line"));
                }
                let location = parse_cost(rest[2], line_no)?;
                let lambda = parse_cost(rest[3], line_no)?;
                let dist = Some(ScoreDistribution { location, lambda });
                match rest[1] {
                    "MSV" => header.msv = dist,
                    "VITERBI" => header.viterbi = dist,
                    "FORWARD" => header.forward = dist,
                    other => {
                        return Err(parse_error(line_no, format!("unknown STATS kind '{other}'")))
                    }
                }
            }
            _ => {}
        }
    };

    let name = header
        .name
        .ok_or_else(|| parse_error(header_line, "model has no NAME"))?;
    let m = header
        .length
        .ok_or_else(|| parse_error(header_line, format!("model '{name}' has no LENG")))?;
    let alphabet = header
        .alphabet
        .ok_or_else(|| parse_error(header_line, format!("model '{name}' has no ALPH")))?;
    let calibration = match (header.msv, header.viterbi, header.forward) {
        (Some(msv), Some(viterbi), Some(forward)) => Calibration {
            msv,
            viterbi,
            forward,
        },
        _ => {
            return Err(parse_error(
                header_line,
                format!("model '{name}' lacks STATS LOCAL MSV/VITERBI/FORWARD lines"),
            ))
        }
    };

    let k = alphabet.size();
    if columns != k {
        return Err(parse_error(
            hmm_line,
            format!("HMM line lists {columns} symbols, {} alphabet has {k}", alphabet.hmmer_name()),
        ));
    }
    // transition column header
    lines.expect_line("the transition header")?;

    let mut match_costs = Vec::with_capacity(m + 1);
    let mut insert_costs = Vec::with_capacity(m + 1);
    let mut transitions = Vec::with_capacity(m + 1);

    let (first_no, first) = lines.expect_line("node 0")?;
    let compo = first.split_whitespace().collect::<Vec<_>>();
    let (line_no, line) = if compo.first() == Some(&"COMPO") {
        match_costs.push(parse_costs(&compo[1..], k, first_no)?);
        lines.expect_line("node 0 insert emissions")?
    } else {
        match_costs.push(vec![f64::INFINITY; k]);
        (first_no, first.clone())
    };
    let tokens: Vec<&str> = line.split_whitespace().collect();
    insert_costs.push(parse_costs(&tokens, k, line_no)?);
    transitions.push(parse_transitions(lines)?);

    for node in 1..=m {
        let (line_no, line) = lines.expect_line("a match emission line")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let index = tokens.first().and_then(|t| t.parse::<usize>().ok());
        if index != Some(node) {
            return Err(parse_error(
                line_no,
                format!("expected node {node}, found '{}'", tokens.first().unwrap_or(&"")),
            ));
        }
        match_costs.push(parse_costs(&tokens[1..], k, line_no)?);

        let (line_no, line) = lines.expect_line("an insert emission line")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        insert_costs.push(parse_costs(&tokens, k, line_no)?);
        transitions.push(parse_transitions(lines)?);
    }

    let (line_no, line) = lines.expect_line("the '//' terminator")?;
    if line.trim() != "//" {
        return Err(parse_error(line_no, format!("expected '//', found '{line}'")));
    }

    Ok(Hmm {
        name,
        accession: header.accession,
        description: header.description,
        alphabet,
        match_costs,
        insert_costs,
        transitions,
        calibration,
        cutoffs: header.cutoffs,
    })
}

fn parse_transitions<R: BufRead>(lines: &mut Lines<R>) -> Result<[f64; 7], HmmError> {
    let (line_no, line) = lines.expect_line("a transition line")?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let values = parse_costs(&tokens, 7, line_no)?;
    let mut out = [0.0; 7];
    out.copy_from_slice(&values);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::fixtures::profile_text;
    use crate::hmm::Transition;

    #[test]
    fn parses_synthetic_profile() {
        let text = profile_text("toy", Alphabet::Dna, b"ACGTA");
        let models = read_hmms(text.as_bytes()).unwrap();
        assert_eq!(models.len(), 1);
        let hmm = &models[0];
        assert_eq!(hmm.name(), "toy");
        assert_eq!(hmm.accession(), Some("PF00005.1"));
        assert_eq!(hmm.description(), Some("synthetic toy family"));
        assert_eq!(hmm.alphabet(), Alphabet::Dna);
        assert_eq!(hmm.len(), 5);
        assert!((hmm.match_cost(1, 0) - 0.16252).abs() < 1e-9);
        assert!((hmm.transition_cost(0, Transition::MM) - 0.10536).abs() < 1e-9);
        assert!(hmm.transition_cost(0, Transition::DD).is_infinite());
        assert_eq!(hmm.cutoffs().ga, Some((5.0, 4.0)));
        assert_eq!(hmm.cutoffs().tc, None);
        assert!((hmm.calibration().forward.location + 4.0).abs() < 1e-12);
    }

    #[test]
    fn reads_several_models() {
        let mut text = profile_text("one", Alphabet::Dna, b"ACGT");
        text.push_str(&profile_text("two", Alphabet::Amino, b"MKV"));
        let models = read_hmms(text.as_bytes()).unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["one", "two"]);
        assert_eq!(models[1].alphabet(), Alphabet::Amino);
    }

    #[test]
    fn missing_stats_is_an_error() {
        let text = profile_text("toy", Alphabet::Dna, b"ACGT").replace("STATS LOCAL MSV", "XSTATS");
        let err = read_hmms(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("STATS"), "{err}");
    }

    #[test]
    fn truncated_file_reports_line() {
        let text = profile_text("toy", Alphabet::Dna, b"ACGT");
        let cut: String = text.lines().take(20).map(|l| format!("{l}\n")).collect();
        match read_hmms(cut.as_bytes()) {
            Err(HmmError::Parse { message, .. }) => assert!(message.contains("end of file")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn garbage_header_is_rejected() {
        let err = read_hmms("not a profile\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HmmError::Parse { line: 1, .. }));
    }

    #[test]
    fn symbol_header_must_match_alphabet() {
        let text = profile_text("toy", Alphabet::Dna, b"ACGT").replace("ALPH  DNA", "ALPH  amino");
        let hmm_line = text.lines().position(|l| l.starts_with("HMM ")).unwrap() + 1;
        match read_hmms(text.as_bytes()) {
            Err(HmmError::Parse { line, message }) => {
                assert_eq!(line, hmm_line);
                assert!(message.contains("4 symbols"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
