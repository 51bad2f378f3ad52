use std::fmt;

/// Profile state kind visited by a path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StateKind {
    /// Begin state (`M_0`).
    Begin,
    /// Match state: emits and advances a column.
    Match,
    /// Insert state: emits without advancing.
    Insert,
    /// Delete state: advances without emitting.
    Delete,
    /// End state.
    End,
}

/// Alignment operation kinds of a path against the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CigarOpKind {
    /// Residue aligned to a match column.
    Match,
    /// Residue with no model column.
    Insertion,
    /// Model column skipped.
    Deletion,
}

impl CigarOpKind {
    fn code(self) -> char {
        match self {
            CigarOpKind::Match => 'M',
            CigarOpKind::Insertion => 'I',
            CigarOpKind::Deletion => 'D',
        }
    }
}

/// Run of identical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Run length.
    pub len: u32,
}

impl CigarOp {
    /// Construct a run.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

impl fmt::Display for CigarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.len, self.kind.code())
    }
}

/// Run-length encode the emitting/deleting states of a path.
pub fn compress_states<I: IntoIterator<Item = StateKind>>(states: I) -> Vec<CigarOp> {
    let mut ops: Vec<CigarOp> = Vec::new();
    for state in states {
        let kind = match state {
            StateKind::Match => CigarOpKind::Match,
            StateKind::Insert => CigarOpKind::Insertion,
            StateKind::Delete => CigarOpKind::Deletion,
            StateKind::Begin | StateKind::End => continue,
        };
        match ops.last_mut() {
            Some(last) if last.kind == kind => last.len += 1,
            _ => ops.push(CigarOp::new(kind, 1)),
        }
    }
    ops
}

/// `12M1I3M`-style rendering.
pub fn render_cigar(ops: &[CigarOp]) -> String {
    ops.iter().map(|op| op.to_string()).collect()
}
