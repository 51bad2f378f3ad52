//! Per-profile search: score edges, grow neighbourhoods around the matched
//! ones, and run the path solver inside each neighbourhood.

mod matching;
mod neighbourhood;
mod pipeline;

pub use matching::{matched_edges, score_edges, MatchedEdges, Overhangs};
pub use neighbourhood::{extract_neighbourhoods, join_components, Neighbourhood};
pub use pipeline::{
    candidate_edges, initial_frontier, run, trace_hmm, Drawing, HmmReport, PathInfo,
};
