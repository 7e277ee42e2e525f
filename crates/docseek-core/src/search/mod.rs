//! Search tree and matching engine.

pub mod engine;
pub mod matcher;
pub mod node;
pub mod tree;

pub use engine::{DUPLICATE_CAP, OFFSET_WINDOW, SearchEngine};
pub use matcher::{Candidate, ContentMatch, Matcher, PatternCache, match_values};
pub use node::{CandidateLines, NodeId, NodeLabel, SearchNode};
pub use tree::{SearchTree, Snapshot};
