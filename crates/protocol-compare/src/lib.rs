//! Protocol comparison & retrieval engine.
//!
//! Pure, synchronous computation over normalized procedure records:
//! multi-aspect similarity, concrete difference detection, missing-item
//! resolution, a bounded fit score, and a cheap heuristic ranker for
//! candidate retrieval. The only async, fallible piece is the optional
//! insight collaborator, which degrades to a deterministic fallback.
pub mod compare;
pub mod diff;
pub mod error;
pub mod insight;
pub mod missing;
pub mod model;
pub mod normalize;
pub mod rank;
pub mod similarity;

pub use compare::{compare, compare_corpus, compare_with_insights};
pub use error::AppError;
pub use model::{ComparisonResult, Procedure, RankedCandidate, Step};
pub use normalize::normalize;
pub use rank::find_similar;
