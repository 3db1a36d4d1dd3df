//! EventLens Rank: scores pre-filtered events against interest tags.
//!
//! The ranker never filters events itself; callers narrow the candidate
//! list (location, format) first. Ranking failures are errors, never an
//! empty list.

pub mod ranker;
pub mod types;

pub use ranker::RelevanceRanker;
pub use types::{QueryRecommendations, TagRecommendations};
