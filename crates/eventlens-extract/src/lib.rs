//! EventLens Extract: deterministic, local text analysis.
//!
//! Everything here is a pure function of its input text: no network
//! calls, no shared state. The lexical extractor never fails; empty or
//! whitespace-only input simply yields no candidates.

pub mod lexical;
pub mod sentences;

pub use lexical::{extract_candidates, LexicalExtractor};
pub use sentences::extract_key_sentences;
