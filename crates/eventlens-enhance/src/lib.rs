//! EventLens Enhance: turns raw event text into a final keyphrase set.
//!
//! Flow: lexical candidates → semantic enhancement (cache-checked, retried,
//! time-bounded) → reconciliation. Enhancement failure is never fatal; the
//! lexical candidates always back-fill the result.

pub mod enhancer;
pub mod pipeline;
pub mod reconcile;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use enhancer::{parse_enhancement, SemanticEnhancer};
pub use pipeline::{ExtractionOutcome, KeyphrasePipeline, PhraseSource};
pub use reconcile::Reconciler;
pub use retry::{RetriesExhausted, RetryPolicy};
