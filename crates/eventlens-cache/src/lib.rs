//! EventLens Cache: process-local memoization of extraction results.
//!
//! The pipeline talks to the `KeyphraseCache` trait so a shared or
//! distributed cache can replace `InMemoryKeyphraseCache` without touching
//! extraction code. Nothing here is persisted across restarts.

pub mod fingerprint;
pub mod memory;

pub use fingerprint::fingerprint;
pub use memory::InMemoryKeyphraseCache;

use std::time::Duration;

use eventlens_core::EnhancedPhrase;

/// Cache of reconciled keyphrase sets keyed by text fingerprint.
pub trait KeyphraseCache: Send + Sync {
    /// Returns `None` on miss. Expired entries count as a miss and are evicted.
    fn get(&self, key: &str) -> Option<Vec<EnhancedPhrase>>;

    /// Store a complete result. An existing entry for `key` is replaced.
    fn put(&self, key: String, value: Vec<EnhancedPhrase>, ttl: Duration);

    /// Number of entries currently held, including not-yet-purged expired ones.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
