//! Language-model access for keyphrase enhancement and relevance ranking.
//!
//! Callers depend on the `LlmTransport` trait; `ProviderClient` is the
//! HTTP implementation and tests substitute scripted fakes.

pub mod config;
pub mod json;
pub mod providers;
pub mod transport;
pub mod types;

pub use config::{LlmConfig, LlmConfigStatus, LlmConfigUpdate};
pub use json::{extract_json_span, parse_json_reply};
pub use providers::{ProviderClient, UnconfiguredTransport};
pub use transport::{complete_with_timeout, LlmTransport};
pub use types::*;
