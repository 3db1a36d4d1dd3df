//! EventLens Core: data model, configuration, error taxonomy.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DedupMode, EventLensConfig, PipelineConfig, RankerConfig};
pub use error::{Error, Result};
pub use types::*;
