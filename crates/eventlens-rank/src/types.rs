use eventlens_core::RecommendedEvent;
use serde::{Deserialize, Serialize};

/// Ranked events for one interest tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecommendations {
    pub tag: String,
    pub recommendations: Vec<RecommendedEvent>,
    /// Set when there was nothing to rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ranked events for a free-text request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecommendations {
    pub query: String,
    pub recommendations: Vec<RecommendedEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
