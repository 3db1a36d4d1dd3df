//! In-memory event registry and candidate filtering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use eventlens_core::EventKeyData;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// An ingested event with its listing attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    #[serde(flatten)]
    pub data: EventKeyData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Location and format constraints. `None` matches anything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub location: Option<String>,
    pub format: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &StoredEvent) -> bool {
        field_matches(self.location.as_deref(), event.location.as_deref())
            && field_matches(self.format.as_deref(), event.format.as_deref())
    }
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(w) => actual.is_some_and(|a| a.trim().eq_ignore_ascii_case(w)),
    }
}

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    events: HashMap<String, StoredEvent>,
}

/// Events in listing order. Re-ingesting an id replaces it in place.
#[derive(Default)]
pub struct EventRegistry {
    inner: RwLock<Inner>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, event: StoredEvent) {
        let mut inner = self.inner.write();
        let id = event.data.id.clone();
        if inner.events.insert(id.clone(), event).is_none() {
            inner.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<StoredEvent> {
        self.inner.read().events.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matching events in listing order.
    pub fn filtered(&self, filter: &EventFilter) -> Vec<StoredEvent> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.events.get(id))
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Ranker input for the matching events, in listing order.
    pub fn candidates(&self, filter: &EventFilter) -> Vec<EventKeyData> {
        self.filtered(filter).into_iter().map(|e| e.data).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, location: Option<&str>, format: Option<&str>) -> StoredEvent {
        StoredEvent {
            data: EventKeyData {
                id: id.into(),
                title: format!("Event {}", id),
                detail: String::new(),
                key_phrases: Vec::new(),
                key_sentences: Vec::new(),
            },
            location: location.map(String::from),
            format: format.map(String::from),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_listing_order_survives_replace() {
        let registry = EventRegistry::new();
        registry.upsert(stored("a", None, None));
        registry.upsert(stored("b", None, None));
        registry.upsert(stored("a", Some("Tokyo"), None));

        let ids: Vec<String> = registry
            .filtered(&EventFilter::default())
            .into_iter()
            .map(|e| e.data.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().location.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_filter_location_and_format() {
        let registry = EventRegistry::new();
        registry.upsert(stored("tokyo-online", Some("Tokyo"), Some("online")));
        registry.upsert(stored("osaka-offline", Some("Osaka"), Some("offline")));
        registry.upsert(stored("unknown", None, None));

        let filter = EventFilter {
            location: Some("tokyo".into()),
            format: None,
        };
        let ids: Vec<String> = registry.candidates(&filter).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["tokyo-online"]);

        let blank = EventFilter {
            location: Some("  ".into()),
            format: Some("OFFLINE".into()),
        };
        let ids: Vec<String> = registry.candidates(&blank).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["osaka-offline"]);
    }
}
