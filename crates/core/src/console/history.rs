//! Client-side query history.
//!
//! Newest entries first, capped at [`HISTORY_LIMIT`]. The JSON form matches
//! what the browser console keeps under [`HISTORY_KEY`], so a history file
//! can be moved between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 50;

/// Storage key for the persisted history.
pub const HISTORY_KEY: &str = "sql_query_history";

/// One executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryHistoryItem {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds.
    pub execution_time: f64,
    pub row_count: u64,
}

/// Most-recent-first query history.
///
/// Serialized as a bare array. Deserializing goes through
/// [`QueryHistory::from_items`], so an oversized stored list is capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<QueryHistoryItem>", into = "Vec<QueryHistoryItem>")]
pub struct QueryHistory {
    items: Vec<QueryHistoryItem>,
}

impl QueryHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a history from persisted items, keeping the newest
    /// [`HISTORY_LIMIT`] if the stored list is longer.
    #[must_use]
    pub fn from_items(mut items: Vec<QueryHistoryItem>) -> Self {
        items.truncate(HISTORY_LIMIT);
        Self { items }
    }

    /// Record an item as the newest entry, evicting the oldest beyond the cap.
    pub fn record(&mut self, item: QueryHistoryItem) {
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
    }

    /// Entries, newest first.
    #[must_use]
    pub fn items(&self) -> &[QueryHistoryItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&QueryHistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl From<Vec<QueryHistoryItem>> for QueryHistory {
    fn from(items: Vec<QueryHistoryItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<QueryHistory> for Vec<QueryHistoryItem> {
    fn from(history: QueryHistory) -> Self {
        history.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(n: usize) -> QueryHistoryItem {
        QueryHistoryItem {
            id: n.to_string(),
            query: format!("select {n}"),
            timestamp: Utc::now(),
            execution_time: 1.5,
            row_count: 1,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut history = QueryHistory::new();
        history.record(item(1));
        history.record(item(2));
        assert_eq!(history.items()[0].id, "2");
        assert_eq!(history.items()[1].id, "1");
    }

    #[test]
    fn test_fifty_first_evicts_oldest() {
        let mut history = QueryHistory::new();
        for n in 1..=HISTORY_LIMIT {
            history.record(item(n));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.find("1").is_some());

        history.record(item(51));
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert!(history.find("1").is_none());
        assert_eq!(history.items()[0].id, "51");
        assert_eq!(history.items()[HISTORY_LIMIT - 1].id, "2");
    }

    #[test]
    fn test_from_items_caps_length() {
        let items = (0..80).map(item).collect();
        let history = QueryHistory::from_items(items);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.items()[0].id, "0");
    }

    #[test]
    fn test_oversized_stored_history_is_capped() {
        let stored: Vec<QueryHistoryItem> = (0..80).map(item).collect();
        let json = serde_json::to_value(&stored).unwrap();

        let history: QueryHistory = serde_json::from_value(json).unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.items()[0].id, "0");
        assert_eq!(history.items()[HISTORY_LIMIT - 1].id, "49");
    }

    #[test]
    fn test_json_shape_is_array_of_camel_case() {
        let mut history = QueryHistory::new();
        history.record(item(7));
        let json = serde_json::to_value(&history).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["id"], "7");
        assert_eq!(first["rowCount"], 1);
        assert!(first.get("executionTime").is_some());

        let back: QueryHistory = serde_json::from_value(json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_clear() {
        let mut history = QueryHistory::new();
        history.record(item(1));
        history.clear();
        assert!(history.is_empty());
    }
}
