/// Bounded in-memory log of interpreter and board activity, readable over HTTP.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Interpret,
    Chart,
    Manage,
    System,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub level: ActivityLevel,
    pub category: ActivityCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActivityEntry {
    pub fn new(level: ActivityLevel, category: ActivityCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category,
            message: message.into(),
            details: None,
            duration_ms: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(elapsed.as_millis() as u64);
        self
    }
}

pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent `limit` entries (all when `None`), oldest first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<ActivityEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&self) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.clear();
        }
        self.record(ActivityEntry::new(
            ActivityLevel::Info,
            ActivityCategory::System,
            "activity log cleared",
        ));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> ActivityEntry {
        ActivityEntry::new(ActivityLevel::Info, ActivityCategory::Chart, format!("entry {}", n))
    }

    #[test]
    fn oldest_entries_are_evicted_at_capacity() {
        let log = ActivityLog::new(3);
        for n in 0..5 {
            log.record(entry(n));
        }
        let messages: Vec<String> = log.recent(None).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn recent_returns_tail() {
        let log = ActivityLog::new(10);
        for n in 0..4 {
            log.record(entry(n));
        }
        let tail = log.recent(Some(2));
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].message, "entry 3");
        assert_eq!(log.recent(Some(50)).len(), 4);
    }

    #[test]
    fn clear_leaves_a_marker() {
        let log = ActivityLog::new(10);
        log.record(entry(1));
        log.clear();
        let entries = log.recent(None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, ActivityCategory::System);
        assert_eq!(entries[0].message, "activity log cleared");
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(entry(1)).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["level"], "info");
        assert_eq!(json["category"], "chart");
    }
}
