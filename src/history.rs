//! Chat log
//!
//! Process-lifetime record of answered interactions, searchable from the
//! "search chats" view. Nothing is written to disk.

use crate::features::Feature;
use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Results shown per search
pub const MAX_SEARCH_RESULTS: usize = 50;
/// Oldest records are dropped past this size
pub const DEFAULT_CAPACITY: usize = 1000;
const PREVIEW_CHARS: usize = 140;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: Uuid,
    pub account_id: String,
    pub role: Role,
    pub feature: Feature,
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub answer: String,
}

impl ChatRecord {
    pub fn new(account_id: &str, role: Role, feature: Feature, user_text: &str, answer: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            role,
            feature,
            timestamp: Utc::now(),
            user_text: user_text.to_string(),
            answer: answer.to_string(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.user_text.to_lowercase().contains(needle)
            || self.answer.to_lowercase().contains(needle)
            || self.feature.label().to_lowercase().contains(needle)
            || self.feature.group().to_string().to_lowercase().contains(needle)
    }
}

pub struct ChatLog {
    records: RwLock<VecDeque<ChatRecord>>,
    capacity: usize,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, record: ChatRecord) {
        let mut records = self.records.write().await;
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Newest first, at most `MAX_SEARCH_RESULTS`. An empty query matches
    /// everything. `account_id` limits results to one account.
    pub async fn search(&self, account_id: Option<&str>, query: &str) -> Vec<ChatRecord> {
        let needle = query.trim().to_lowercase();
        let records = self.records.read().await;

        let mut hits: Vec<ChatRecord> = records
            .iter()
            .filter(|r| account_id.map_or(true, |id| r.account_id == id))
            .filter(|r| r.matches(&needle))
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal timestamps, so reverse
        // insertion order first.
        hits.reverse();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(MAX_SEARCH_RESULTS);
        hits
    }

    pub fn render(records: &[ChatRecord]) -> String {
        if records.is_empty() {
            return "No saved chats yet.".to_string();
        }

        records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let preview: String = r.user_text.chars().take(PREVIEW_CHARS).collect();
                format!(
                    "{}. id:{} [{}] {}/{} — {}\nQ: {}",
                    i + 1,
                    r.id,
                    r.role.as_str(),
                    r.feature.group(),
                    r.feature.label(),
                    r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    preview
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}
