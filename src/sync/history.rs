use chrono::Utc;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TickRecord {
    pub timestamp: i64,
    pub outcome: String,
    pub detail: Option<String>,
}

/// Bounded record of recent ticks, oldest dropped first.
#[derive(Debug, Clone, Serialize)]
pub struct TickHistory {
    entries: VecDeque<TickRecord>,
    #[serde(skip)]
    max_entries: usize,
}

impl TickHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn add(&mut self, outcome: &str, detail: Option<String>) {
        let entry = TickRecord {
            timestamp: Utc::now().timestamp(),
            outcome: outcome.to_string(),
            detail,
        };

        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn recent(&self, limit: Option<usize>) -> Vec<TickRecord> {
        let skip = match limit {
            Some(n) => self.entries.len().saturating_sub(n),
            None => 0,
        };
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
