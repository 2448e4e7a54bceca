use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Storage format of `timestamp_of_entry`. Fixed width so lookups can
/// compare strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const ACCEPTED_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningEntry {
    pub id: i64,
    pub user_id: i64,
    pub timestamp_of_entry: String,
    pub title: String,
    pub learnt: String,
    pub date: String,
    /// Hours.
    pub time_spent: f64,
    pub resources_to_remember: String,
    pub tags: String,
}

impl LearningEntry {
    /// Path segment addressing this entry in details/edit/delete routes.
    pub fn key(&self) -> String {
        self.timestamp_of_entry.replacen(' ', "T", 1)
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(' ').filter(|t| !t.is_empty()).collect()
    }

    pub fn hours(&self) -> String {
        format_hours(self.time_spent)
    }
}

pub fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a free-form timestamp as it may appear in a URL.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ACCEPTED_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Normalize a free-form timestamp to the stored representation.
pub fn canonical_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
}

pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{:.0}", hours)
    } else {
        hours.to_string()
    }
}
