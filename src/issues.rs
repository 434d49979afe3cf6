//! Issue-source reader: turns a file or an inline argument into the
//! ordered list of issue keys a run operates on.
//!
//! Accepted shapes: a JSON array of strings, a JSON array of objects
//! carrying `key` or `id`, or plain text split on commas and whitespace.
//! The core never deduplicates; duplicates are processed independently.

use std::path::Path;

use crate::error::Result;

pub fn load_issue_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_issue_list(&content))
}

pub fn parse_issue_list(content: &str) -> Vec<String> {
    let trimmed = content.trim();

    if trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(array) = value.as_array() {
                return array.iter().filter_map(issue_from_json).collect();
            }
        }
        // Fall through: not valid JSON after all, treat as plain text
    }

    trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn issue_from_json(value: &serde_json::Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    let keyed = value.get("key").or_else(|| value.get("id"))?;
    if let Some(s) = keyed.as_str() {
        Some(s.to_string())
    } else {
        keyed.as_u64().map(|n| n.to_string())
    }
}
