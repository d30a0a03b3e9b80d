use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// The GitHub issues endpoint serves both issues and pull requests; a
/// `pull_request` key on the payload marks the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    pub fn classify(payload: &Value) -> Self {
        if payload.get("pull_request").is_some() {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Issue => "issue",
            ItemKind::PullRequest => "pr",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inject the `_meta` block recording the classification. No-op on
/// non-object payloads.
pub fn annotate(payload: &mut Value, kind: ItemKind) {
    if let Some(map) = payload.as_object_mut() {
        map.insert("_meta".to_string(), json!({ "type": kind.as_str() }));
    }
}

pub fn created_at(payload: &Value) -> Option<DateTime<Utc>> {
    payload
        .get("created_at")?
        .as_str()?
        .parse::<DateTime<Utc>>()
        .ok()
}

pub fn comment_count(payload: &Value) -> u64 {
    payload.get("comments").and_then(Value::as_u64).unwrap_or(0)
}
