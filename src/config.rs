use chrono::{DateTime, TimeZone, Utc};
use std::env;
use std::process::Command;
use std::time::Duration;

/// Items created at or after this instant are skipped permanently.
pub const CUTOFF_DATE: &str = "2016-01-01T00:00:00Z";

/// Proactive pacing kicks in below this many remaining API calls.
pub const RATE_LIMIT_BUFFER: u32 = 100;

/// Upper bound of the ID range when no end is given on the command line.
pub const DEFAULT_END_ID: u64 = 400_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub repo: String,
}

impl Config {
    pub fn from_env() -> Self {
        let token = resolve_token();
        if token.is_none() {
            tracing::warn!("No GitHub token found. Rate limits will be very low.");
        }

        let repo = env::var("GITHUB_REPO").unwrap_or_else(|_| "rust-lang/rust".to_string());

        Self { token, repo }
    }
}

/// GITHUB_TOKEN, then GH_TOKEN, then whatever `gh auth token` prints.
fn resolve_token() -> Option<String> {
    if let Ok(token) = env::var("GITHUB_TOKEN") {
        if !token.is_empty() {
            return Some(token);
        }
    }
    if let Ok(token) = env::var("GH_TOKEN") {
        if !token.is_empty() {
            return Some(token);
        }
    }

    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub repo: String,
    pub cutoff: DateTime<Utc>,
    pub parse_attempts: u32,
    pub parse_delay: Duration,
}

impl CrawlConfig {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            cutoff: cutoff_date(),
            parse_attempts: 3,
            parse_delay: Duration::from_secs(5),
        }
    }
}

pub fn cutoff_date() -> DateTime<Utc> {
    // Matches CUTOFF_DATE; constructed directly so parsing cannot fail at runtime.
    Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()
}
