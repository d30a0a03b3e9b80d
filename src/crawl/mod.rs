pub mod processor;
pub mod runner;

pub use processor::{ItemProcessor, ProcessResult};
pub use runner::{RunCounters, Runner};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::github::{FetchOutcome, GitHubClient};

/// Ask the API for the newest issue/PR number in the repository.
pub async fn discover_latest(client: &GitHubClient, repo: &str) -> Result<u64> {
    let path = format!(
        "/repos/{}/issues?state=all&sort=created&direction=desc&per_page=1",
        repo
    );

    let body = match client.fetch(&path).await {
        FetchOutcome::Success(body) => body,
        FetchOutcome::NotFound => {
            return Err(Error::GitHubApi(format!("repository {} not found", repo)))
        }
        FetchOutcome::Failed(e) => return Err(e),
    };

    let items: Vec<Value> = serde_json::from_str(&body)?;
    items
        .first()
        .and_then(|item| item.get("number"))
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::ParseError("could not discover latest issue number".to_string()))
}
