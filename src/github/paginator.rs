use serde_json::Value;

use crate::github::client::{FetchOutcome, GitHubClient};

pub const DEFAULT_PER_PAGE: u32 = 100;

/// Walks a paginated collection endpoint page by page, concatenating the
/// elements in page order. A short or empty page ends the collection; a
/// failed page ends it early with whatever was accumulated (sub-resources
/// are supplementary, so partial results are acceptable).
pub struct Paginator<'a> {
    client: &'a GitHubClient,
    per_page: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a GitHubClient) -> Self {
        Self {
            client,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub async fn fetch_all(&self, path: &str) -> Vec<Value> {
        let mut all_items = Vec::new();
        let mut page = 1u32;

        loop {
            let separator = if path.contains('?') { "&" } else { "?" };
            let url = format!("{}{}per_page={}&page={}", path, separator, self.per_page, page);
            tracing::debug!("Fetching: {}", url);

            let body = match self.client.fetch(&url).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::NotFound => break,
                FetchOutcome::Failed(e) => {
                    tracing::warn!(
                        "Page {} of {} failed: {}. Keeping {} items fetched so far.",
                        page,
                        path,
                        e,
                        all_items.len()
                    );
                    break;
                }
            };

            let items: Vec<Value> = match serde_json::from_str(&body) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Page {} of {} was not a JSON array: {}", page, path, e);
                    break;
                }
            };

            if items.is_empty() {
                break;
            }
            let count = items.len();
            all_items.extend(items);

            if count < self.per_page as usize {
                break;
            }
            page += 1;
        }

        all_items
    }
}
