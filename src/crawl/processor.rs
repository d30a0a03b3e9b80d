use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::time::sleep;

use crate::config::CrawlConfig;
use crate::github::{FetchOutcome, GitHubClient, Paginator};
use crate::models::item::{annotate, comment_count, created_at, ItemKind};
use crate::models::timeline::extract_xrefs;
use crate::storage::ItemStore;

/// Which branch processing one ID took. The runner folds these into
/// counters; nothing else escapes per-ID processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    AlreadyDone,
    Fetched(ItemKind),
    SkippedByDate,
    NotFound,
    Failed,
}

enum Primary {
    Payload(Value, DateTime<Utc>),
    NotFound,
    Failed(String),
}

pub struct ItemProcessor<'a> {
    client: &'a GitHubClient,
    store: &'a ItemStore,
    config: &'a CrawlConfig,
}

impl<'a> ItemProcessor<'a> {
    pub fn new(client: &'a GitHubClient, store: &'a ItemStore, config: &'a CrawlConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub async fn process(&self, id: u64) -> ProcessResult {
        // Idempotence gate: anything already resolved on disk costs no
        // network calls.
        if self.store.marked_not_found(id) {
            return ProcessResult::NotFound;
        }
        if self.store.marked_skipped(id) {
            return ProcessResult::SkippedByDate;
        }
        if self.store.primary_exists(id) {
            return ProcessResult::AlreadyDone;
        }

        let (mut payload, created) = match self.fetch_primary(id).await {
            Primary::Payload(payload, created) => (payload, created),
            Primary::NotFound => {
                if let Err(e) = self.store.mark_not_found(id) {
                    tracing::warn!("#{:06} could not write 404 marker: {}", id, e);
                }
                tracing::info!("#{:06} 404", id);
                return ProcessResult::NotFound;
            }
            Primary::Failed(message) => {
                tracing::error!("#{:06} main=FAIL: {}", id, message);
                if let Err(e) = self.store.record_failure(id, "main", &message) {
                    tracing::warn!("#{:06} could not write failure record: {}", id, e);
                }
                return ProcessResult::Failed;
            }
        };

        if created >= self.config.cutoff {
            if let Err(e) = self.store.mark_skipped(id) {
                tracing::warn!("#{:06} could not write skip marker: {}", id, e);
            }
            tracing::info!("#{:06} skip (created {})", id, created.format("%Y-%m-%d"));
            return ProcessResult::SkippedByDate;
        }

        let kind = ItemKind::classify(&payload);
        annotate(&mut payload, kind);

        if let Err(e) = self.store.write_primary(id, &payload) {
            tracing::error!("#{:06} main=FAIL (write): {}", id, e);
            if let Err(e) = self.store.record_failure(id, "main", &e.to_string()) {
                tracing::warn!("#{:06} could not write failure record: {}", id, e);
            }
            return ProcessResult::Failed;
        }
        tracing::info!("#{:06} main=OK ({})", id, kind);

        // Sub-resources are supplementary: failures below only warn, the
        // primary record is already safely persisted.
        if comment_count(&payload) > 0 {
            self.fetch_comments(id).await;
        }
        if !self.store.timeline_exists(id) {
            self.fetch_timeline(id).await;
        }

        ProcessResult::Fetched(kind)
    }

    /// Fetch the primary resource, retrying payload-parse failures with a
    /// fixed delay. This is a separate policy from the transport retries
    /// inside the client: a 200 whose body is missing a usable
    /// `created_at` gets re-fetched, not backed off.
    async fn fetch_primary(&self, id: u64) -> Primary {
        let path = format!("/repos/{}/issues/{}", self.config.repo, id);
        let mut last_message = String::new();

        for attempt in 0..self.config.parse_attempts {
            let body = match self.client.fetch(&path).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::NotFound => return Primary::NotFound,
                FetchOutcome::Failed(e) => return Primary::Failed(e.to_string()),
            };

            match parse_primary(&body) {
                Ok((payload, created)) => return Primary::Payload(payload, created),
                Err(message) => {
                    tracing::warn!(
                        "#{:06} unparsable payload: {} (attempt {}/{})",
                        id,
                        message,
                        attempt + 1,
                        self.config.parse_attempts
                    );
                    last_message = message;
                    if attempt + 1 < self.config.parse_attempts {
                        sleep(self.config.parse_delay).await;
                    }
                }
            }
        }

        Primary::Failed(last_message)
    }

    async fn fetch_comments(&self, id: u64) {
        let path = format!("/repos/{}/issues/{}/comments", self.config.repo, id);
        let comments = Paginator::new(self.client).fetch_all(&path).await;
        if comments.is_empty() {
            return;
        }
        match self.store.write_comments(id, &comments) {
            Ok(()) => tracing::info!("#{:06} comments=OK ({})", id, comments.len()),
            Err(e) => tracing::warn!("#{:06} comments=FAIL (write): {}", id, e),
        }
    }

    async fn fetch_timeline(&self, id: u64) {
        let path = format!("/repos/{}/issues/{}/timeline", self.config.repo, id);
        let timeline = Paginator::new(self.client).fetch_all(&path).await;
        if timeline.is_empty() {
            return;
        }
        match self.store.write_timeline(id, &timeline) {
            Ok(()) => tracing::info!("#{:06} timeline=OK ({})", id, timeline.len()),
            Err(e) => tracing::warn!("#{:06} timeline=FAIL (write): {}", id, e),
        }

        let xrefs = extract_xrefs(&timeline);
        if !xrefs.is_empty() && !self.store.xrefs_exists(id) {
            match self.store.write_xrefs(id, &xrefs) {
                Ok(()) => tracing::info!("#{:06} xrefs=OK ({})", id, xrefs.len()),
                Err(e) => tracing::warn!("#{:06} xrefs=FAIL (write): {}", id, e),
            }
        }
    }
}

fn parse_primary(body: &str) -> std::result::Result<(Value, DateTime<Utc>), String> {
    let payload: Value =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;
    if !payload.is_object() {
        return Err("payload is not a JSON object".to_string());
    }
    let created =
        created_at(&payload).ok_or_else(|| "missing or invalid created_at".to_string())?;
    Ok((payload, created))
}
