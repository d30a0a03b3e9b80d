pub mod config;
pub mod crawl;
pub mod error;
pub mod github;
pub mod models;
pub mod storage;

pub use config::{Config, CrawlConfig};
pub use crawl::{ItemProcessor, ProcessResult, RunCounters, Runner};
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use storage::ItemStore;
