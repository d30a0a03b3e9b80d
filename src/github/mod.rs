pub mod client;
pub mod paginator;
pub mod rate_limit;

pub use client::{FetchOutcome, GitHubClient, RetryPolicy};
pub use paginator::Paginator;
pub use rate_limit::RateBudget;
