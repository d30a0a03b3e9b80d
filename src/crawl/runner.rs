use indicatif::{ProgressBar, ProgressStyle};

use crate::crawl::processor::{ItemProcessor, ProcessResult};

/// Per-run tallies. Restart safety comes from the record store, never from
/// these; they exist for the progress and final summaries only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub fetched: u64,
    pub skipped_exists: u64,
    pub skipped_date: u64,
    pub skipped_not_found: u64,
    pub errors: u64,
}

impl RunCounters {
    pub fn record(&mut self, result: &ProcessResult) {
        match result {
            ProcessResult::Fetched(_) => self.fetched += 1,
            ProcessResult::AlreadyDone => self.skipped_exists += 1,
            ProcessResult::SkippedByDate => self.skipped_date += 1,
            ProcessResult::NotFound => self.skipped_not_found += 1,
            ProcessResult::Failed => self.errors += 1,
        }
    }
}

const PROGRESS_INTERVAL: u64 = 100;

/// Walks the inclusive ID range in increasing order, one ID at a time.
/// Skip decisions live in the processor; the runner only counts and
/// reports. Per-ID failures never abort the run.
pub struct Runner<'a> {
    processor: ItemProcessor<'a>,
}

impl<'a> Runner<'a> {
    pub fn new(processor: ItemProcessor<'a>) -> Self {
        Self { processor }
    }

    pub async fn run(&self, start: u64, end: u64) -> RunCounters {
        let mut counters = RunCounters::default();

        let pb = ProgressBar::new(end.saturating_sub(start) + 1);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items")
                .unwrap()
                .progress_chars("#>-"),
        );

        for id in start..=end {
            let result = self.processor.process(id).await;
            counters.record(&result);
            pb.inc(1);

            if id % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {}/{} | fetched={} exists={} date={} 404={} errors={}",
                    id,
                    end,
                    counters.fetched,
                    counters.skipped_exists,
                    counters.skipped_date,
                    counters.skipped_not_found,
                    counters.errors
                );
            }
        }

        pb.finish_with_message("Done");
        tracing::info!("Done!");
        tracing::info!("Fetched: {}", counters.fetched);
        tracing::info!("Skipped (exists): {}", counters.skipped_exists);
        tracing::info!("Skipped (date): {}", counters.skipped_date);
        tracing::info!("Skipped (404): {}", counters.skipped_not_found);
        tracing::info!("Errors: {}", counters.errors);

        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;

    #[test]
    fn test_counters_fold_each_outcome() {
        let mut counters = RunCounters::default();
        counters.record(&ProcessResult::Fetched(ItemKind::Issue));
        counters.record(&ProcessResult::Fetched(ItemKind::PullRequest));
        counters.record(&ProcessResult::AlreadyDone);
        counters.record(&ProcessResult::SkippedByDate);
        counters.record(&ProcessResult::NotFound);
        counters.record(&ProcessResult::Failed);

        assert_eq!(
            counters,
            RunCounters {
                fetched: 2,
                skipped_exists: 1,
                skipped_date: 1,
                skipped_not_found: 1,
                errors: 1,
            }
        );
    }
}
