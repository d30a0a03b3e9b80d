use clap::Parser;
use tracing_subscriber::EnvFilter;

use issuecrawler::config::{CrawlConfig, DEFAULT_END_ID};
use issuecrawler::{crawl, Config, GitHubClient, ItemProcessor, ItemStore, Runner};

#[derive(Parser, Debug)]
#[command(name = "issuecrawler")]
#[command(version = "0.1.0")]
#[command(about = "Fetch GitHub issues and PRs with comments and timelines, resumably")]
struct Args {
    /// First issue number to fetch
    #[arg(default_value_t = 1)]
    start: u64,

    /// Last issue number to fetch (inclusive)
    #[arg(default_value_t = DEFAULT_END_ID)]
    end: u64,

    /// Directory holding the fetched records
    #[arg(long, default_value = "items")]
    items_dir: String,

    /// Print the latest issue/PR number and exit
    #[arg(long)]
    discover: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("issuecrawler=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env();

    let client = GitHubClient::new(config.token.as_deref())?;

    if args.discover {
        let latest = crawl::discover_latest(&client, &config.repo).await?;
        tracing::info!("Latest: #{}", latest);
        println!("{}", latest);
        return Ok(());
    }

    let store = ItemStore::new(&args.items_dir)?;
    let crawl_config = CrawlConfig::new(&config.repo);

    tracing::info!("Fetching #{} to #{} from {}", args.start, args.end, config.repo);
    tracing::info!("Cutoff date: {}", crawl_config.cutoff.to_rfc3339());

    let processor = ItemProcessor::new(&client, &store, &crawl_config);
    Runner::new(processor).run(args.start, args.end).await;

    Ok(())
}
