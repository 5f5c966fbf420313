use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shared::{pipeline, Config, FeedClient, LlmSummarizer, RunContext};

#[derive(Parser)]
#[command(name = "hn-summary")]
#[command(about = "Summarize Hacker News comment threads and publish them as a static site")]
struct Args {
    /// Number of top stories to fetch and summarize
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    shared::logging::init(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    tracing::info!("starting");
    let config = Config::from_env()?;

    let summarizer = LlmSummarizer::from_config(&config)?;
    let feed = FeedClient::new(config.feed_url.clone())?;
    let ctx = RunContext::new(config);

    let report = pipeline::run(&ctx, &feed, &summarizer, args.limit)
        .await
        .context("Run aborted")?;

    if !report.skipped.is_empty() {
        tracing::warn!(
            "{} article(s) skipped: {}",
            report.skipped.len(),
            report.skipped.join(", ")
        );
    }
    tracing::info!(
        fetched = report.fetched,
        summarized = report.summarized,
        cached = report.cached,
        pages = report.rendered.pages,
        days = report.rendered.days,
        "done, site written to {}",
        ctx.config.dist_dir.display()
    );

    Ok(())
}
