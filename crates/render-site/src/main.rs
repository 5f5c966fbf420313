use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use shared::{Config, RunContext};

#[derive(Parser)]
#[command(name = "render-site")]
#[command(about = "Rebuild the static site from stored summaries without fetching anything")]
struct Args {
    /// Fail on the first unreadable record instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    shared::logging::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_env()?;
    let ctx = RunContext::new(config);

    let report = if args.strict {
        let articles = ctx
            .store
            .load_all_strict()
            .context("Refusing to render with unreadable records")?;
        ctx.renderer.render(articles)?
    } else {
        ctx.render_site()?
    };

    tracing::info!(
        pages = report.pages,
        days = report.days,
        "site written to {}",
        ctx.config.dist_dir.display()
    );

    Ok(())
}
