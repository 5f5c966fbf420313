//! The fetch, summarize, persist and render sequence behind `hn-summary`.

use tracing::Instrument;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::FeedClient;
use crate::io::ArticleStore;
use crate::site::{RenderReport, SiteRenderer};
use crate::summarizer::{generate_summary, Summarizer};

/// Everything one run needs, handed down from `main` instead of living in globals.
pub struct RunContext {
    pub config: Config,
    pub store: ArticleStore,
    pub renderer: SiteRenderer,
    span: tracing::Span,
}

impl RunContext {
    pub fn new(config: Config) -> Self {
        let store = ArticleStore::new(config.out_dir.clone());
        let renderer = SiteRenderer::new(
            config.templates_dir.clone(),
            config.dist_dir.clone(),
            config.site.clone(),
        );
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let span = tracing::info_span!("run", %started);

        Self {
            config,
            store,
            renderer,
            span,
        }
    }

    /// Render the site from every record in the store.
    pub fn render_site(&self) -> Result<RenderReport> {
        let _entered = self.span.enter();
        tracing::info!(dir = %self.store.dir().display(), "rendering site from store");
        self.renderer.render(self.store.load_all()?)
    }
}

/// What a run did, for the closing log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub summarized: usize,
    /// Articles already in the store, left untouched.
    pub cached: usize,
    /// Thread ids that never got a stored summary.
    pub skipped: Vec<String>,
    pub rendered: RenderReport,
}

/// Fetch up to `limit` stories, summarize and store each in turn, then
/// render the whole store once.
///
/// Threads that already have a record are not summarized again. A failure
/// for one article is logged and the article skipped. Fetch, store and
/// render failures abort the run.
pub async fn run(
    ctx: &RunContext,
    feed: &FeedClient,
    summarizer: &dyn Summarizer,
    limit: usize,
) -> Result<RunReport> {
    let mut report = summarize_batch(ctx, feed, summarizer, limit)
        .instrument(ctx.span.clone())
        .await?;
    report.rendered = ctx.render_site()?;
    Ok(report)
}

async fn summarize_batch(
    ctx: &RunContext,
    feed: &FeedClient,
    summarizer: &dyn Summarizer,
    limit: usize,
) -> Result<RunReport> {
    let articles = feed.fetch_top(limit).await?;
    let mut report = RunReport {
        fetched: articles.len(),
        ..RunReport::default()
    };

    ctx.store.create_dir()?;

    for article in &articles {
        if ctx.store.contains(&article.thread_id) {
            tracing::debug!(thread = %article.thread_id, "already summarized");
            report.cached += 1;
            continue;
        }

        tracing::info!(
            rank = article.rank,
            thread = %article.thread_id,
            "summarizing \"{}\"",
            article.title
        );

        let summarized = match generate_summary(article, summarizer, &ctx.config.retry).await {
            Ok(summarized) => summarized,
            Err(e) => {
                tracing::warn!(thread = %article.thread_id, "skipping article: {e}");
                report.skipped.push(article.thread_id.clone());
                continue;
            }
        };

        match ctx.store.save(&summarized) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved summary");
                report.summarized += 1;
            }
            Err(e @ Error::InvalidRecord { .. }) => {
                tracing::warn!(thread = %article.thread_id, "skipping article: {e}");
                report.skipped.push(article.thread_id.clone());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
