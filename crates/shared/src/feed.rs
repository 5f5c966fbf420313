use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{is_valid_thread_id, Article};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    comments: Option<String>,
}

/// Reads the front page feed of the discussion site.
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("hn-summary/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetch the feed once and return up to `limit` articles, ranked from 1.
    pub async fn fetch_top(&self, limit: usize) -> Result<Vec<Article>> {
        tracing::info!(url = %self.url, limit, "fetching feed");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(format!("{} returned {status}", self.url)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("failed to read response body: {e}")))?;

        let articles = parse_feed(&body, limit)?;
        tracing::info!(count = articles.len(), "fetched articles");
        Ok(articles)
    }
}

/// Parse an RSS document into at most `limit` unsummarized articles.
///
/// Ranks are feed positions, so an item skipped for a missing field leaves
/// a gap instead of shifting the items after it.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<Article>> {
    let rss: Rss =
        quick_xml::de::from_str(xml).map_err(|e| Error::fetch(format!("invalid feed: {e}")))?;

    let mut articles = Vec::new();
    for (index, item) in rss.channel.items.into_iter().take(limit).enumerate() {
        let position = index + 1;
        match article_from_item(item, position) {
            Ok(article) => articles.push(article),
            Err(e) => tracing::warn!("skipping feed item: {e}"),
        }
    }

    Ok(articles)
}

fn article_from_item(item: Item, position: usize) -> Result<Article> {
    let missing = |field: &'static str| Error::MissingField { position, field };

    let title = item.title.filter(|t| !t.trim().is_empty()).ok_or_else(|| missing("title"))?;
    let link = item.link.filter(|l| !l.trim().is_empty()).ok_or_else(|| missing("link"))?;
    let thread_id = item
        .comments
        .as_deref()
        .and_then(thread_id_from_url)
        .ok_or_else(|| missing("thread id"))?;

    let rank = u32::try_from(position).map_err(|_| missing("rank"))?;
    Ok(Article::new(thread_id, rank, title, link.trim()))
}

/// Extract the numeric `id` query parameter from a comments page URL.
pub fn thread_id_from_url(comments_url: &str) -> Option<String> {
    let url = Url::parse(comments_url.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| is_valid_thread_id(id))
}
