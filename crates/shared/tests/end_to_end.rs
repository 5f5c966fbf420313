use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use shared::{pipeline, ArticleStore, Config, DayGroup, FeedClient, RunContext, Summarizer};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Hacker News</title>
    <link>https://news.ycombinator.com/</link>
    <description>Links for the intellectually curious, ranked by readers.</description>
    <item>
      <title>Rewriting the build system in a weekend</title>
      <link>https://example.com/build</link>
      <comments>https://news.ycombinator.com/item?id=43210001</comments>
    </item>
    <item>
      <title>Ask HN: What &amp; why?</title>
      <link>https://example.com/ask</link>
      <comments>https://news.ycombinator.com/item?id=43210002</comments>
    </item>
    <item>
      <title>Beyond the limit</title>
      <link>https://example.com/third</link>
      <comments>https://news.ycombinator.com/item?id=43210003</comments>
    </item>
  </channel>
</rss>"#;

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, fragment: &str) -> shared::Result<String> {
        Ok(format!("Commenters discussed {fragment}.\n\n- point one\n- point two"))
    }
}

fn repo_templates() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn config_in(root: &Path, feed_url: String) -> Config {
    Config {
        feed_url,
        out_dir: root.join("out"),
        dist_dir: root.join("dist"),
        templates_dir: repo_templates(),
        retry: shared::RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
        ..Config::default()
    }
}

fn embedded_index_data(index_html: &str) -> Vec<DayGroup> {
    let marker = r#"<script id="articles-data" type="application/json">"#;
    let start = index_html.find(marker).expect("index data block") + marker.len();
    let len = index_html[start..].find("</script>").expect("end of data block");
    serde_json::from_str(&index_html[start..start + len]).expect("index data is JSON")
}

#[tokio::test]
async fn test_limit_two_publishes_two_articles() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/rss"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), format!("{}/rss", server.uri()));
    let feed = FeedClient::new(config.feed_url.clone()).unwrap();
    let ctx = RunContext::new(config);

    let report = pipeline::run(&ctx, &feed, &EchoSummarizer, 2).await.unwrap();
    assert_eq!(report.summarized, 2);
    assert!(report.skipped.is_empty());

    // one record per thread
    let mut records: Vec<String> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    records.sort();
    assert_eq!(records, vec!["43210001.json", "43210002.json"]);

    // index: one day holding both entries in rank order
    let index = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
    let groups = embedded_index_data(&index);
    assert_eq!(groups.len(), 1);
    let ids: Vec<&str> = groups[0].articles.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["43210001", "43210002"]);
    assert_eq!(groups[0].articles[1].title, "Ask HN: What & why?");
    assert_eq!(groups[0].articles[0].preview, "Commenters discussed hn:43210001.");
    assert!(!index.contains("{{"));

    // feed: two items whose guids are the thread ids
    let rss = fs::read_to_string(dir.path().join("dist/rss.xml")).unwrap();
    assert_eq!(rss.matches("<item>").count(), 2);
    for id in ["43210001", "43210002"] {
        assert!(rss.contains(&format!("<guid isPermaLink=\"false\">{id}</guid>")));
    }

    // pages
    let page = fs::read_to_string(dir.path().join("dist/pages/43210002.html")).unwrap();
    assert!(page.contains("<h1>Ask HN: What &amp; why?</h1>"));
    assert!(page.contains("<li>point one</li>"));
    assert!(!dir.path().join("dist/pages/43210003.html").exists());
}

#[tokio::test]
async fn test_stored_records_round_trip_through_store() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), server.uri());
    let feed = FeedClient::new(config.feed_url.clone()).unwrap();
    let ctx = RunContext::new(config);

    pipeline::run(&ctx, &feed, &EchoSummarizer, 1).await.unwrap();

    let stored: Vec<_> = ArticleStore::new(dir.path().join("out")).load_all().unwrap().collect();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].thread_id, "43210001");
    assert_eq!(stored[0].rank, 1);
    assert_eq!(stored[0].story_link, "https://example.com/build");
    assert!(stored[0].summary.as_deref().unwrap().starts_with("Commenters discussed hn:43210001."));
}
