use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One Hacker News discussion thread and, once generated, its comment summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The `id` query parameter of the thread's comments page.
    pub thread_id: String,
    /// 1-based position in the feed at fetch time.
    ///
    /// Only comparable within a single fetch; articles from different runs
    /// share rank values, so it is used as a secondary key within a day.
    pub rank: u32,
    pub title: String,
    pub story_link: String,
    pub created_date: DateTime<Local>,
    /// Markdown text, absent until the summarizer succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Article {
    pub fn new(
        thread_id: impl Into<String>,
        rank: u32,
        title: impl Into<String>,
        story_link: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            rank,
            title: title.into(),
            story_link: story_link.into(),
            created_date: Local::now(),
            summary: None,
        }
    }

    /// The summarizer's reference to this thread's comments.
    pub fn fragment(&self) -> String {
        format!("hn:{}", self.thread_id)
    }

    /// A copy of this article carrying `summary`.
    pub fn with_summary(&self, summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..self.clone()
        }
    }

    /// The summary, if it holds any non-blank text.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Thread ids are the site's numeric item ids.
pub fn is_valid_thread_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// One article as listed on the index page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub title: String,
    pub rank: u32,
    pub preview: String,
    pub story_link: String,
}

/// All articles created on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    /// `YYYY-MM-DD`, used as the key by the index page script.
    pub date: String,
    pub label: String,
    pub articles: Vec<IndexEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_summary_leaves_original_untouched() {
        let article = Article::new("42", 1, "Title", "https://example.com");
        let summarized = article.with_summary("- point");

        assert_eq!(article.summary, None);
        assert_eq!(summarized.summary.as_deref(), Some("- point"));
        assert_eq!(summarized.thread_id, article.thread_id);
        assert_eq!(summarized.created_date, article.created_date);
    }

    #[test]
    fn test_blank_summary_is_not_text() {
        let article = Article::new("42", 1, "Title", "https://example.com").with_summary("  \n");
        assert_eq!(article.summary_text(), None);
    }

    #[test]
    fn test_unsummarized_record_omits_summary_field() {
        let mut article = Article::new("42", 1, "Title", "https://example.com");
        article.created_date = Local.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("summary").is_none());
        assert_eq!(json["thread_id"], "42");

        let back: Article = serde_json::from_value(json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_thread_ids_are_digits_only() {
        assert!(is_valid_thread_id("43210001"));
        assert!(!is_valid_thread_id(""));
        assert!(!is_valid_thread_id("12a"));
        assert!(!is_valid_thread_id("../1"));
        assert!(!is_valid_thread_id("\"><img src=x>"));
    }

    #[test]
    fn test_fragment_reference() {
        let article = Article::new("43210", 5, "Title", "https://example.com");
        assert_eq!(article.fragment(), "hn:43210");
    }
}
