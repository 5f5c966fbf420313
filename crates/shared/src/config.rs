use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_FEED_URL: &str = "https://news.ycombinator.com/rss";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SITE_TITLE: &str = "Hacker Newsのコメント要約";
pub const DEFAULT_SITE_LINK: &str = "https://your-github-pages-url";

/// How often, and how patiently, a failed summary is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per article, including the first.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(15),
        }
    }
}

/// Channel metadata for the generated feed and index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: DEFAULT_SITE_TITLE.to_string(),
            link: DEFAULT_SITE_LINK.to_string(),
            description: DEFAULT_SITE_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    /// Where one JSON record per thread is kept.
    pub out_dir: PathBuf,
    /// Where the static site is written.
    pub dist_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub system_prompt_file: PathBuf,
    pub summarizer_command: String,
    pub model: String,
    pub retry: RetryPolicy,
    pub summary_timeout: Duration,
    pub site: SiteInfo,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            out_dir: PathBuf::from("out"),
            dist_dir: PathBuf::from("dist"),
            templates_dir: PathBuf::from("templates"),
            system_prompt_file: PathBuf::from("system-prompt.txt"),
            summarizer_command: "llm".to_string(),
            model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
            summary_timeout: Duration::from_secs(300),
            site: SiteInfo::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let path = |key: &str, default: PathBuf| -> PathBuf {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        let max_attempts: u32 = parse_var(&lookup, "HN_SUMMARY_ATTEMPTS")?
            .unwrap_or(defaults.retry.max_attempts);
        if max_attempts == 0 {
            return Err(Error::Config(
                "HN_SUMMARY_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        let backoff = parse_var::<u64, _>(&lookup, "HN_RETRY_BACKOFF_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry.backoff);
        let summary_timeout = parse_var::<u64, _>(&lookup, "HN_SUMMARY_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.summary_timeout);

        let site_title = text("HN_SITE_TITLE", defaults.site.title);
        let site = SiteInfo {
            description: text("HN_SITE_DESCRIPTION", site_title.clone()),
            link: text("HN_SITE_LINK", defaults.site.link),
            title: site_title,
        };

        Ok(Self {
            feed_url: text("HN_FEED_URL", defaults.feed_url),
            out_dir: path("HN_OUT_DIR", defaults.out_dir),
            dist_dir: path("HN_DIST_DIR", defaults.dist_dir),
            templates_dir: path("HN_TEMPLATES_DIR", defaults.templates_dir),
            system_prompt_file: path("HN_SYSTEM_PROMPT_FILE", defaults.system_prompt_file),
            summarizer_command: text("HN_SUMMARIZER_CMD", defaults.summarizer_command),
            model: text("HN_MODEL", defaults.model),
            retry: RetryPolicy {
                max_attempts,
                backoff,
            },
            summary_timeout,
            site,
        })
    }

    /// Load the first `.env` found in the working directory,
    /// `~/.config/hn-summary/` or the home directory.
    fn try_load_dotenv() {
        if dotenvy::dotenv().is_ok() {
            return;
        }

        let candidates = [
            dirs::config_dir().map(|dir| dir.join("hn-summary").join(".env")),
            dirs::home_dir().map(|dir| dir.join(".env")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() && dotenvy::from_path(&path).is_ok() {
                tracing::debug!(path = %path.display(), "loaded environment file");
                return;
            }
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key}={v:?} is not valid: {e}"))),
    }
}
