// Public modules
pub mod config;
pub mod error;
pub mod feed;
pub mod io;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod site;
pub mod summarizer;

// Re-export commonly used types
pub use config::{Config, RetryPolicy, SiteInfo};
pub use error::{Error, Result};
pub use feed::FeedClient;
pub use io::ArticleStore;
pub use models::{Article, DayGroup, IndexEntry};
pub use pipeline::{RunContext, RunReport};
pub use site::{RenderReport, SiteRenderer};
pub use summarizer::{generate_summary, LlmSummarizer, Summarizer};
