use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::{Config, RetryPolicy};
use crate::error::{Error, Result};
use crate::models::Article;

/// Something that turns a fragment reference into summary text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the content behind `fragment` (e.g. `hn:43210001`).
    async fn summarize(&self, fragment: &str) -> Result<String>;
}

/// Runs the `llm` command line tool against a Hacker News fragment.
pub struct LlmSummarizer {
    command: String,
    model: String,
    system_prompt: String,
    timeout: Duration,
}

impl LlmSummarizer {
    pub fn new(
        command: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            timeout,
        }
    }

    /// Build a summarizer from config, reading the system prompt from disk.
    pub fn from_config(config: &Config) -> Result<Self> {
        let system_prompt = read_system_prompt(&config.system_prompt_file)?;
        Ok(Self::new(
            config.summarizer_command.clone(),
            config.model.clone(),
            system_prompt,
            config.summary_timeout,
        ))
    }
}

fn read_system_prompt(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            Error::Config(format!(
                "failed to read system prompt {}: {e}",
                path.display()
            ))
        })
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, fragment: &str) -> Result<String> {
        tracing::debug!(
            command = %self.command,
            model = %self.model,
            fragment,
            "running summarizer"
        );

        let mut command = Command::new(&self.command);
        command
            .arg("--fragment")
            .arg(fragment)
            .arg("--system")
            .arg(&self.system_prompt)
            .arg("--model")
            .arg(&self.model)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                Error::summary(fragment, format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|e| Error::summary(fragment, format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::summary(
                fragment,
                format!("{} exited with {}: {}", self.command, output.status, excerpt(&stderr)),
            ));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::summary(fragment, "output is not valid UTF-8"))?;
        let summary = stdout.trim();
        if summary.is_empty() {
            return Err(Error::summary(fragment, "empty output"));
        }

        Ok(summary.to_string())
    }
}

fn excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 300;
    let text = text.trim();
    if text.chars().count() > MAX_CHARS {
        let cut: String = text.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Summarize `article`'s thread, retrying per `policy`.
///
/// Returns a new article carrying the first successful summary; the input
/// is left as it was. The last error is returned once every attempt fails.
pub async fn generate_summary(
    article: &Article,
    summarizer: &dyn Summarizer,
    policy: &RetryPolicy,
) -> Result<Article> {
    let fragment = article.fragment();
    let attempts = policy.max_attempts.max(1);

    let mut attempt = 1;
    loop {
        let error = match summarizer.summarize(&fragment).await {
            Ok(summary) if !summary.trim().is_empty() => {
                return Ok(article.with_summary(summary.trim()));
            }
            Ok(_) => Error::summary(&fragment, "empty output"),
            Err(e) => e,
        };

        if attempt >= attempts {
            return Err(error);
        }

        tracing::warn!(attempt, attempts, "summary attempt failed: {error}");
        tracing::info!("retrying {fragment} in {:?}", policy.backoff);
        tokio::time::sleep(policy.backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted outcomes and records every fragment it was asked for.
    pub struct ScriptedSummarizer {
        outcomes: Mutex<VecDeque<Result<String>>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl ScriptedSummarizer {
        pub fn new(outcomes: Vec<Result<String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(&self, fragment: &str) -> Result<String> {
            self.calls.lock().unwrap().push(fragment.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::summary(fragment, "no scripted outcome")))
        }
    }
}
