use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{is_valid_thread_id, Article};

/// One JSON record per thread, named `<thread_id>.json`.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir.join(format!("{thread_id}.json"))
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        self.path_for(thread_id).is_file()
    }

    /// Create the record directory if it does not exist yet.
    pub fn create_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::store(&self.dir, e))
    }

    /// Persist a summarized article, replacing any record with the same id.
    ///
    /// An article with a malformed id or no summary is an `InvalidRecord`;
    /// file system failures are `Store` errors.
    pub fn save(&self, article: &Article) -> Result<PathBuf> {
        if !is_valid_thread_id(&article.thread_id) {
            return Err(Error::invalid(&article.thread_id, "thread id must be digits"));
        }
        if article.summary_text().is_none() {
            return Err(Error::invalid(
                &article.thread_id,
                "refusing to save an article without a summary",
            ));
        }

        self.create_dir()?;

        let path = self.path_for(&article.thread_id);
        let json = serde_json::to_string_pretty(article).map_err(|e| Error::store(&path, e))?;

        // Write beside the record and rename so a killed run never leaves half a file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::store(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::store(&path, e))?;

        tracing::debug!(path = %path.display(), "saved article");
        Ok(path)
    }

    /// Read one record. Its `thread_id` must match the file name.
    pub fn load(&self, path: &Path) -> Result<Article> {
        let content = fs::read_to_string(path).map_err(|e| Error::corrupt(path, e))?;
        let article: Article =
            serde_json::from_str(&content).map_err(|e| Error::corrupt(path, e))?;

        if !is_valid_thread_id(&article.thread_id) {
            return Err(Error::corrupt(
                path,
                format!("invalid thread id {:?}", article.thread_id),
            ));
        }
        let stem = path.file_stem().and_then(|s| s.to_str());
        if stem != Some(article.thread_id.as_str()) {
            return Err(Error::corrupt(
                path,
                format!("thread id {:?} does not match the file name", article.thread_id),
            ));
        }

        Ok(article)
    }

    /// Every record in the directory, in file system order, one result each.
    ///
    /// A missing directory yields nothing; one that cannot be listed is an error.
    pub fn records(&self) -> Result<impl Iterator<Item = Result<Article>> + '_> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::store(&self.dir, e)),
        };

        Ok(entries.into_iter().flatten().filter_map(move |entry| {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => return Some(Err(Error::store(&self.dir, e))),
            };

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                return None;
            }

            Some(self.load(&path))
        }))
    }

    /// Every readable record; corrupt ones are logged and skipped.
    pub fn load_all(&self) -> Result<impl Iterator<Item = Article> + '_> {
        Ok(self.records()?.filter_map(|record| match record {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!("skipping record: {e}");
                None
            }
        }))
    }

    /// Every record, failing on the first one that cannot be read.
    pub fn load_all_strict(&self) -> Result<Vec<Article>> {
        self.records()?.collect()
    }
}
