use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use pulldown_cmark::{html, Options, Parser};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::SiteInfo;
use crate::error::{Error, Result};
use crate::models::{Article, DayGroup, IndexEntry};

pub const ARTICLE_TEMPLATE: &str = "article.html";
pub const INDEX_TEMPLATE: &str = "index.html";
pub const PREVIEW_CHARS: usize = 200;

/// Counts of what a render pass wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    pub pages: usize,
    pub days: usize,
}

/// Writes the static site: one page per article, the index and the RSS feed.
pub struct SiteRenderer {
    templates_dir: PathBuf,
    dist_dir: PathBuf,
    site: SiteInfo,
}

impl SiteRenderer {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        dist_dir: impl Into<PathBuf>,
        site: SiteInfo,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            dist_dir: dist_dir.into(),
            site,
        }
    }

    /// Render every summarized article; articles without a summary are dropped.
    pub fn render(&self, articles: impl IntoIterator<Item = Article>) -> Result<RenderReport> {
        let articles: Vec<Article> = articles
            .into_iter()
            .filter(|a| a.summary_text().is_some())
            .collect();

        let article_template = self.load_template(ARTICLE_TEMPLATE)?;
        let index_template = self.load_template(INDEX_TEMPLATE)?;

        let pages_dir = self.dist_dir.join("pages");
        fs::create_dir_all(&pages_dir)
            .map_err(|e| Error::render(format!("failed to create {}: {e}", pages_dir.display())))?;

        for article in &articles {
            let page = render_article_page(&article_template, article, &self.site);
            write_file(&pages_dir.join(format!("{}.html", article.thread_id)), &page)?;
        }
        tracing::info!(count = articles.len(), dir = %pages_dir.display(), "wrote article pages");

        let groups = group_by_day(&articles);
        let index = render_index(&index_template, &groups, &self.site)?;
        write_file(&self.dist_dir.join("index.html"), &index)?;
        tracing::info!(days = groups.len(), "wrote index");

        let rss = render_rss(&self.site, &articles)?;
        write_file(&self.dist_dir.join("rss.xml"), &rss)?;
        tracing::info!(items = articles.len(), "wrote feed");

        Ok(RenderReport {
            pages: articles.len(),
            days: groups.len(),
        })
    }

    fn load_template(&self, name: &str) -> Result<String> {
        let path = self.templates_dir.join(name);
        fs::read_to_string(&path)
            .map_err(|e| Error::render(format!("failed to read template {}: {e}", path.display())))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .map_err(|e| Error::render(format!("failed to write {}: {e}", path.display())))
}

fn render_err(e: impl std::fmt::Display) -> Error {
    Error::render(format!("failed to build feed: {e}"))
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// Replace `{{name}}` placeholders in one pass.
///
/// Substituted text is never scanned again, and unknown placeholders are
/// kept as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

pub fn format_date(article: &Article) -> String {
    article.created_date.format("%Y-%m-%d %H:%M").to_string()
}

fn day_label(day: NaiveDate) -> String {
    day.format("%A, %-d %B %Y").to_string()
}

/// First line of a summary, cut to [`PREVIEW_CHARS`] characters including a trailing `…`.
pub fn preview(summary: &str) -> String {
    let first = summary
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first.chars().count() > PREVIEW_CHARS {
        let mut cut: String = first.chars().take(PREVIEW_CHARS - 1).collect();
        cut.push('…');
        cut
    } else {
        first.to_string()
    }
}

/// Group summarized articles by the calendar day they were created, newest day first.
///
/// Within a day articles are ordered by rank. Ranks from different runs on
/// the same day are interleaved as-is; they are not comparable across runs.
pub fn group_by_day(articles: &[Article]) -> Vec<DayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<&Article>> = BTreeMap::new();
    for article in articles.iter().filter(|a| a.summary_text().is_some()) {
        days.entry(article.created_date.date_naive())
            .or_default()
            .push(article);
    }

    days.into_iter()
        .rev()
        .map(|(day, mut articles)| {
            articles.sort_by(|a, b| {
                a.rank
                    .cmp(&b.rank)
                    .then_with(|| a.thread_id.cmp(&b.thread_id))
            });
            DayGroup {
                date: day.format("%Y-%m-%d").to_string(),
                label: day_label(day),
                articles: articles
                    .into_iter()
                    .map(|a| IndexEntry {
                        id: a.thread_id.clone(),
                        title: a.title.clone(),
                        rank: a.rank,
                        preview: preview(a.summary.as_deref().unwrap_or("")),
                        story_link: a.story_link.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

pub fn render_article_page(template: &str, article: &Article, site: &SiteInfo) -> String {
    let id = escape_html(&article.thread_id);
    let title = escape_html(&article.title);
    let link = escape_html(&article.story_link);
    let summary = markdown_to_html(article.summary.as_deref().unwrap_or(""));
    let rank = article.rank.to_string();
    let date = format_date(article);
    let site_title = escape_html(&site.title);

    fill_template(
        template,
        &[
            ("id", id.as_str()),
            ("title", title.as_str()),
            ("date", date.as_str()),
            ("rank", rank.as_str()),
            ("link", link.as_str()),
            ("summary", summary.as_str()),
            ("site_title", site_title.as_str()),
        ],
    )
}

/// JSON for a `<script type="application/json">` block.
fn script_json(groups: &[DayGroup]) -> Result<String> {
    let json = serde_json::to_string(groups)
        .map_err(|e| Error::render(format!("failed to serialize index data: {e}")))?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

pub fn render_index(template: &str, groups: &[DayGroup], site: &SiteInfo) -> Result<String> {
    let data = script_json(groups)?;
    let count = groups.iter().map(|g| g.articles.len()).sum::<usize>().to_string();
    let generated_at = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let site_title = escape_html(&site.title);

    Ok(fill_template(
        template,
        &[
            ("articles_json", data.as_str()),
            ("article_count", count.as_str()),
            ("generated_at", generated_at.as_str()),
            ("site_title", site_title.as_str()),
        ],
    ))
}

/// RSS 2.0 document with one item per summarized article, newest first.
pub fn render_rss(site: &SiteInfo, articles: &[Article]) -> Result<String> {
    let mut items: Vec<&Article> = articles.iter().filter(|a| a.summary_text().is_some()).collect();
    items.sort_by(|a, b| {
        b.created_date
            .cmp(&a.created_date)
            .then_with(|| a.rank.cmp(&b.rank))
            .then_with(|| a.thread_id.cmp(&b.thread_id))
    });

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(render_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("rss").with_attributes([("version", "2.0")])))
        .map_err(render_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(render_err)?;

    text_element(&mut writer, BytesStart::new("title"), &site.title)?;
    text_element(&mut writer, BytesStart::new("link"), &site.link)?;
    text_element(&mut writer, BytesStart::new("description"), &site.description)?;

    for article in items {
        let description = markdown_to_html(article.summary.as_deref().unwrap_or(""));

        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(render_err)?;
        text_element(&mut writer, BytesStart::new("title"), &article.title)?;
        text_element(&mut writer, BytesStart::new("link"), &article.story_link)?;
        text_element(&mut writer, BytesStart::new("description"), &description)?;
        text_element(
            &mut writer,
            BytesStart::new("pubDate"),
            &article.created_date.to_rfc2822(),
        )?;
        text_element(
            &mut writer,
            BytesStart::new("guid").with_attributes([("isPermaLink", "false")]),
            &article.thread_id,
        )?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(render_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(render_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(render_err)?;

    String::from_utf8(writer.into_inner()).map_err(render_err)
}

fn text_element(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, text: &str) -> Result<()> {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start)).map_err(render_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(render_err)?;
    writer.write_event(Event::End(end)).map_err(render_err)?;
    Ok(())
}
