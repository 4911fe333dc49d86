use std::path::{Path, PathBuf};

use async_trait::async_trait;
use miette::{Context, IntoDiagnostic, Result};
use tokio::fs;

use crate::{error::DocumentError, pipeline::ProcessingStep};

use super::{
    parse_front_matter, split_front_matter, url::slash_path, Document, DocumentKind,
    PublishDate, Route,
};

/// Loads a document from disk and validates its header
pub struct LoadDocument {
    pub content_dir: PathBuf,
    pub ugly_urls: bool,
}

#[async_trait]
impl ProcessingStep for LoadDocument {
    type Input = PathBuf;
    type Output = Document;

    #[tracing::instrument(name = "load document", level = "trace", skip_all)]
    async fn process(&self, path: Self::Input) -> Result<Self::Output> {
        load_document(&self.content_dir, path, self.ugly_urls).await
    }
}

/// Drops drafts unless they are published on purpose
pub struct SkipDrafts {
    pub build_drafts: bool,
}

#[async_trait]
impl ProcessingStep for SkipDrafts {
    type Input = Vec<Document>;
    type Output = Vec<Document>;

    async fn process(&self, documents: Self::Input) -> Result<Self::Output> {
        if self.build_drafts {
            return Ok(documents);
        }
        Ok(documents
            .into_iter()
            .filter(|doc| {
                if doc.is_draft() {
                    tracing::debug!(path = %doc.display_path(), "skipping draft");
                }
                !doc.is_draft()
            })
            .collect())
    }
}

/// reads one document below `content_dir`
pub async fn load_document(content_dir: &Path, path: PathBuf, ugly_urls: bool) -> Result<Document> {
    let rel_path = path.strip_prefix(content_dir).into_diagnostic()?.to_owned();
    let string_content = load_string_content(&path).await?;
    let document = parse_document(path, rel_path, &string_content, ugly_urls)?;
    tracing::debug!(path = %document.display_path(), "loaded");

    Ok(document)
}

/// parses the raw text of a document
pub fn parse_document(
    source: PathBuf,
    rel_path: PathBuf,
    input: &str,
    ugly_urls: bool,
) -> Result<Document, DocumentError> {
    let (format, header, body) = split_front_matter(&rel_path, input)?;
    let front_matter = parse_front_matter(&rel_path, format, header)?;

    let title = front_matter
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DocumentError::MissingField {
            path: rel_path.clone(),
            field: "title",
        })?
        .to_owned();
    let date = parse_date(&rel_path, front_matter.date.as_deref())?;
    let lastmod = parse_date(&rel_path, front_matter.lastmod.as_deref())?;

    let is_index = rel_path.file_stem().map(|s| s == "_index").unwrap_or(false);
    // nested `_index.md` files have no listing of their own and render as pages
    let kind = if is_index && rel_path.components().count() <= 2 {
        DocumentKind::List
    } else {
        DocumentKind::Page
    };
    let route = Route::page(
        &rel_path,
        front_matter.slug.as_deref(),
        front_matter.url.as_deref(),
        ugly_urls,
    );
    let section = section_of(&rel_path);

    Ok(Document {
        source,
        rel_path,
        kind,
        title,
        date,
        lastmod,
        section,
        route,
        front_matter,
        body: body.to_owned(),
    })
}

fn parse_date(path: &Path, value: Option<&str>) -> Result<Option<PublishDate>, DocumentError> {
    match value {
        None => Ok(None),
        Some(value) => PublishDate::parse(value)
            .map(Some)
            .ok_or_else(|| DocumentError::InvalidDate {
                path: path.to_owned(),
                value: value.to_owned(),
            }),
    }
}

/// first directory of the content relative path, empty at the root
fn section_of(rel_path: &Path) -> String {
    let slash = slash_path(rel_path);
    match slash.split_once('/') {
        Some((section, _)) => section.to_owned(),
        None => String::new(),
    }
}

#[tracing::instrument(level = "trace")]
async fn load_string_content(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .into_diagnostic()
        .with_context(|| format!("reading document {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(rel: &str, input: &str) -> Result<Document, DocumentError> {
        parse_document(PathBuf::from("/site/content").join(rel), rel.into(), input, false)
    }

    #[test]
    fn regular_page() {
        let doc = parse(
            "posts/binder.md",
            "---\ntitle: Binder\ndate: 2022-01-01\n---\nbody",
        )
        .unwrap();

        assert_eq!(doc.kind, DocumentKind::Page);
        assert_eq!(doc.section, "posts");
        assert_eq!(doc.route.rel_permalink, "/posts/binder/");
        assert_eq!(doc.date, PublishDate::parse("2022-01-01"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn section_index() {
        let doc = parse("posts/_index.md", "+++\ntitle = \"Posts\"\n+++\n").unwrap();
        assert_eq!(doc.kind, DocumentKind::List);
        assert_eq!(doc.route.rel_permalink, "/posts/");
    }

    #[test]
    fn nested_indexes_are_pages() {
        let doc = parse("posts/series/_index.md", "---\ntitle: Series\n---\n").unwrap();
        assert_eq!(doc.kind, DocumentKind::Page);
        assert_eq!(doc.route.rel_permalink, "/posts/series/");
    }

    #[test]
    fn root_pages_have_no_section() {
        let doc = parse("about.md", "---\ntitle: About\n---\n").unwrap();
        assert_eq!(doc.section, "");
        assert_eq!(doc.route.rel_permalink, "/about/");
    }

    #[test]
    fn missing_title_names_the_document() {
        let err = parse("posts/untitled.md", "---\ndate: 2022-01-01\n---\n").unwrap_err();
        match err {
            DocumentError::MissingField { path, field } => {
                assert_eq!(path, PathBuf::from("posts/untitled.md"));
                assert_eq!(field, "title");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn blank_titles_count_as_missing() {
        let err = parse("a.md", "---\ntitle: \"  \"\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::MissingField { .. }));
    }

    #[tokio::test]
    async fn drafts_are_skipped_unless_requested() {
        let docs = vec![
            parse("a.md", "---\ntitle: a\ndraft: true\n---\n").unwrap(),
            parse("b.md", "---\ntitle: b\n---\n").unwrap(),
        ];

        let published = SkipDrafts { build_drafts: false }
            .process(docs.clone())
            .await
            .unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "b");

        let all = SkipDrafts { build_drafts: true }.process(docs).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn invalid_dates_are_rejected() {
        let err = parse("a.md", "---\ntitle: a\ndate: someday\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidDate { value, .. } if value == "someday"));
    }
}
