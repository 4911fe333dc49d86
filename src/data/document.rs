use std::path::PathBuf;

use super::{url::slash_path, FrontMatter, PublishDate, Route};
use crate::markup::RenderedContent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// a regular page
    Page,
    /// an `_index.md` describing the home page or a top level section
    List,
}

/// a document as read from the content dir
#[derive(Clone, Debug)]
pub struct Document {
    pub source: PathBuf,
    /// path relative to the content dir, the identity of the document
    pub rel_path: PathBuf,
    pub kind: DocumentKind,
    pub title: String,
    pub date: Option<PublishDate>,
    pub lastmod: Option<PublishDate>,
    pub section: String,
    pub route: Route,
    pub front_matter: FrontMatter,
    /// markdown after the front matter
    pub body: String,
}

impl Document {
    pub fn display_path(&self) -> String {
        slash_path(&self.rel_path)
    }

    pub fn is_draft(&self) -> bool {
        self.front_matter.draft
    }
}

/// a document with its body rendered to html
#[derive(Clone, Debug)]
pub struct Page {
    pub doc: Document,
    pub content: RenderedContent,
    /// plain text summary shown in listings and feeds
    pub summary: String,
}

impl Page {
    /// Newest first, undated last, ties broken by path.
    pub fn publish_order(a: &Page, b: &Page) -> std::cmp::Ordering {
        b.doc
            .date
            .cmp(&a.doc.date)
            .then_with(|| a.doc.rel_path.cmp(&b.doc.rel_path))
    }
}
