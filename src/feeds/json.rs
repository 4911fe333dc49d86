use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::{config::SiteConfig, data::Page};

/// one searchable page, the shape client side search scripts expect
#[derive(Debug, Serialize)]
pub struct SearchEntry<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub permalink: String,
    pub summary: &'a str,
}

/// Renders `index.json`. Pages marked `searchHidden` are left out.
#[tracing::instrument(level = "trace", skip_all)]
pub fn build_search_index(config: &SiteConfig, pages: &[&Page]) -> Result<String> {
    let entries: Vec<SearchEntry> = pages
        .iter()
        .filter(|p| !p.doc.front_matter.search_hidden)
        .map(|p| SearchEntry {
            title: &p.doc.title,
            content: &p.content.plain,
            permalink: config.absolute_url(&p.doc.route.rel_permalink),
            summary: &p.summary,
        })
        .collect();

    serde_json::to_string(&entries).into_diagnostic()
}
