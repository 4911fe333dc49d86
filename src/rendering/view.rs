//! Serializable views of the site model as they are handed to templates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::{Link, MenuEntry, OutputFormat, Params, SiteConfig},
    data::{Cover, Page, Route, Section, SiteModel, Term},
};

#[derive(Clone, Debug, Serialize)]
pub struct SiteView {
    pub title: String,
    pub base_url: String,
    /// absolute url of the home page
    pub home: String,
    pub language_code: Option<String>,
    pub copyright: Option<String>,
    pub google_analytics: Option<String>,
    pub params: Params,
    pub menu: Vec<MenuEntry>,
    pub social_icons: Vec<Link>,
    pub taxonomies: Vec<LinkView>,
    pub rss_permalink: Option<String>,
}

impl SiteView {
    pub fn new(config: &SiteConfig, site: &SiteModel) -> Self {
        Self {
            title: config.title.clone(),
            base_url: config.base_url.clone(),
            home: config.absolute_url("/"),
            language_code: config.language_code.clone(),
            copyright: config.copyright.clone(),
            google_analytics: config.google_analytics.clone(),
            params: config.params.clone(),
            menu: config.menu.main_sorted(),
            social_icons: config.params.social_icons.clone(),
            taxonomies: site
                .taxonomies
                .iter()
                .map(|t| LinkView::new(config, &t.plural, &t.route))
                .collect(),
            rss_permalink: config
                .outputs
                .home_has(OutputFormat::Rss)
                .then(|| config.absolute_url("/index.xml")),
        }
    }
}

/// a titled link
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkView {
    pub name: String,
    pub permalink: String,
    pub rel_permalink: String,
}

impl LinkView {
    pub fn new(config: &SiteConfig, name: &str, route: &Route) -> Self {
        Self {
            name: name.to_owned(),
            permalink: config.absolute_url(&route.rel_permalink),
            rel_permalink: route.rel_permalink.clone(),
        }
    }
}

/// a page as shown in listings
#[derive(Clone, Debug, Serialize)]
pub struct PageSummary {
    pub title: String,
    pub permalink: String,
    pub rel_permalink: String,
    pub date: Option<String>,
    pub date_formatted: Option<String>,
    pub summary: String,
    pub reading_time: usize,
    pub word_count: usize,
    pub section: String,
    pub tags: Vec<LinkView>,
    pub cover: Option<Cover>,
    /// absolute url of the cover image
    pub cover_url: Option<String>,
    pub draft: bool,
}

impl PageSummary {
    pub fn new(config: &SiteConfig, page: &Page) -> Self {
        let doc = &page.doc;
        Self {
            title: doc.title.clone(),
            permalink: config.absolute_url(&doc.route.rel_permalink),
            rel_permalink: doc.route.rel_permalink.clone(),
            date: doc.date.map(|d| d.to_rfc3339()),
            date_formatted: doc.date.map(|d| d.format(config.params.date_format())),
            summary: page.summary.clone(),
            reading_time: page.content.reading_time,
            word_count: page.content.word_count,
            section: doc.section.clone(),
            tags: term_links(config, page, "tags"),
            cover: doc.front_matter.cover.clone(),
            cover_url: doc
                .front_matter
                .cover
                .as_ref()
                .and_then(|c| c.image.as_deref())
                .map(|image| asset_url(config, image)),
            draft: doc.is_draft(),
        }
    }
}

/// site relative paths become absolute, anything else is left alone
fn asset_url(config: &SiteConfig, src: &str) -> String {
    if src.starts_with('/') && !src.starts_with("//") {
        config.absolute_url(src)
    } else {
        src.to_owned()
    }
}

fn term_links(config: &SiteConfig, page: &Page, plural: &str) -> Vec<LinkView> {
    let plural_slug = crate::data::url::urlize(plural);
    page.doc
        .front_matter
        .terms(plural)
        .iter()
        .filter_map(|name| {
            let slug = crate::data::url::urlize(name);
            (!slug.is_empty())
                .then(|| LinkView::new(config, name.trim(), &Route::listing(&[&plural_slug, &slug])))
        })
        .collect()
}

/// a full page for `single.html`
#[derive(Clone, Debug, Serialize)]
pub struct PageView {
    #[serde(flatten)]
    pub summary: PageSummary,
    pub kind: &'static str,
    pub content: String,
    pub toc: String,
    pub show_toc: bool,
    pub toc_open: bool,
    pub toc_side: Option<String>,
    pub lastmod: Option<String>,
    pub description: Option<String>,
    pub terms: BTreeMap<String, Vec<LinkView>>,
    pub comments: bool,
    /// key for the comment widget, stable across builds
    pub comment_id: String,
    pub breadcrumbs: Vec<LinkView>,
    pub newer: Option<LinkView>,
    pub older: Option<LinkView>,
    pub params: BTreeMap<String, serde_json::Value>,
}

impl PageView {
    pub fn new(config: &SiteConfig, site: &SiteModel, page: &Page, index: Option<usize>) -> Self {
        let doc = &page.doc;
        let fm = &doc.front_matter;
        let params = &config.params;

        let terms = site
            .taxonomies
            .iter()
            .map(|t| (t.plural.clone(), term_links(config, page, &t.plural)))
            .filter(|(_, links)| !links.is_empty())
            .collect();

        let (newer, older) = index
            .and_then(|i| site.section_position(i))
            .map(|(section, position)| {
                let link = |i: usize| {
                    let p = &site.pages[i];
                    LinkView::new(config, &p.doc.title, &p.doc.route)
                };
                let newer = position
                    .checked_sub(1)
                    .and_then(|p| section.pages.get(p))
                    .map(|&i| link(i));
                let older = section.pages.get(position + 1).map(|&i| link(i));
                (newer, older)
            })
            .unwrap_or((None, None));

        Self {
            summary: PageSummary::new(config, page),
            kind: "page",
            content: page.content.html.clone(),
            toc: page.content.toc.clone(),
            show_toc: fm.show_toc.unwrap_or(params.show_toc) && !page.content.toc.is_empty(),
            toc_open: fm.toc_open.unwrap_or(params.toc_open),
            toc_side: fm.toc_side.clone(),
            lastmod: doc.lastmod.map(|d| d.to_rfc3339()),
            description: fm.description.clone(),
            terms,
            comments: fm.comments.unwrap_or(params.comments),
            comment_id: doc.route.rel_permalink.clone(),
            breadcrumbs: breadcrumbs(config, site, page),
            newer,
            older,
            params: fm.params.clone(),
        }
    }
}

fn breadcrumbs(config: &SiteConfig, site: &SiteModel, page: &Page) -> Vec<LinkView> {
    let mut crumbs = vec![LinkView::new(config, "Home", &Route::listing(&[]))];
    if let Some(section) = site.sections.iter().find(|s| s.name == page.doc.section) {
        crumbs.push(LinkView::new(config, &section_title(section), &section.route));
    }
    crumbs
}

pub fn section_title(section: &Section) -> String {
    match &section.index {
        Some(index) => index.doc.title.clone(),
        None => capitalize(&section.name),
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// header of a listing page
#[derive(Clone, Debug, Serialize)]
pub struct ListView {
    pub title: String,
    /// `home`, `section`, `term`, `taxonomy` or `archive`
    pub kind: &'static str,
    pub permalink: String,
    pub rel_permalink: String,
    pub content: String,
    pub summary: String,
    pub rss_permalink: Option<String>,
}

impl ListView {
    pub fn new(
        config: &SiteConfig,
        kind: &'static str,
        title: &str,
        route: &Route,
        index: Option<&Page>,
    ) -> Self {
        Self {
            title: title.to_owned(),
            kind,
            permalink: config.absolute_url(&route.rel_permalink),
            rel_permalink: route.rel_permalink.clone(),
            content: index.map(|p| p.content.html.clone()).unwrap_or_default(),
            summary: index.map(|p| p.summary.clone()).unwrap_or_default(),
            rss_permalink: None,
        }
    }

    pub fn with_rss(mut self, config: &SiteConfig, route: &Route) -> Self {
        self.rss_permalink = Some(config.absolute_url(&format!("{}index.xml", route.rel_permalink)));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub page_number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl Paginator {
    /// page `number` (1-based) of `total_items` split by `page_size`
    pub fn new(
        config: &SiteConfig,
        base: &Route,
        number: usize,
        total_items: usize,
        page_size: usize,
    ) -> Self {
        let total_pages = total_pages(total_items, page_size);
        let url = |n: usize| config.absolute_url(&Route::pager(base, n).rel_permalink);
        Self {
            page_number: number,
            total_pages,
            total_items,
            page_size,
            first: url(1),
            last: url(total_pages),
            prev: (number > 1).then(|| url(number - 1)),
            next: (number < total_pages).then(|| url(number + 1)),
        }
    }
}

/// number of pager pages, at least one even for an empty listing
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    ((total_items + page_size - 1) / page_size).max(1)
}

#[derive(Clone, Debug, Serialize)]
pub struct TermView {
    pub name: String,
    pub slug: String,
    pub permalink: String,
    pub count: usize,
}

impl TermView {
    pub fn new(config: &SiteConfig, term: &Term) -> Self {
        Self {
            name: term.name.clone(),
            slug: term.slug.clone(),
            permalink: config.absolute_url(&term.route.rel_permalink),
            count: term.pages.len(),
        }
    }
}

/// pages of one year in the archive
#[derive(Clone, Debug, Serialize)]
pub struct YearView {
    pub year: Option<i32>,
    pub pages: Vec<PageSummary>,
}

/// groups pages, already newest first, by year. Undated pages end up last.
pub fn archive_years(config: &SiteConfig, pages: &[&Page]) -> Vec<YearView> {
    let mut years: Vec<YearView> = Vec::new();
    for page in pages {
        let year = page.doc.date.map(|d| d.year());
        match years.last_mut() {
            Some(last) if last.year == year => last.pages.push(PageSummary::new(config, page)),
            _ => years.push(YearView {
                year,
                pages: vec![PageSummary::new(config, page)],
            }),
        }
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::path::Path;

    fn config() -> SiteConfig {
        parse_config(Path::new("hugo.toml"), "baseURL = \"https://e.org/\"").unwrap()
    }

    #[test]
    fn paginator_links() {
        let config = config();
        let base = Route::listing(&["posts"]);
        let pager = Paginator::new(&config, &base, 2, 25, 10);

        assert_eq!(pager.total_pages, 3);
        assert_eq!(pager.first, "https://e.org/posts/");
        assert_eq!(pager.prev.as_deref(), Some("https://e.org/posts/"));
        assert_eq!(pager.next.as_deref(), Some("https://e.org/posts/page/3/"));
        assert_eq!(pager.last, "https://e.org/posts/page/3/");
    }

    #[test]
    fn cover_urls_are_absolute() {
        let config = config();
        assert_eq!(
            asset_url(&config, "/posts/binder/cover.png"),
            "https://e.org/posts/binder/cover.png"
        );
        assert_eq!(
            asset_url(&config, "https://cdn.e.org/c.png"),
            "https://cdn.e.org/c.png"
        );
        assert_eq!(asset_url(&config, "//cdn.e.org/c.png"), "//cdn.e.org/c.png");
    }

    #[test]
    fn empty_listings_have_one_page() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
