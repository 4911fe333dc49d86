use std::{path::PathBuf, sync::Arc};

use miette::Result;
use tera::{Context as TeraContext, Tera};
use tokio::sync::Mutex;

use crate::{
    config::{OutputFormat, SiteConfig},
    context::Context,
    data::{Page, Route, SiteModel},
    feeds::{build_rss, build_search_index},
    pipeline::{ProcessingStep, ProcessingStepParallel},
};

use self::style::{load_stylesheets, Stylesheets};

mod output;
mod render_page;
mod style;
mod theme;
mod view;

pub use output::SiteOutput;
pub use render_page::{RenderJob, RenderPage, RenderedFile};
pub use theme::{has_template, load_templates};
pub use view::*;

const ARCHIVE_SEGMENT: &str = "archives";

/// number of files of each kind produced by [`SiteRenderer::render_all`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub pages: usize,
    pub listings: usize,
    pub feeds: usize,
}

/// Renders the assembled site into an in-memory [`SiteOutput`]
pub struct SiteRenderer {
    ctx: Arc<Context>,
    tera: Arc<Tera>,
    styles: Arc<Mutex<Stylesheets>>,
}

impl SiteRenderer {
    pub async fn new(ctx: Arc<Context>, tera: Arc<Tera>) -> Result<Self> {
        let style_dir = ctx.dirs.theme_style_dir();
        let styles = load_stylesheets(style_dir.as_deref(), &ctx.config.base_url).await?;

        Ok(Self {
            ctx,
            tera,
            styles: Arc::new(Mutex::new(styles)),
        })
    }

    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn render_all(&self, site: &SiteModel) -> Result<(SiteOutput, RenderStats)> {
        let mut plan = RenderPlan::new(&self.ctx.config, site, &self.tera);
        plan.pages();
        plan.home()?;
        plan.sections()?;
        plan.taxonomies()?;
        plan.archive();
        plan.not_found();
        plan.robots();
        let RenderPlan {
            jobs, feeds, stats, ..
        } = plan;
        tracing::debug!("{} templates to render", jobs.len());

        let rendered = RenderPage {
            tera: self.tera.clone(),
            styles: self.styles.clone(),
        }
        .parallel()
        .process(jobs)
        .await?;

        let mut output = SiteOutput::new();
        for file in rendered {
            output.insert_rendered(file.output, file.origin, file.contents)?;
        }
        for file in feeds {
            output.insert_rendered(file.output, file.origin, file.contents)?;
        }
        let stylesheets = self.styles.lock().await.take_published();
        for (path, css) in stylesheets {
            output.insert_rendered(path, "theme stylesheet", css)?;
        }

        Ok((output, stats))
    }
}

/// A content page that replaces the generated archive: one published at
/// `/archives/` (or `/archives.html`) or one asking for the archive layout.
fn is_archive_page(page: &Page) -> bool {
    let permalink = page.doc.route.rel_permalink.trim_matches('/');
    let at_archive_url = permalink.trim_end_matches(".html") == ARCHIVE_SEGMENT;
    let archive_layout = page
        .doc
        .front_matter
        .layout
        .as_deref()
        .is_some_and(|layout| layout.trim_end_matches(".html") == ARCHIVE_SEGMENT);
    at_archive_url || archive_layout
}

/// collects the render jobs of one build in a fixed order
struct RenderPlan<'a> {
    config: &'a SiteConfig,
    site: &'a SiteModel,
    tera: &'a Tera,
    base: TeraContext,
    jobs: Vec<RenderJob>,
    feeds: Vec<RenderedFile>,
    stats: RenderStats,
    has_archive_page: bool,
}

impl<'a> RenderPlan<'a> {
    fn new(config: &'a SiteConfig, site: &'a SiteModel, tera: &'a Tera) -> Self {
        let mut base = TeraContext::new();
        base.insert("site", &SiteView::new(config, site));

        Self {
            config,
            site,
            tera,
            base,
            jobs: Vec::new(),
            feeds: Vec::new(),
            stats: RenderStats::default(),
            has_archive_page: false,
        }
    }

    fn pages(&mut self) {
        let (config, site) = (self.config, self.site);

        for (i, page) in site.pages.iter().enumerate() {
            let mut context = self.base.clone();
            context.insert("page", &PageView::new(config, site, page, Some(i)));
            let template = if is_archive_page(page) {
                self.has_archive_page = true;
                context.insert("years", &archive_years(config, &self.main_pages()));
                self.page_template(page, "archives.html")
            } else {
                self.page_template(page, "single.html")
            };

            self.push_html(
                template,
                context,
                page.doc.route.output_path.clone(),
                page.doc.display_path(),
            );
            self.stats.pages += 1;
        }
    }

    /// the `layout` of the page when the theme has it
    fn page_template(&self, page: &Page, default: &str) -> String {
        let Some(layout) = &page.doc.front_matter.layout else {
            return default.to_owned();
        };
        let name = format!("{}.html", layout.trim_end_matches(".html"));
        if has_template(self.tera, &name) {
            name
        } else {
            tracing::warn!(
                path = %page.doc.display_path(),
                "layout `{layout}` not found, using {default}"
            );
            default.to_owned()
        }
    }

    fn home(&mut self) -> Result<()> {
        let (config, site) = (self.config, self.site);
        let formats = &config.outputs.home;
        let route = Route::listing(&[]);
        let title = site
            .home
            .as_ref()
            .map(|p| p.doc.title.clone())
            .unwrap_or_else(|| config.title.clone());
        let main = self.main_pages();

        if formats.contains(&OutputFormat::Html) {
            let listed: Vec<&Page> = main
                .iter()
                .copied()
                .filter(|p| !p.doc.front_matter.hidden_in_home_list)
                .collect();
            let mut list = ListView::new(config, "home", &title, &route, site.home.as_ref());
            if formats.contains(&OutputFormat::Rss) {
                list = list.with_rss(config, &route);
            }
            self.paginated("index.html", &list, &route, &listed, "home page");
        }

        let all: Vec<&Page> = site.pages.iter().collect();
        self.feeds(formats, &title, &route, &main, &all, "home page")
    }

    fn sections(&mut self) -> Result<()> {
        let (config, site) = (self.config, self.site);
        let formats = &config.outputs.section;

        for section in &site.sections {
            let pages: Vec<&Page> = site.pages_at(&section.pages).collect();
            let title = section_title(section);
            let origin = format!("section `{}`", section.name);

            if formats.contains(&OutputFormat::Html) {
                let mut list = ListView::new(
                    config,
                    "section",
                    &title,
                    &section.route,
                    section.index.as_ref(),
                );
                if formats.contains(&OutputFormat::Rss) {
                    list = list.with_rss(config, &section.route);
                }
                self.paginated("list.html", &list, &section.route, &pages, &origin);
            }
            self.feeds(formats, &title, &section.route, &pages, &pages, &origin)?;
        }

        Ok(())
    }

    fn taxonomies(&mut self) -> Result<()> {
        let (config, site) = (self.config, self.site);
        let formats = &config.outputs.term;

        for taxonomy in &site.taxonomies {
            let mut context = self.base.clone();
            let title = capitalize(&taxonomy.plural);
            context.insert(
                "page",
                &ListView::new(config, "taxonomy", &title, &taxonomy.route, None),
            );
            let terms: Vec<TermView> = taxonomy
                .terms
                .iter()
                .map(|t| TermView::new(config, t))
                .collect();
            context.insert("terms", &terms);
            self.push_html(
                "terms.html".into(),
                context,
                taxonomy.route.output_path.clone(),
                format!("{} index", taxonomy.plural),
            );
            self.stats.listings += 1;

            for term in &taxonomy.terms {
                let pages: Vec<&Page> = site.pages_at(&term.pages).collect();
                let origin = format!("{} `{}`", taxonomy.singular, term.name);

                if formats.contains(&OutputFormat::Html) {
                    let mut list = ListView::new(config, "term", &term.name, &term.route, None);
                    if formats.contains(&OutputFormat::Rss) {
                        list = list.with_rss(config, &term.route);
                    }
                    self.paginated("list.html", &list, &term.route, &pages, &origin);
                }
                self.feeds(formats, &term.name, &term.route, &pages, &pages, &origin)?;
            }
        }

        Ok(())
    }

    /// the generated archive, unless the content provides its own
    fn archive(&mut self) {
        if self.has_archive_page {
            return;
        }
        let route = Route::listing(&[ARCHIVE_SEGMENT]);
        let mut context = self.base.clone();
        context.insert(
            "page",
            &ListView::new(self.config, "archive", "Archive", &route, None),
        );
        context.insert("years", &archive_years(self.config, &self.main_pages()));

        self.push_html(
            "archives.html".into(),
            context,
            route.output_path,
            "archive".into(),
        );
        self.stats.listings += 1;
    }

    fn not_found(&mut self) {
        let route = Route {
            rel_permalink: "/404.html".into(),
            output_path: PathBuf::from("404.html"),
        };
        let mut context = self.base.clone();
        context.insert(
            "page",
            &ListView::new(self.config, "404", "404 Page not found", &route, None),
        );

        self.push_html("404.html".into(), context, route.output_path, "404 page".into());
        self.stats.listings += 1;
    }

    fn robots(&mut self) {
        if !self.config.enable_robots_txt {
            return;
        }
        self.jobs.push(RenderJob {
            template: "robots.txt".into(),
            style: None,
            context: self.base.clone(),
            output: PathBuf::from("robots.txt"),
            origin: "robots.txt".into(),
        });
    }

    fn main_pages(&self) -> Vec<&'a Page> {
        let site = self.site;
        site.pages_at(&site.main_pages).collect()
    }

    /// one job per pager page, `pages/N/` after the first
    fn paginated(&mut self, template: &str, list: &ListView, route: &Route, pages: &[&Page], origin: &str) {
        let size = self.config.paginate;
        let total = total_pages(pages.len(), size);

        for number in 1..=total {
            let start = ((number - 1) * size).min(pages.len());
            let end = (start + size).min(pages.len());
            let summaries: Vec<PageSummary> = pages[start..end]
                .iter()
                .map(|p| PageSummary::new(self.config, p))
                .collect();

            let mut context = self.base.clone();
            context.insert("page", list);
            context.insert("pages", &summaries);
            context.insert(
                "paginator",
                &Paginator::new(self.config, route, number, pages.len(), size),
            );
            let origin = match number {
                1 => origin.to_owned(),
                n => format!("{origin} (page {n})"),
            };

            self.push_html(
                template.to_owned(),
                context,
                Route::pager(route, number).output_path,
                origin,
            );
            self.stats.listings += 1;
        }
    }

    fn feeds(
        &mut self,
        formats: &[OutputFormat],
        title: &str,
        route: &Route,
        rss_pages: &[&Page],
        json_pages: &[&Page],
        origin: &str,
    ) -> Result<()> {
        if formats.contains(&OutputFormat::Rss) {
            let xml = build_rss(self.config, title, &route.rel_permalink, rss_pages)?;
            self.feeds.push(RenderedFile {
                output: route.sibling("index.xml"),
                origin: format!("{origin} feed"),
                contents: xml.into_bytes(),
            });
            self.stats.feeds += 1;
        }
        if formats.contains(&OutputFormat::Json) {
            let json = build_search_index(self.config, json_pages)?;
            self.feeds.push(RenderedFile {
                output: route.sibling("index.json"),
                origin: format!("{origin} search index"),
                contents: json.into_bytes(),
            });
            self.stats.feeds += 1;
        }

        Ok(())
    }

    fn push_html(&mut self, template: String, context: TeraContext, output: PathBuf, origin: String) {
        let style = template.trim_end_matches(".html").to_owned();
        self.jobs.push(RenderJob {
            template,
            style: Some(style),
            context,
            output,
            origin,
        });
    }
}
