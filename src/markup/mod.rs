use std::sync::Arc;

use async_trait::async_trait;
use miette::Result;
use tera::{Context as TeraContext, Tera};

use crate::{
    data::{Document, Page},
    error::DocumentError,
    pipeline::ProcessingStep,
};

mod assets;
mod markdown;
mod shortcodes;
mod toc;

pub use assets::AssetResolver;
pub use markdown::{reading_time, truncate_words, MarkdownRenderer, RenderedContent};
pub use shortcodes::{expand_shortcodes, Expanded, ShortcodeArgs, ShortcodeCall};
pub use toc::{toc_html, TocEntry};

const MORE_MARKER: &str = "<!--more-->";
const FIGURE_ATTRIBUTES: &[&str] = &[
    "src", "width", "height", "align", "caption", "alt", "title", "link", "class", "target",
    "rel",
];

/// Expands shortcodes and renders the markdown body of a document
pub struct RenderContent {
    pub tera: Arc<Tera>,
    pub markdown: MarkdownRenderer,
    pub assets: AssetResolver,
    pub summary_length: usize,
}

#[async_trait]
impl ProcessingStep for RenderContent {
    type Input = Document;
    type Output = Page;

    #[tracing::instrument(name = "render content", level = "trace", skip_all)]
    async fn process(&self, mut doc: Self::Input) -> Result<Self::Output> {
        if let Some(url) = self.locate_cover(&doc)? {
            if let Some(cover) = doc.front_matter.cover.as_mut() {
                cover.image = Some(url);
            }
        }
        let expanded = expand_shortcodes(&doc.rel_path, &doc.body, |call| {
            self.render_shortcode(&doc, call)
        })?;
        let mut content = self.markdown.render(&expanded.markdown)?;
        content.html = expanded.restore(&content.html);
        let plain = expanded.strip(&content.plain);
        content.set_plain(&plain);
        let summary = self.summary(&doc, &expanded, &content)?;
        tracing::debug!(
            path = %doc.display_path(),
            words = content.word_count,
            "rendered"
        );

        Ok(Page {
            doc,
            content,
            summary,
        })
    }
}

impl RenderContent {
    /// Checks the cover image and returns its site relative url.
    /// Without `relative` the bundle is searched before the site roots.
    fn locate_cover(&self, doc: &Document) -> Result<Option<String>, DocumentError> {
        let Some(image) = doc
            .front_matter
            .cover
            .as_ref()
            .and_then(|c| c.image.as_deref())
        else {
            return Ok(None);
        };
        let is_relative = doc.front_matter.cover.as_ref().is_some_and(|c| c.relative);
        let url = if is_relative {
            self.assets.locate(doc, image)?
        } else {
            self.assets
                .locate(doc, image)
                .or_else(|_| self.assets.locate_site_path(doc, image))?
        };
        Ok(Some(url))
    }

    fn render_shortcode(&self, doc: &Document, call: &ShortcodeCall) -> Result<String, DocumentError> {
        if call.name == "figure" {
            self.check_figure(doc, call)?;
        }
        let template = format!("shortcodes/{}.html", call.name);
        if !self.tera.get_template_names().any(|n| n == template) {
            return Err(DocumentError::UnknownShortcode {
                path: doc.rel_path.clone(),
                name: call.name.clone(),
            });
        }

        let mut context = TeraContext::new();
        context.insert("args", &call.args.named);
        context.insert("positional", &call.args.positional);
        context.insert("inner", &call.inner);
        context.insert("page_title", &doc.title);
        context.insert("page_permalink", &doc.route.rel_permalink);

        self.tera
            .render(&template, &context)
            .map_err(|e| DocumentError::Shortcode {
                path: doc.rel_path.clone(),
                reason: describe_tera_error(&e),
            })
    }

    fn check_figure(&self, doc: &Document, call: &ShortcodeCall) -> Result<(), DocumentError> {
        let src = call.args.get("src").ok_or_else(|| DocumentError::Shortcode {
            path: doc.rel_path.clone(),
            reason: "figure needs a `src` attribute".into(),
        })?;
        for key in call.args.named.keys() {
            if !FIGURE_ATTRIBUTES.contains(&key.as_str()) {
                tracing::warn!(path = %doc.display_path(), "ignoring figure attribute `{key}`");
            }
        }

        self.assets.check(doc, src)
    }

    /// front matter summary, then description, then the text before
    /// `<!--more-->`, then the first words of the content
    fn summary(
        &self,
        doc: &Document,
        expanded: &Expanded,
        content: &RenderedContent,
    ) -> Result<String> {
        let fm = &doc.front_matter;
        if let Some(summary) = fm.summary.as_ref().or(fm.description.as_ref()) {
            return Ok(summary.trim().to_owned());
        }
        if let Some((before, _)) = expanded.markdown.split_once(MORE_MARKER) {
            let plain = self.markdown.render(before)?.plain;
            return Ok(expanded.strip(&plain).split_whitespace().collect::<Vec<_>>().join(" "));
        }

        Ok(truncate_words(&content.plain, self.summary_length))
    }
}

/// tera hides the interesting part of an error in its sources
pub fn describe_tera_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
