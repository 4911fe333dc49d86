use std::cell::RefCell;

use comrak::{
    arena_tree::Node,
    nodes::{Ast, NodeValue},
    plugins::syntect::SyntectAdapter,
    Anchorizer, ComrakOptions, ComrakPlugins,
};
use miette::{IntoDiagnostic, Result};
use typed_arena::Arena;

use crate::config::Markup;

use super::toc::{toc_html, TocEntry};

/// words per minute used for the reading time estimate
const WORDS_PER_MINUTE: usize = 213;

/// themes bundled with syntect
const HIGHLIGHT_STYLES: &[&str] = &[
    "base16-ocean.dark",
    "base16-eighties.dark",
    "base16-mocha.dark",
    "base16-ocean.light",
    "InspiredGitHub",
    "Solarized (dark)",
    "Solarized (light)",
];
const DEFAULT_HIGHLIGHT_STYLE: &str = "base16-ocean.dark";

/// Output of rendering one markdown body
#[derive(Clone, Debug, Default)]
pub struct RenderedContent {
    pub html: String,
    /// `<nav id="TableOfContents">` markup, empty without headings in range
    pub toc: String,
    /// text content without markup or code blocks
    pub plain: String,
    pub word_count: usize,
    /// minutes
    pub reading_time: usize,
}

/// markdown to html with the site's markup settings
pub struct MarkdownRenderer {
    options: ComrakOptions,
    highlight_style: Option<String>,
    toc_levels: (u8, u8),
    toc_ordered: bool,
}

impl MarkdownRenderer {
    pub fn new(markup: &Markup) -> Self {
        let mut options = ComrakOptions::default();
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;
        options.extension.header_ids = Some(String::new());
        options.render.unsafe_ = markup.goldmark.renderer.unsafe_html;
        options.render.github_pre_lang = false;

        let highlight = &markup.highlight;
        let highlight_style = (highlight.code_fences && highlight.no_classes).then(|| {
            if HIGHLIGHT_STYLES.contains(&highlight.style.as_str()) {
                highlight.style.clone()
            } else {
                tracing::warn!(
                    "unknown highlight style `{}`, using {DEFAULT_HIGHLIGHT_STYLE}",
                    highlight.style
                );
                DEFAULT_HIGHLIGHT_STYLE.to_owned()
            }
        });
        let toc = &markup.table_of_contents;

        Self {
            options,
            highlight_style,
            toc_levels: (toc.start_level, toc.end_level),
            toc_ordered: toc.ordered,
        }
    }

    /// Renders markdown, collecting headings and plain text on the way
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn render(&self, markdown: &str) -> Result<RenderedContent> {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, markdown, &self.options);

        let mut anchorizer = Anchorizer::new();
        let mut headings = Vec::new();
        let mut plain = String::new();

        for node in root.descendants() {
            match &node.data.borrow().value {
                NodeValue::Heading(heading) => {
                    let mut text = String::new();
                    collect_text(node, &mut text);
                    let id = anchorizer.anchorize(text.clone());
                    let (start, end) = self.toc_levels;
                    if (start..=end).contains(&heading.level) {
                        headings.push(TocEntry {
                            level: heading.level,
                            id,
                            text,
                        });
                    }
                }
                NodeValue::Text(text) => {
                    plain.push_str(text);
                    plain.push(' ');
                }
                NodeValue::Code(code) => {
                    plain.push_str(&code.literal);
                    plain.push(' ');
                }
                _ => {}
            }
        }

        let mut html = Vec::new();
        match &self.highlight_style {
            Some(style) => {
                let adapter = SyntectAdapter::new(style);
                let mut plugins = ComrakPlugins::default();
                plugins.render.codefence_syntax_highlighter = Some(&adapter);
                comrak::format_html_with_plugins(root, &self.options, &mut html, &plugins)
                    .into_diagnostic()?;
            }
            None => comrak::format_html(root, &self.options, &mut html).into_diagnostic()?,
        }
        let html = String::from_utf8(html).into_diagnostic()?;

        let mut content = RenderedContent {
            html,
            toc: toc_html(&headings, self.toc_ordered),
            ..Default::default()
        };
        content.set_plain(&plain);

        Ok(content)
    }
}

impl RenderedContent {
    /// replaces the plain text along with the counts derived from it
    pub fn set_plain(&mut self, plain: &str) {
        let words: Vec<&str> = plain.split_whitespace().collect();
        self.word_count = words.len();
        self.reading_time = reading_time(self.word_count);
        self.plain = words.join(" ");
    }
}

/// same text collection the header id generation uses
fn collect_text<'a>(node: &'a Node<'a, RefCell<Ast>>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::LineBreak | NodeValue::SoftBreak => out.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

pub fn reading_time(word_count: usize) -> usize {
    (word_count + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE
}

/// the first `limit` words of `plain`, with an ellipsis when cut
pub fn truncate_words(plain: &str, limit: usize) -> String {
    let words: Vec<&str> = plain.split_whitespace().collect();
    if words.len() <= limit {
        return words.join(" ");
    }
    format!("{} …", words[..limit].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Markup;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::new(&Markup::default())
    }

    #[test]
    fn renders_headings_with_ids_and_toc() {
        let out = renderer()
            .render("# Title\n\n## Binder IPC\n\ntext\n\n### `Parcel` layout\n\n## Binder IPC\n")
            .unwrap();

        assert!(out.html.contains(r##"id="binder-ipc""##));
        assert!(out.toc.starts_with(r#"<nav id="TableOfContents">"#));
        assert!(out.toc.contains(r##"<a href="#binder-ipc">Binder IPC</a>"##));
        assert!(out.toc.contains(r##"<a href="#parcel-layout">Parcel layout</a>"##));
        assert!(out.toc.contains(r##"<a href="#binder-ipc-1">"##));
        // h1 is outside the default 2..=3 range
        assert!(!out.toc.contains("#title"));
    }

    #[test]
    fn counts_words_outside_code_blocks() {
        let out = renderer()
            .render("one two *three*\n\n```kotlin\nval skipped = 1\n```\n\nuse `inline`\n")
            .unwrap();

        assert_eq!(out.plain, "one two three use inline");
        assert_eq!(out.word_count, 5);
        assert_eq!(out.reading_time, 1);
    }

    #[test]
    fn raw_html_depends_on_the_unsafe_flag() {
        let safe = renderer().render("<div class=\"x\">hi</div>\n").unwrap();
        assert!(!safe.html.contains("<div class=\"x\">"));

        let mut markup = Markup::default();
        markup.goldmark.renderer.unsafe_html = true;
        let raw = MarkdownRenderer::new(&markup)
            .render("<div class=\"x\">hi</div>\n")
            .unwrap();
        assert!(raw.html.contains("<div class=\"x\">hi</div>"));
    }

    #[test]
    fn fenced_code_keeps_its_language() {
        let mut markup = Markup::default();
        markup.highlight.no_classes = false;
        let out = MarkdownRenderer::new(&markup)
            .render("```rust\nfn main() {}\n```\n")
            .unwrap();
        assert!(out.html.contains(r#"class="language-rust""#));
    }

    #[test]
    fn truncates_summaries() {
        assert_eq!(truncate_words("a b c d", 2), "a b …");
        assert_eq!(truncate_words("a  b", 5), "a b");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(0), 0);
        assert_eq!(reading_time(1), 1);
        assert_eq!(reading_time(213), 1);
        assert_eq!(reading_time(214), 2);
    }
}
