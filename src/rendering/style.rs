use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

use miette::{IntoDiagnostic, Result, WrapErr};
use rsass::output::Format;

use crate::data::{url::slash_path, walk_files};

const DEFAULT_SHEET_NAME: &str = "style";
const EMBED_THRESHOLD: usize = 512;

/// Theme stylesheets, compiled on first use.
///
/// Small sheets are inlined into the page, larger ones are published as
/// `<name>.css` next to the home page and linked.
pub struct Stylesheets {
    base_url: String,
    page_styles: HashMap<String, PathBuf>,
    processed_styles: HashMap<String, String>,
    published: BTreeMap<PathBuf, Vec<u8>>,
}

/// indexes the `.scss`/`.css` files below `base_dir` by their stem
#[tracing::instrument(level = "trace")]
pub async fn load_stylesheets(base_dir: Option<&Path>, base_url: &str) -> Result<Stylesheets> {
    let mut page_styles = HashMap::new();

    if let Some(base_dir) = base_dir {
        for entry_path in walk_files(base_dir).await? {
            let rel_path = entry_path.strip_prefix(base_dir).into_diagnostic()?;
            if let Some(file_name) = rel_path.file_stem() {
                let name = rel_path
                    .parent()
                    .map(|p| p.join(file_name))
                    .unwrap_or_else(|| PathBuf::from(file_name));
                page_styles.insert(slash_path(&name), entry_path.to_owned());
            }
        }
    }
    tracing::debug!("Styles {page_styles:?}");

    Ok(Stylesheets {
        base_url: base_url.trim_end_matches('/').to_owned(),
        page_styles,
        processed_styles: HashMap::new(),
        published: BTreeMap::new(),
    })
}

impl Stylesheets {
    /// markup for the default sheet followed by the sheet named like the template
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn get_style_embed(&mut self, name: &str) -> Result<String> {
        let mut styles: Vec<String> = Vec::with_capacity(2);

        if let Some(default_style) = self.get_processed_style(DEFAULT_SHEET_NAME)? {
            styles.push(default_style);
        }
        if name != DEFAULT_SHEET_NAME {
            if let Some(style) = self.get_processed_style(name)? {
                styles.push(style);
            }
        }

        Ok(styles.join(""))
    }

    /// compiled sheets too large to inline, by output path
    pub fn take_published(&mut self) -> BTreeMap<PathBuf, Vec<u8>> {
        std::mem::take(&mut self.published)
    }

    fn get_processed_style(&mut self, name: &str) -> Result<Option<String>> {
        if let Some(processed) = self.processed_styles.get(name) {
            return Ok(Some(processed.to_owned()));
        }
        let Some(source) = self.page_styles.get(name) else {
            return Ok(None);
        };

        let format = Format {
            style: rsass::output::Style::Compressed,
            ..Default::default()
        };
        let style_contents = rsass::compile_scss_path(source, format)
            .into_diagnostic()
            .wrap_err_with(|| format!("compiling stylesheet {source:?}"))?;
        let style_html = if style_contents.len() < EMBED_THRESHOLD {
            let utf_contents = String::from_utf8(style_contents).into_diagnostic()?;

            format!(r#"<style type="text/css">{utf_contents}</style>"#)
        } else {
            self.published
                .insert(PathBuf::from(format!("{name}.css")), style_contents);

            format!(
                r#"<link rel="stylesheet" href="{}/{name}.css">"#,
                self.base_url
            )
        };
        self.processed_styles
            .insert(name.to_owned(), style_html.to_owned());

        Ok(Some(style_html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inlines_small_sheets_and_publishes_large_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.scss"), "$c: red; body { color: $c; }").unwrap();
        let big: String = (0..80)
            .map(|i| format!(".class-{i} {{ margin: {i}px; }}\n"))
            .collect();
        std::fs::write(dir.path().join("single.scss"), big).unwrap();

        let mut styles = load_stylesheets(Some(dir.path()), "https://e.org/")
            .await
            .unwrap();
        let embed = styles.get_style_embed("single").unwrap();

        assert!(embed.starts_with(r#"<style type="text/css">body{color:red}"#));
        assert!(embed.ends_with(r#"<link rel="stylesheet" href="https://e.org/single.css">"#));
        let published = styles.take_published();
        assert_eq!(published.keys().collect::<Vec<_>>(), vec![Path::new("single.css")]);
        assert!(styles.get_style_embed("list").unwrap().contains("color:red"));
    }

    #[tokio::test]
    async fn no_style_dir_embeds_nothing() {
        let mut styles = load_stylesheets(None, "https://e.org").await.unwrap();
        assert_eq!(styles.get_style_embed("single").unwrap(), "");
    }
}
