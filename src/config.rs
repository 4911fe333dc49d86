use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use miette::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConfigError;

/// config file names looked up in the site directory, in order
pub const CONFIG_FILES: &[&str] = &[
    "hugo.toml",
    "config.toml",
    "hugo.yaml",
    "config.yaml",
    "config.yml",
];

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(rename = "baseURL", default)]
    pub base_url: String,
    #[serde(default)]
    pub title: String,
    pub theme: Option<String>,
    #[serde(default = "default_paginate")]
    pub paginate: usize,
    pub language_code: Option<String>,
    pub copyright: Option<String>,
    pub google_analytics: Option<String>,
    #[serde(default)]
    pub build_drafts: bool,
    #[serde(rename = "enableRobotsTXT", default)]
    pub enable_robots_txt: bool,
    #[serde(default = "default_summary_length")]
    pub summary_length: usize,
    pub rss_limit: Option<usize>,
    #[serde(rename = "uglyURLs", default)]
    pub ugly_urls: bool,

    /// directories, relative to the site directory
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    #[serde(default = "default_publish_dir")]
    pub publish_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,

    /// content files that are never loaded
    #[serde(default)]
    pub ignore_files: Vec<String>,

    #[serde(default)]
    pub outputs: Outputs,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub menu: Menus,
    #[serde(default)]
    pub markup: Markup,
    #[serde(default = "default_taxonomies")]
    pub taxonomies: BTreeMap<String, String>,
}

fn default_paginate() -> usize {
    10
}

fn default_summary_length() -> usize {
    70
}

fn default_content_dir() -> PathBuf {
    "content".into()
}

fn default_publish_dir() -> PathBuf {
    "public".into()
}

fn default_static_dir() -> PathBuf {
    "static".into()
}

fn default_themes_dir() -> PathBuf {
    "themes".into()
}

fn default_taxonomies() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("category".to_owned(), "categories".to_owned()),
        ("tag".to_owned(), "tags".to_owned()),
    ])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Html,
    Rss,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTML" => Ok(Self::Html),
            "RSS" => Ok(Self::Rss),
            "JSON" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format `{other}`, expected one of HTML, RSS, JSON"
            )),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Html => "HTML",
            Self::Rss => "RSS",
            Self::Json => "JSON",
        };
        f.write_str(name)
    }
}

/// output formats per page kind
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    #[serde(default = "default_list_outputs")]
    pub home: Vec<OutputFormat>,
    #[serde(default = "default_list_outputs")]
    pub section: Vec<OutputFormat>,
    #[serde(default = "default_list_outputs")]
    pub term: Vec<OutputFormat>,
}

fn default_list_outputs() -> Vec<OutputFormat> {
    vec![OutputFormat::Html, OutputFormat::Rss]
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            home: default_list_outputs(),
            section: default_list_outputs(),
            term: default_list_outputs(),
        }
    }
}

impl Outputs {
    pub fn home_has(&self, format: OutputFormat) -> bool {
        self.home.contains(&format)
    }
}

/// Theme parameters. The toggles the generator knows about are typed,
/// everything else is handed to the theme untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Params {
    #[serde(rename = "ShowReadingTime", alias = "showReadingTime", default)]
    pub show_reading_time: bool,
    #[serde(rename = "ShowWordCount", alias = "showWordCount", default)]
    pub show_word_count: bool,
    #[serde(rename = "ShowBreadCrumbs", alias = "showBreadCrumbs", default)]
    pub show_bread_crumbs: bool,
    #[serde(rename = "ShowCodeCopyButtons", alias = "showCodeCopyButtons", default)]
    pub show_code_copy_buttons: bool,
    #[serde(rename = "ShowPostNavLinks", alias = "showPostNavLinks", default)]
    pub show_post_nav_links: bool,
    #[serde(rename = "ShowShareButtons", alias = "showShareButtons", default)]
    pub show_share_buttons: bool,
    #[serde(rename = "ShowToc", alias = "showToc", default)]
    pub show_toc: bool,
    #[serde(rename = "TocOpen", alias = "tocOpen", default)]
    pub toc_open: bool,
    #[serde(rename = "ImageZoom", alias = "imageZoom", default)]
    pub image_zoom: bool,
    #[serde(default)]
    pub comments: bool,
    #[serde(rename = "disableScrollToTop", default)]
    pub disable_scroll_to_top: bool,

    pub description: Option<String>,
    pub author: Option<String>,
    /// strftime pattern for displayed dates
    #[serde(rename = "DateFormat", alias = "dateFormat")]
    pub date_format: Option<String>,
    #[serde(rename = "mainSections", alias = "mainsections")]
    pub main_sections: Option<Vec<String>>,
    #[serde(rename = "socialIcons", default)]
    pub social_icons: Vec<Link>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Params {
    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or("%B %-d, %Y")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Menus {
    #[serde(default)]
    pub main: Vec<MenuEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MenuEntry {
    pub identifier: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub weight: i64,
}

impl Menus {
    /// main menu ordered by weight, keeping declaration order for equal weights
    pub fn main_sorted(&self) -> Vec<MenuEntry> {
        let mut entries = self.main.clone();
        entries.sort_by_key(|e| e.weight);
        entries
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Markup {
    #[serde(default)]
    pub goldmark: Goldmark,
    #[serde(default)]
    pub highlight: Highlight,
    #[serde(default)]
    pub table_of_contents: TableOfContents,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Goldmark {
    #[serde(default)]
    pub renderer: Renderer,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Renderer {
    /// pass raw html in markdown through to the output
    #[serde(rename = "unsafe", default)]
    pub unsafe_html: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Highlight {
    #[serde(default = "default_highlight_style")]
    pub style: String,
    #[serde(default = "default_true")]
    pub no_classes: bool,
    #[serde(default = "default_true")]
    pub code_fences: bool,
}

fn default_highlight_style() -> String {
    "base16-ocean.dark".into()
}

fn default_true() -> bool {
    true
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            style: default_highlight_style(),
            no_classes: true,
            code_fences: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableOfContents {
    #[serde(default = "default_toc_start")]
    pub start_level: u8,
    #[serde(default = "default_toc_end")]
    pub end_level: u8,
    #[serde(default)]
    pub ordered: bool,
}

fn default_toc_start() -> u8 {
    2
}

fn default_toc_end() -> u8 {
    3
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self {
            start_level: default_toc_start(),
            end_level: default_toc_end(),
            ordered: false,
        }
    }
}

impl SiteConfig {
    /// base url without the trailing slash
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// absolute url for a site relative path
    pub fn absolute_url(&self, rel: &str) -> String {
        format!("{}/{}", self.base(), rel.trim_start_matches('/'))
    }

    /// checks the fields serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("baseURL"));
        }
        if self.paginate == 0 {
            return Err(ConfigError::Invalid {
                field: "paginate",
                reason: "must be greater than zero".into(),
            });
        }
        if self.outputs.home.is_empty() {
            return Err(ConfigError::Invalid {
                field: "outputs.home",
                reason: "at least one output format is required".into(),
            });
        }
        let toc = &self.markup.table_of_contents;
        if !(1..=6).contains(&toc.start_level)
            || !(1..=6).contains(&toc.end_level)
            || toc.start_level > toc.end_level
        {
            return Err(ConfigError::Invalid {
                field: "markup.tableOfContents",
                reason: format!(
                    "levels {}..={} are not a valid heading range",
                    toc.start_level, toc.end_level
                ),
            });
        }
        for glob in &self.ignore_files {
            globset::Glob::new(glob).map_err(|e| ConfigError::Invalid {
                field: "ignoreFiles",
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

/// finds the config file of a site directory
pub fn find_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::NotFound(dir.to_owned()))
}

/// parses configuration text, picking the format from the file extension
pub fn parse_config(path: &Path, contents: &str) -> Result<SiteConfig, ConfigError> {
    let is_yaml = path
        .extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false);
    let parsed: Result<SiteConfig, Box<dyn std::error::Error + Send + Sync>> = if is_yaml {
        serde_yaml_ng::from_str(contents).map_err(|e| e.into())
    } else {
        toml::from_str(contents).map_err(|e| e.into())
    };
    let config = parsed.map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })?;
    config.validate()?;

    Ok(config)
}

#[tracing::instrument(level = "trace")]
pub async fn read_config(path: &Path) -> Result<SiteConfig> {
    let cfg_string = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: Box::new(e),
        })?;
    let config = parse_config(path, &cfg_string)?;
    tracing::debug!(title = %config.title, base_url = %config.base_url, "config loaded");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_config(contents: &str) -> Result<SiteConfig, ConfigError> {
        parse_config(Path::new("hugo.toml"), contents)
    }

    #[test]
    fn parses_a_full_toml_config() {
        let config = toml_config(
            r#"
baseURL = "https://example.org/"
title = "Notes"
theme = "paper"
paginate = 5

[outputs]
home = ["HTML", "RSS", "JSON"]

[params]
ShowReadingTime = true
ShowBreadCrumbs = true
ShowCodeCopyButtons = true
comments = true
custom = "kept"

[[menu.main]]
name = "Archive"
url = "/archives/"
weight = 20

[[menu.main]]
name = "Tags"
url = "/tags/"
weight = 10

[markup.goldmark.renderer]
unsafe = true
"#,
        )
        .unwrap();

        assert_eq!(config.base(), "https://example.org");
        assert_eq!(config.paginate, 5);
        assert!(config.outputs.home_has(OutputFormat::Json));
        assert!(config.params.show_reading_time);
        assert!(config.params.comments);
        assert!(!config.params.image_zoom);
        assert_eq!(config.params.extra["custom"], serde_json::json!("kept"));
        assert!(config.markup.goldmark.renderer.unsafe_html);

        let menu = config.menu.main_sorted();
        assert_eq!(menu[0].name, "Tags");
        assert_eq!(menu[1].name, "Archive");
    }

    #[test]
    fn parses_yaml_config() {
        let config = parse_config(
            Path::new("config.yml"),
            "baseURL: https://example.org\noutputs:\n  home: [html, json]\n",
        )
        .unwrap();

        assert_eq!(
            config.outputs.home,
            vec![OutputFormat::Html, OutputFormat::Json]
        );
        assert_eq!(config.taxonomies["tag"], "tags");
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = toml_config("title = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("baseURL")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml_config("baseURL = \"https://e.org\"\nbogus = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_output_formats_are_rejected() {
        let err = toml_config("baseURL = \"https://e.org\"\n[outputs]\nhome = [\"ATOM\"]")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn zero_pagination_is_invalid() {
        let err = toml_config("baseURL = \"https://e.org\"\npaginate = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "paginate",
                ..
            }
        ));
    }

    #[test]
    fn absolute_urls_join_cleanly() {
        let config = toml_config("baseURL = \"https://e.org/blog/\"").unwrap();
        assert_eq!(
            config.absolute_url("/posts/a/"),
            "https://e.org/blog/posts/a/"
        );
    }
}
