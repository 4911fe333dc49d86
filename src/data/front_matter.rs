use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontMatterFormat {
    Toml,
    Yaml,
}

impl FrontMatterFormat {
    fn delimiter(self) -> &'static str {
        match self {
            Self::Toml => "+++",
            Self::Yaml => "---",
        }
    }
}

/// Metadata header of a document.
///
/// Required fields are optional here so that a missing one can be reported
/// with the document path instead of a bare serde message.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub lastmod: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub draft: bool,
    pub slug: Option<String>,
    pub url: Option<String>,
    /// template used instead of `single.html`
    pub layout: Option<String>,
    pub weight: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(rename = "showToc", alias = "ShowToc")]
    pub show_toc: Option<bool>,
    #[serde(rename = "TocOpen", alias = "tocOpen")]
    pub toc_open: Option<bool>,
    #[serde(rename = "TocSide", alias = "tocSide")]
    pub toc_side: Option<String>,
    pub cover: Option<Cover>,
    pub comments: Option<bool>,
    #[serde(rename = "hiddenInHomeList", default)]
    pub hidden_in_home_list: bool,
    #[serde(rename = "searchHidden", default)]
    pub search_hidden: bool,

    /// everything else, handed to the theme as page params
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Cover {
    pub image: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl FrontMatter {
    /// terms of a taxonomy by its plural name
    pub fn terms(&self, plural: &str) -> Vec<String> {
        match plural {
            "tags" => self.tags.clone(),
            "categories" => self.categories.clone(),
            other => match self.params.get(other) {
                Some(Value::Array(values)) => values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect(),
                Some(Value::String(single)) => vec![single.clone()],
                _ => Vec::new(),
            },
        }
    }
}

/// Splits a document into its front matter text and the body.
pub fn split_front_matter<'a>(
    path: &Path,
    input: &'a str,
) -> Result<(FrontMatterFormat, &'a str, &'a str), DocumentError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let first_line = input.lines().next().unwrap_or_default().trim_end();
    let format = match first_line {
        "+++" => FrontMatterFormat::Toml,
        "---" => FrontMatterFormat::Yaml,
        _ => return Err(DocumentError::MissingFrontMatter(path.to_owned())),
    };
    let header_start = input
        .find('\n')
        .map(|i| i + 1)
        .ok_or_else(|| DocumentError::UnterminatedFrontMatter(path.to_owned()))?;

    let mut offset = header_start;
    for line in input[header_start..].split_inclusive('\n') {
        if line.trim_end() == format.delimiter() {
            let header = &input[header_start..offset];
            let body = &input[offset + line.len()..];
            return Ok((format, header, body));
        }
        offset += line.len();
    }

    Err(DocumentError::UnterminatedFrontMatter(path.to_owned()))
}

/// Parses front matter text into the typed header.
///
/// TOML datetimes become their string form, so both formats feed the same
/// deserializer.
pub fn parse_front_matter(
    path: &Path,
    format: FrontMatterFormat,
    header: &str,
) -> Result<FrontMatter, DocumentError> {
    let wrap = |source: Box<dyn std::error::Error + Send + Sync>| DocumentError::FrontMatter {
        path: path.to_owned(),
        source,
    };
    let value = match format {
        FrontMatterFormat::Toml => {
            let table: toml::Table = toml::from_str(header).map_err(|e| wrap(e.into()))?;
            toml_to_json(toml::Value::Table(table))
        }
        FrontMatterFormat::Yaml if header.trim().is_empty() => Value::Object(Default::default()),
        FrontMatterFormat::Yaml => {
            serde_yaml_ng::from_str::<Value>(header).map_err(|e| wrap(e.into()))?
        }
    };
    if !value.is_object() {
        return Err(wrap("front matter must be a key/value mapping".into()));
    }

    serde_json::from_value(value).map_err(|e| wrap(e.into()))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<(FrontMatter, String), DocumentError> {
        let path = Path::new("post.md");
        let (format, header, body) = split_front_matter(path, input)?;
        Ok((parse_front_matter(path, format, header)?, body.to_owned()))
    }

    #[test]
    fn yaml_front_matter() {
        let (fm, body) = parse(
            "---\ntitle: \"Binder\"\ndate: 2022-03-01\ntags: [android, ipc]\nshowToc: true\nTocOpen: false\ncover:\n  image: cover.png\nseries: deep-dives\n---\n# Body\n",
        )
        .unwrap();

        assert_eq!(fm.title.as_deref(), Some("Binder"));
        assert_eq!(fm.date.as_deref(), Some("2022-03-01"));
        assert_eq!(fm.tags, vec!["android", "ipc"]);
        assert_eq!(fm.show_toc, Some(true));
        assert_eq!(fm.toc_open, Some(false));
        assert_eq!(fm.cover.unwrap().image.as_deref(), Some("cover.png"));
        assert_eq!(fm.params["series"], Value::from("deep-dives"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn toml_front_matter_with_native_dates() {
        let (fm, body) = parse("+++\ntitle = \"Kotlin\"\ndate = 2023-01-01\n+++\nhello").unwrap();

        assert_eq!(fm.title.as_deref(), Some("Kotlin"));
        assert_eq!(fm.date.as_deref(), Some("2023-01-01"));
        assert_eq!(body, "hello");
    }

    #[test]
    fn custom_taxonomies_come_from_params() {
        let (fm, _) = parse("---\ntitle: x\nseries: [a, b]\n---\n").unwrap();
        assert_eq!(fm.terms("series"), vec!["a", "b"]);
        assert!(fm.terms("tags").is_empty());
    }

    #[test]
    fn missing_front_matter() {
        let err = parse("# just markdown").unwrap_err();
        assert!(matches!(err, DocumentError::MissingFrontMatter(_)));
    }

    #[test]
    fn unterminated_front_matter() {
        let err = parse("---\ntitle: x\n").unwrap_err();
        assert!(matches!(err, DocumentError::UnterminatedFrontMatter(_)));
    }

    #[test]
    fn malformed_front_matter() {
        let err = parse("+++\ntitle = \n+++\n").unwrap_err();
        assert!(matches!(err, DocumentError::FrontMatter { .. }));

        let err = parse("---\n- just\n- a list\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::FrontMatter { .. }));
    }

    #[test]
    fn windows_line_endings() {
        let (fm, body) = parse("---\r\ntitle: x\r\n---\r\nbody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("x"));
        assert_eq!(body, "body");
    }
}
