use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Problems with the site configuration or the theme it points at
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("no site configuration found in `{0}`")]
    #[diagnostic(
        code(folio::config::not_found),
        help("create a hugo.toml, config.toml or config.yaml in the site directory")
    )]
    NotFound(PathBuf),

    #[error("failed to parse configuration `{path}`")]
    #[diagnostic(code(folio::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("required configuration field `{0}` is missing")]
    #[diagnostic(code(folio::config::missing_field))]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    #[diagnostic(code(folio::config::invalid))]
    Invalid { field: &'static str, reason: String },

    #[error("theme `{name}` not found at `{path}`")]
    #[diagnostic(code(folio::config::theme_not_found))]
    ThemeNotFound { name: String, path: PathBuf },
}

/// Problems with a single content document
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("`{0}` has no front matter")]
    #[diagnostic(
        code(folio::document::no_front_matter),
        help("start the file with a `+++` (TOML) or `---` (YAML) block")
    )]
    MissingFrontMatter(PathBuf),

    #[error("front matter of `{0}` is never closed")]
    #[diagnostic(code(folio::document::unterminated_front_matter))]
    UnterminatedFrontMatter(PathBuf),

    #[error("malformed front matter in `{path}`")]
    #[diagnostic(code(folio::document::front_matter))]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("`{path}` is missing the required field `{field}`")]
    #[diagnostic(code(folio::document::missing_field))]
    MissingField { path: PathBuf, field: &'static str },

    #[error("`{path}` has an invalid date `{value}`")]
    #[diagnostic(
        code(folio::document::invalid_date),
        help("use YYYY-MM-DD or an RFC 3339 timestamp")
    )]
    InvalidDate { path: PathBuf, value: String },

    #[error("`{path}` references missing asset `{asset}`")]
    #[diagnostic(code(folio::document::missing_asset))]
    MissingAsset { path: PathBuf, asset: String },

    #[error("`{path}` uses unknown shortcode `{name}`")]
    #[diagnostic(
        code(folio::document::unknown_shortcode),
        help("add a `shortcodes/{name}.html` template to the theme")
    )]
    UnknownShortcode { path: PathBuf, name: String },

    #[error("malformed shortcode in `{path}`: {reason}")]
    #[diagnostic(code(folio::document::shortcode))]
    Shortcode { path: PathBuf, reason: String },
}

/// Problems assembling the output set
#[derive(Debug, Error, Diagnostic)]
pub enum OutputError {
    #[error("`{first}` and `{second}` both render to `{path}`")]
    #[diagnostic(
        code(folio::output::conflict),
        help("give one of them a different `slug` or `url`")
    )]
    Conflict {
        path: PathBuf,
        first: String,
        second: String,
    },
}
