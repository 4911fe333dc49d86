//! Shortcode directives embedded in markdown.
//!
//! `{{< name key="value" >}}` expands to html that bypasses the markdown
//! renderer, `{{% name %}}` expands to text that is rendered as markdown.
//! A closing `{{< /name >}}` turns the text in between into the inner content
//! and `{{</* name */>}}` writes the directive itself literally.

use std::{collections::BTreeMap, path::Path};

use serde::Serialize;

use crate::error::DocumentError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ShortcodeArgs {
    pub named: BTreeMap<String, String>,
    pub positional: Vec<String>,
}

impl ShortcodeArgs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcodeCall {
    pub name: String,
    pub args: ShortcodeArgs,
    pub inner: Option<String>,
    /// invoked with `{{% %}}`, output is markdown
    pub markdown: bool,
}

/// markdown with html shortcodes replaced by placeholder tokens
#[derive(Clone, Debug, Default)]
pub struct Expanded {
    pub markdown: String,
    placeholders: Vec<(String, String)>,
}

impl Expanded {
    /// swaps the placeholder tokens in rendered html for the shortcode output
    pub fn restore(&self, html: &str) -> String {
        let mut html = html.to_owned();
        for (token, output) in &self.placeholders {
            html = html.replace(&format!("<p>{token}</p>"), output);
            html = html.replace(token.as_str(), output);
        }
        html
    }

    /// plain text with the placeholder tokens removed
    pub fn strip(&self, plain: &str) -> String {
        let mut plain = plain.to_owned();
        for (token, _) in &self.placeholders {
            plain = plain.replace(token.as_str(), "");
        }
        plain
    }
}

#[derive(Clone, Copy)]
struct Delimiters {
    open: &'static str,
    close: &'static str,
    markdown: bool,
}

const HTML_DELIMITERS: Delimiters = Delimiters {
    open: "{{<",
    close: ">}}",
    markdown: false,
};
const MARKDOWN_DELIMITERS: Delimiters = Delimiters {
    open: "{{%",
    close: "%}}",
    markdown: true,
};

/// Expands every shortcode in `input` through `render`.
pub fn expand_shortcodes<F>(path: &Path, input: &str, mut render: F) -> Result<Expanded, DocumentError>
where
    F: FnMut(&ShortcodeCall) -> Result<String, DocumentError>,
{
    let malformed = |reason: String| DocumentError::Shortcode {
        path: path.to_owned(),
        reason,
    };
    let mut expanded = Expanded::default();
    let mut rest = input;

    while let Some((start, delims)) = next_opening(rest) {
        expanded.markdown.push_str(&rest[..start]);
        let after_open = &rest[start + delims.open.len()..];

        // {{</* ... */>}} is written out literally
        if let Some(commented) = after_open.trim_start().strip_prefix("/*") {
            let end_marker = format!("*/{}", delims.close);
            let end = commented
                .find(&end_marker)
                .ok_or_else(|| malformed("unterminated escaped shortcode".into()))?;
            expanded.markdown.push_str(delims.open);
            expanded.markdown.push_str(&commented[..end]);
            expanded.markdown.push_str(delims.close);
            rest = &commented[end + end_marker.len()..];
            continue;
        }

        let tag_end = after_open
            .find(delims.close)
            .ok_or_else(|| malformed(format!("`{}` is never closed", delims.open)))?;
        let tag = after_open[..tag_end].trim();
        let self_closing = tag.ends_with('/');
        let tag = tag.trim_end_matches('/').trim();
        let after_tag = &after_open[tag_end + delims.close.len()..];

        let (name, args) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
        if name.is_empty() {
            return Err(malformed("empty shortcode".into()));
        }
        if let Some(closing) = name.strip_prefix('/') {
            return Err(malformed(format!("closing `{closing}` without an opening tag")));
        }
        let args = parse_args(args).map_err(malformed)?;

        let (inner, remaining) = match find_closing(after_tag, delims, name) {
            Some((inner_end, closing_end)) if !self_closing => (
                Some(after_tag[..inner_end].to_owned()),
                &after_tag[closing_end..],
            ),
            _ => (None, after_tag),
        };
        let call = ShortcodeCall {
            name: name.to_owned(),
            args,
            inner,
            markdown: delims.markdown,
        };
        let output = render(&call)?;

        if delims.markdown {
            expanded.markdown.push_str(&output);
        } else {
            let token = format!("folioshortcode{}x", expanded.placeholders.len());
            expanded.markdown.push_str(&token);
            expanded.placeholders.push((token, output));
        }
        rest = remaining;
    }
    expanded.markdown.push_str(rest);

    Ok(expanded)
}

fn next_opening(input: &str) -> Option<(usize, Delimiters)> {
    let html = input.find(HTML_DELIMITERS.open).map(|i| (i, HTML_DELIMITERS));
    let markdown = input
        .find(MARKDOWN_DELIMITERS.open)
        .map(|i| (i, MARKDOWN_DELIMITERS));

    match (html, markdown) {
        (Some(h), Some(m)) => Some(if h.0 <= m.0 { h } else { m }),
        (h, m) => h.or(m),
    }
}

/// finds `{{< /name >}}`, returning where it starts and ends
fn find_closing(input: &str, delims: Delimiters, name: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    while let Some(found) = input[offset..].find(delims.open) {
        let start = offset + found;
        let after = &input[start + delims.open.len()..];
        if let Some(end) = after.find(delims.close) {
            if after[..end].trim() == format!("/{name}") {
                return Some((start, start + delims.open.len() + end + delims.close.len()));
            }
        }
        offset = start + delims.open.len();
    }
    None
}

/// parses `key="value" other=plain positional "quoted positional"`
fn parse_args(input: &str) -> Result<ShortcodeArgs, String> {
    let mut args = ShortcodeArgs::default();
    let mut chars = input.trim().chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' || first == '`' {
            chars.next();
            args.positional.push(read_quoted(&mut chars, first)?);
            continue;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            key.push(c);
        }
        if chars.next_if_eq(&'=').is_none() {
            args.positional.push(key);
            continue;
        }
        let value = match chars.peek() {
            Some(&q) if q == '"' || q == '`' => {
                chars.next();
                read_quoted(&mut chars, q)?
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
                value
            }
        };
        if key.is_empty() {
            return Err(format!("value `{value}` has no name"));
        }
        args.named.insert(key, value);
    }

    Ok(args)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
) -> Result<String, String> {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' if quote == '"' => match chars.next() {
                Some(escaped) => value.push(escaped),
                None => break,
            },
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(format!("unclosed quote in `{value}`"))
}
