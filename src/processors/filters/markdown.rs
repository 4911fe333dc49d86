use comrak::ComrakOptions;
use tera::{try_get_value, Filter};

/// Renders a string as markdown.
/// `inline=true` drops the wrapping paragraph of single paragraph output.
pub struct Markdown;

impl Filter for Markdown {
    fn filter(
        &self,
        value: &tera::Value,
        args: &std::collections::HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let string_content = try_get_value!("markdown", "value", String, value);
        let inline = match args.get("inline") {
            Some(val) => try_get_value!("markdown", "inline", bool, val),
            None => false,
        };
        let html = comrak::markdown_to_html(&string_content, &ComrakOptions::default());
        let html = if inline {
            strip_paragraph(&html)
        } else {
            html
        };

        Ok(tera::Value::String(html))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

fn strip_paragraph(html: &str) -> String {
    let trimmed = html.trim_end();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|rest| rest.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_owned(),
        _ => html.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn renders_markdown() {
        let out = Markdown
            .filter(&tera::Value::from("*hi*"), &HashMap::new())
            .unwrap();
        assert_eq!(out, tera::Value::from("<p><em>hi</em></p>\n"));
    }

    #[test]
    fn inline_drops_the_paragraph() {
        let args = HashMap::from([("inline".to_owned(), tera::Value::Bool(true))]);
        let out = Markdown.filter(&tera::Value::from("*hi*"), &args).unwrap();
        assert_eq!(out, tera::Value::from("<em>hi</em>"));

        let out = Markdown
            .filter(&tera::Value::from("a\n\nb"), &args)
            .unwrap();
        assert_eq!(out, tera::Value::from("<p>a</p>\n<p>b</p>\n"));
    }
}
