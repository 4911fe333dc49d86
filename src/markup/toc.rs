#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Nests flat headings into lists. Skipped levels open a single nested list.
pub fn toc_html(entries: &[TocEntry], ordered: bool) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let (open_tag, close_tag) = if ordered {
        ("<ol>", "</li></ol>")
    } else {
        ("<ul>", "</li></ul>")
    };
    let mut html = String::from(r#"<nav id="TableOfContents">"#);
    let mut open: Vec<u8> = Vec::new();

    for entry in entries {
        while open.last().map(|&l| l > entry.level).unwrap_or(false) {
            html.push_str(close_tag);
            open.pop();
        }
        match open.last() {
            Some(&level) if level == entry.level => html.push_str("</li>"),
            _ => {
                html.push_str(open_tag);
                open.push(entry.level);
            }
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a>"##,
            entry.id,
            tera::escape_html(&entry.text)
        ));
    }
    for _ in open {
        html.push_str(close_tag);
    }
    html.push_str("</nav>");

    html
}
