use std::path::{Component, Path, PathBuf};

/// Turns arbitrary text into a url path segment.
///
/// Non-ascii is transliterated, whitespace becomes `-`, everything that is not
/// alphanumeric, `-`, `_` or `.` is dropped.
pub fn urlize(text: &str) -> String {
    let ascii = deunicode::deunicode(text.trim());
    let mut out = String::with_capacity(ascii.len());
    let mut last_dash = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '/') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_end_matches('-').to_owned()
}

/// relative path as `/`-joined string, independent of the platform
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Where a document is published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// site relative url, starting with `/`
    pub rel_permalink: String,
    /// file below the output dir
    pub output_path: PathBuf,
}

impl Route {
    /// route of a listing at `segments`, always a directory url
    pub fn listing(segments: &[&str]) -> Self {
        let segments: Vec<&str> = segments.iter().copied().filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Self {
                rel_permalink: "/".into(),
                output_path: PathBuf::from("index.html"),
            };
        }
        let joined = segments.join("/");
        Self {
            rel_permalink: format!("/{joined}/"),
            output_path: PathBuf::from(joined).join("index.html"),
        }
    }

    /// route of page `number` (1-based) of a paginated listing
    pub fn pager(base: &Route, number: usize) -> Self {
        if number <= 1 {
            return base.clone();
        }
        let base_dir = base.rel_permalink.trim_matches('/');
        let page = number.to_string();
        Self::listing(&[base_dir, "page", &page])
    }

    /// route of a file next to a listing, e.g. `index.xml`
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.output_path
            .parent()
            .map(|p| p.join(file_name))
            .unwrap_or_else(|| PathBuf::from(file_name))
    }

    /// Route of a regular page.
    ///
    /// `rel_path` is relative to the content dir. `dir/index.md` publishes at
    /// `dir`, `slug` replaces the last segment and `url` replaces everything.
    pub fn page(rel_path: &Path, slug: Option<&str>, url: Option<&str>, ugly: bool) -> Self {
        if let Some(url) = url {
            return Self::explicit(url);
        }

        let mut segments: Vec<String> = rel_path
            .parent()
            .map(|p| {
                p.components()
                    .filter_map(|c| match c {
                        Component::Normal(part) => Some(urlize(&part.to_string_lossy())),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let stem = rel_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_bundle = stem == "index" || stem == "_index";
        if !is_bundle {
            segments.push(urlize(&stem));
        }
        if let Some(slug) = slug.map(urlize).filter(|s| !s.is_empty()) {
            match segments.last_mut() {
                Some(last) => *last = slug,
                None => segments.push(slug),
            }
        }

        if ugly && !is_bundle && !segments.is_empty() {
            let joined = segments.join("/");
            return Self {
                rel_permalink: format!("/{joined}.html"),
                output_path: PathBuf::from(format!("{joined}.html")),
            };
        }
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        Self::listing(&refs)
    }

    /// `.` and `..` segments are dropped so the page stays inside the output dir
    fn explicit(url: &str) -> Self {
        let segments: Vec<&str> = url
            .trim()
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect();
        let joined = segments.join("/");
        if joined.ends_with(".html") {
            return Self {
                rel_permalink: format!("/{joined}"),
                output_path: PathBuf::from(joined),
            };
        }
        Self::listing(&segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlize_handles_unicode_and_spaces() {
        assert_eq!(urlize("Android Internals"), "android-internals");
        assert_eq!(urlize("Kotlin / Coroutines"), "kotlin-coroutines");
        assert_eq!(urlize("café"), "cafe");
        assert_eq!(urlize("v1.2 release!"), "v1.2-release");
    }

    #[test]
    fn pretty_page_routes() {
        let route = Route::page(Path::new("posts/Hello World.md"), None, None, false);
        assert_eq!(route.rel_permalink, "/posts/hello-world/");
        assert_eq!(route.output_path, PathBuf::from("posts/hello-world/index.html"));
    }

    #[test]
    fn bundles_publish_at_their_directory() {
        let route = Route::page(Path::new("posts/binder/index.md"), None, None, false);
        assert_eq!(route.rel_permalink, "/posts/binder/");
    }

    #[test]
    fn slug_and_url_overrides() {
        let slugged = Route::page(Path::new("posts/2022-01-binder.md"), Some("binder"), None, false);
        assert_eq!(slugged.rel_permalink, "/posts/binder/");

        let explicit = Route::page(Path::new("posts/x.md"), None, Some("/about/me/"), false);
        assert_eq!(explicit.output_path, PathBuf::from("about/me/index.html"));
        let escaping = Route::page(Path::new("x.md"), None, Some("../../etc/x.html"), false);
        assert_eq!(escaping.output_path, PathBuf::from("etc/x.html"));
        assert_eq!(escaping.rel_permalink, "/etc/x.html");
    }

    #[test]
    fn ugly_urls() {
        let route = Route::page(Path::new("posts/a.md"), None, None, true);
        assert_eq!(route.rel_permalink, "/posts/a.html");
        assert_eq!(route.output_path, PathBuf::from("posts/a.html"));
    }

    #[test]
    fn pagers() {
        let home = Route::listing(&[]);
        assert_eq!(Route::pager(&home, 1), home);
        assert_eq!(Route::pager(&home, 2).rel_permalink, "/page/2/");

        let tags = Route::listing(&["tags", "rust"]);
        assert_eq!(
            Route::pager(&tags, 3).output_path,
            PathBuf::from("tags/rust/page/3/index.html")
        );
        assert_eq!(tags.sibling("index.xml"), PathBuf::from("tags/rust/index.xml"));
        assert_eq!(home.sibling("index.xml"), PathBuf::from("index.xml"));
    }
}
