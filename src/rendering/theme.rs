use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tera::Tera;

use crate::{context::Context, data::walk_files, data::url::slash_path, error::ConfigError};

/// templates used when the theme does not provide its own
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("baseof.html", include_str!("templates/baseof.html")),
    ("index.html", include_str!("templates/index.html")),
    ("list.html", include_str!("templates/list.html")),
    ("terms.html", include_str!("templates/terms.html")),
    ("single.html", include_str!("templates/single.html")),
    ("archives.html", include_str!("templates/archives.html")),
    ("404.html", include_str!("templates/404.html")),
    ("robots.txt", include_str!("templates/robots.txt")),
    ("partials/header.html", include_str!("templates/partials/header.html")),
    ("partials/footer.html", include_str!("templates/partials/footer.html")),
    ("partials/page_meta.html", include_str!("templates/partials/page_meta.html")),
    ("partials/page_list.html", include_str!("templates/partials/page_list.html")),
    ("shortcodes/figure.html", include_str!("templates/shortcodes/figure.html")),
];

/// Loads the built-in templates and lets the theme's `templates` dir
/// override any of them by name.
#[tracing::instrument(level = "trace", skip_all)]
pub async fn load_templates(ctx: &Context) -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())
        .into_diagnostic()?;

    if let Some(theme_dir) = &ctx.dirs.theme_dir {
        if !theme_dir.is_dir() {
            return Err(ConfigError::ThemeNotFound {
                name: ctx.config.theme.clone().unwrap_or_default(),
                path: theme_dir.to_owned(),
            }
            .into());
        }
    }
    if let Some(template_dir) = ctx.dirs.theme_template_dir() {
        let files = theme_templates(&template_dir).await?;
        tracing::debug!("{} theme templates", files.len());
        tera.add_template_files(files).into_diagnostic()?;
    }
    crate::processors::register_all(&mut tera);

    Ok(tera)
}

async fn theme_templates(dir: &Path) -> Result<Vec<(std::path::PathBuf, Option<String>)>> {
    let files = walk_files(dir).await?;
    files
        .into_iter()
        .map(|path| {
            let name = slash_path(path.strip_prefix(dir).into_diagnostic()?);
            Ok((path, Some(name)))
        })
        .collect()
}

pub fn has_template(tera: &Tera, name: &str) -> bool {
    tera.get_template_names().any(|n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::parse_config, context::Dirs};

    fn context(site: &Path, config: &str) -> Context {
        let config = parse_config(Path::new("hugo.toml"), config).unwrap();
        Context {
            dirs: Dirs::resolve(site, &config, None),
            config,
            build_drafts: false,
        }
    }

    #[tokio::test]
    async fn builtin_templates_without_theme() {
        let dir = tempfile::tempdir().unwrap();
        let tera = load_templates(&context(dir.path(), "baseURL = \"https://e.org\""))
            .await
            .unwrap();
        assert!(has_template(&tera, "single.html"));
        assert!(has_template(&tera, "shortcodes/figure.html"));
    }

    #[tokio::test]
    async fn figure_attributes_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let tera = load_templates(&context(dir.path(), "baseURL = \"https://e.org\""))
            .await
            .unwrap();

        let mut context = tera::Context::new();
        context.insert(
            "args",
            &serde_json::json!({ "src": "a\"onerror=\"x.png", "link": "b\".html" }),
        );
        let html = tera.render("shortcodes/figure.html", &context).unwrap();

        assert!(html.contains(r#"src="a&quot;onerror=&quot;x.png""#), "{html}");
        assert!(html.contains(r#"href="b&quot;.html""#), "{html}");
        assert!(!html.contains(r#"onerror=""#));
    }

    #[tokio::test]
    async fn theme_templates_override_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("themes/paper/templates/shortcodes");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("note.html"), "<aside>{{ inner }}</aside>").unwrap();
        std::fs::write(
            dir.path().join("themes/paper/templates/single.html"),
            "THEMED {{ page.title }} {{ page.content | markdown(inline=true) }}",
        )
        .unwrap();

        let tera = load_templates(&context(
            dir.path(),
            "baseURL = \"https://e.org\"\ntheme = \"paper\"",
        ))
        .await
        .unwrap();

        assert!(has_template(&tera, "shortcodes/note.html"));
        let mut context = tera::Context::new();
        context.insert("page", &serde_json::json!({ "title": "T", "content": "*x*" }));
        let html = tera.render("single.html", &context).unwrap();
        assert_eq!(html, "THEMED T <em>x</em>");
        assert!(has_template(&tera, "baseof.html"));
    }

    #[tokio::test]
    async fn missing_theme_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_templates(&context(
            dir.path(),
            "baseURL = \"https://e.org\"\ntheme = \"gone\"",
        ))
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ThemeNotFound { .. })
        ));
    }
}
