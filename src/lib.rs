use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use miette::{IntoDiagnostic, Result};

use crate::{
    config::{find_config, read_config},
    context::{Context, Dirs},
    data::{discover, walk_files, LoadDocument, SiteModel, SkipDrafts},
    error::ConfigError,
    markup::{AssetResolver, MarkdownRenderer, RenderContent},
    pipeline::{ProcessingStep, ProcessingStepChain, ProcessingStepParallel},
    rendering::{load_templates, SiteOutput, SiteRenderer},
};

mod common;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod feeds;
pub mod markup;
pub mod pipeline;
mod processors;
pub mod rendering;

#[derive(Clone, Debug)]
pub struct Paths {
    /// the site root holding `content/` and the config file
    pub site_dir: PathBuf,
    /// config file, looked up in `site_dir` when not given
    pub config: Option<PathBuf>,
    /// replaces `publishDir`
    pub output: Option<PathBuf>,
}

/// what one build produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// one per published document
    pub pages: usize,
    /// home, section, taxonomy, term, archive and 404 pages
    pub listings: usize,
    pub feeds: usize,
    /// everything written, copies included
    pub files: usize,
}

pub struct Folio {
    ctx: Context,
}

impl Folio {
    #[tracing::instrument(level = "trace")]
    pub async fn load(paths: Paths) -> Result<Self> {
        let config_path = match paths.config {
            Some(path) => path,
            None => find_config(&paths.site_dir)?,
        };
        let config = read_config(&config_path).await?;
        let dirs = Dirs::resolve(&paths.site_dir, &config, paths.output);
        check_output_dir(&dirs)?;

        Ok(Self {
            ctx: Context {
                build_drafts: config.build_drafts,
                dirs,
                config,
            },
        })
    }

    /// publishes drafts regardless of `buildDrafts`
    pub fn include_drafts(&mut self) {
        self.ctx.build_drafts = true;
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Renders the whole site and replaces the output directory with it.
    /// Nothing is written when any step fails.
    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn build(&self) -> Result<BuildSummary> {
        let ctx = Arc::new(self.ctx.clone());
        let tera = Arc::new(load_templates(&ctx).await?);
        let content = discover(&ctx).await?;

        let pages = LoadDocument {
            content_dir: ctx.dirs.content_dir.clone(),
            ugly_urls: ctx.config.ugly_urls,
        }
        .parallel()
        .chain(SkipDrafts {
            build_drafts: ctx.build_drafts,
        })
        .chain(
            RenderContent {
                tera: tera.clone(),
                markdown: MarkdownRenderer::new(&ctx.config.markup),
                assets: AssetResolver::new(ctx.dirs.content_dir.clone(), ctx.dirs.static_roots()),
                summary_length: ctx.config.summary_length,
            }
            .parallel(),
        )
        .process(content.documents)
        .await?;
        let site = SiteModel::assemble(pages, &ctx.config);

        let renderer = SiteRenderer::new(ctx.clone(), tera).await?;
        let (mut output, stats) = renderer.render_all(&site).await?;
        copy_static(&ctx, &mut output).await?;
        for resource in content.resources {
            let rel_path = resource
                .strip_prefix(&ctx.dirs.content_dir)
                .into_diagnostic()?
                .to_owned();
            output.insert_copy(rel_path, resource)?;
        }

        let files = output.write_to(&ctx.dirs.output_dir).await?;
        let summary = BuildSummary {
            pages: stats.pages,
            listings: stats.listings,
            feeds: stats.feeds,
            files,
        };
        tracing::info!(
            pages = summary.pages,
            listings = summary.listings,
            feeds = summary.feeds,
            "built {}",
            ctx.config.title
        );

        Ok(summary)
    }
}

/// theme static files first so the site can override them
async fn copy_static(ctx: &Context, output: &mut SiteOutput) -> Result<()> {
    for root in ctx.dirs.static_roots() {
        for file in walk_files(&root).await? {
            let rel_path = file.strip_prefix(&root).into_diagnostic()?.to_owned();
            output.insert_copy(rel_path, file)?;
        }
    }
    Ok(())
}

/// the output dir is wiped on every build, it must not hold the sources
fn check_output_dir(dirs: &Dirs) -> Result<(), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Invalid {
        field: "publishDir",
        reason: format!("cannot resolve the working directory: {e}"),
    })?;
    let output = resolve_dir(&cwd, &dirs.output_dir);
    let sources = [
        resolve_dir(&cwd, &dirs.site_dir),
        resolve_dir(&cwd, &dirs.content_dir),
    ];
    if sources.iter().any(|source| source.starts_with(&output)) {
        return Err(ConfigError::Invalid {
            field: "publishDir",
            reason: format!("{output:?} would delete the site sources when cleaned"),
        });
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` resolved. Symlinks are resolved
/// for the part of the path that exists.
fn resolve_dir(cwd: &Path, path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in cwd.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }

    let mut missing = Vec::new();
    let mut existing = resolved.as_path();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return missing.iter().rev().fold(canonical, |dir, part| dir.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_owned());
                existing = parent;
            }
            _ => return resolved.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn refuses_to_publish_over_the_sources() {
        let config = parse_config(Path::new("hugo.toml"), "baseURL = \"https://e.org\"").unwrap();
        let site = Path::new("/srv/site");

        assert!(check_output_dir(&Dirs::resolve(site, &config, None)).is_ok());
        assert!(check_output_dir(&Dirs::resolve(site, &config, Some(site.to_owned()))).is_err());
        assert!(check_output_dir(&Dirs::resolve(site, &config, Some("/srv".into()))).is_err());
        assert!(
            check_output_dir(&Dirs::resolve(site, &config, Some("/srv/site/content".into())))
                .is_err()
        );
    }

    #[test]
    fn parent_dirs_are_resolved_before_comparing() {
        let config = parse_config(
            Path::new("hugo.toml"),
            "baseURL = \"https://e.org\"\npublishDir = \"..\"",
        )
        .unwrap();
        let dirs = Dirs::resolve(Path::new("/srv/site"), &config, None);
        assert!(check_output_dir(&dirs).is_err());

        let config = parse_config(
            Path::new("hugo.toml"),
            "baseURL = \"https://e.org\"\npublishDir = \"content/../public\"",
        )
        .unwrap();
        let dirs = Dirs::resolve(Path::new("/srv/site"), &config, None);
        assert!(check_output_dir(&dirs).is_ok());
    }

    #[test]
    fn relative_dirs_resolve_against_the_working_dir() {
        let config = parse_config(Path::new("hugo.toml"), "baseURL = \"https://e.org\"").unwrap();

        let current = Dirs::resolve(Path::new("site"), &config, Some(".".into()));
        assert!(check_output_dir(&current).is_err());
        let dotted = Dirs::resolve(Path::new("./site"), &config, Some("site/.".into()));
        assert!(check_output_dir(&dotted).is_err());
        let sibling = Dirs::resolve(Path::new("site"), &config, Some("site-out".into()));
        assert!(check_output_dir(&sibling).is_ok());
    }
}
