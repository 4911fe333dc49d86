use std::path::{Path, PathBuf};

use async_walkdir::WalkDir;
use futures::StreamExt;
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{IntoDiagnostic, Result, WrapErr};

use super::url::slash_path;
use crate::context::Context;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// files found below the content dir
#[derive(Clone, Debug, Default)]
pub struct ContentFiles {
    /// markdown documents, sorted by path
    pub documents: Vec<PathBuf>,
    /// everything else (images, attachments), sorted by path
    pub resources: Vec<PathBuf>,
}

/// loads the file listing of the content directory
pub struct DirLoader {
    base_path: PathBuf,
    ignored: GlobSet,
}

impl DirLoader {
    pub fn new(base_path: PathBuf, ignore_files: &[String]) -> Result<Self> {
        let globs = ignore_files
            .iter()
            .map(|g| Glob::new(g).into_diagnostic())
            .collect::<Result<Vec<_>>>()?;
        let ignored = build_glob_set(&globs).build().into_diagnostic()?;

        Ok(Self { base_path, ignored })
    }

    /// Asynchronously reads all the entries at the content location
    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn read_content(&self) -> Result<ContentFiles> {
        let mut content = ContentFiles::default();

        for path in walk_files(&self.base_path).await? {
            let rel_path = path.strip_prefix(&self.base_path).into_diagnostic()?;
            if self.ignored.is_match(slash_path(rel_path)) {
                tracing::debug!("ignoring {rel_path:?}");
                continue;
            }
            if is_markdown(&path) {
                content.documents.push(path);
            } else {
                content.resources.push(path);
            }
        }
        tracing::debug!(
            documents = content.documents.len(),
            resources = content.resources.len(),
            "content discovered"
        );

        Ok(content)
    }
}

/// lists the documents and resources of a site, honouring `ignoreFiles`
pub async fn discover(ctx: &Context) -> Result<ContentFiles> {
    DirLoader::new(ctx.dirs.content_dir.clone(), &ctx.config.ignore_files)?
        .read_content()
        .await
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy().to_lowercase();
            MARKDOWN_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Lists every non-hidden file below `base`, sorted.
/// A missing directory yields an empty list.
#[tracing::instrument(level = "trace")]
pub async fn walk_files(base: &Path) -> Result<Vec<PathBuf>> {
    if !base.exists() {
        return Ok(Vec::new());
    }
    let mut entries = WalkDir::new(base);
    let mut files = Vec::new();

    while let Some(res) = entries.next().await {
        match res {
            Ok(entry) => {
                let entry_path = entry.path();
                let rel_path = entry_path.strip_prefix(base).into_diagnostic()?;
                if rel_path.components().any(|c| is_hidden(Path::new(c.as_os_str()))) {
                    continue;
                }
                if entry_path.is_file() {
                    files.push(entry_path);
                }
            }
            Err(e) => {
                return Err(e)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("walking {base:?}"))
            }
        }
    }
    files.sort();

    Ok(files)
}

#[tracing::instrument(level = "trace")]
fn build_glob_set(globs: &Vec<Glob>) -> GlobSetBuilder {
    let mut builder = GlobSetBuilder::new();
    globs.iter().fold(&mut builder, |b, g| b.add(g.clone()));

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn splits_documents_from_resources() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        std::fs::create_dir_all(base.join("posts/bundle")).unwrap();
        std::fs::write(base.join("posts/b.md"), "").unwrap();
        std::fs::write(base.join("posts/a.md"), "").unwrap();
        std::fs::write(base.join("posts/bundle/index.md"), "").unwrap();
        std::fs::write(base.join("posts/bundle/shot.png"), "").unwrap();
        std::fs::write(base.join("posts/.DS_Store"), "").unwrap();
        std::fs::write(base.join("posts/wip.md"), "").unwrap();

        let loader = DirLoader::new(base.to_owned(), &["**/wip.md".to_owned()]).unwrap();
        let content = loader.read_content().await.unwrap();

        let docs: Vec<_> = content
            .documents
            .iter()
            .map(|p| slash_path(p.strip_prefix(base).unwrap()))
            .collect();
        assert_eq!(docs, vec!["posts/a.md", "posts/b.md", "posts/bundle/index.md"]);
        assert_eq!(content.resources.len(), 1);
    }

    #[tokio::test]
    async fn missing_dirs_are_empty() {
        let files = walk_files(Path::new("/definitely/not/here")).await.unwrap();
        assert!(files.is_empty());
    }
}
