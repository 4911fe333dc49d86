use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use miette::{IntoDiagnostic, Result};
use tokio::fs;

use crate::{
    common::{Artifact, SaveFile, SaveFileParams},
    error::OutputError,
    pipeline::{ProcessingStep, ProcessingStepParallel},
};

struct Entry {
    /// what produced the file, used in conflict reports
    origin: String,
    artifact: Artifact,
}

/// Every file of a build, keyed by its path below the output dir.
///
/// Nothing touches the disk until [`SiteOutput::write_to`], so a failed build
/// leaves the previous output in place.
#[derive(Default)]
pub struct SiteOutput {
    entries: BTreeMap<PathBuf, Entry>,
}

impl SiteOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a generated file. Generated files never replace anything.
    pub fn insert_rendered(
        &mut self,
        path: PathBuf,
        origin: impl Into<String>,
        contents: Vec<u8>,
    ) -> Result<(), OutputError> {
        let origin = origin.into();
        if let Some(existing) = self.entries.get(&path) {
            return Err(OutputError::Conflict {
                path,
                first: existing.origin.clone(),
                second: origin,
            });
        }
        self.entries.insert(
            path,
            Entry {
                origin,
                artifact: Artifact::Rendered(contents),
            },
        );
        Ok(())
    }

    /// Adds a verbatim copy of `source`. A later copy replaces an earlier one,
    /// a generated file cannot be replaced.
    pub fn insert_copy(&mut self, path: PathBuf, source: PathBuf) -> Result<(), OutputError> {
        let origin = source.display().to_string();
        match self.entries.get(&path) {
            Some(Entry {
                origin: first,
                artifact: Artifact::Rendered(_),
            }) => {
                return Err(OutputError::Conflict {
                    path,
                    first: first.clone(),
                    second: origin,
                })
            }
            Some(previous) => tracing::debug!("{origin} overrides {}", previous.origin),
            None => {}
        }
        self.entries.insert(
            path,
            Entry {
                origin,
                artifact: Artifact::Copied(source),
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// contents of a generated file
    pub fn rendered(&self, path: &Path) -> Option<&[u8]> {
        match &self.entries.get(path)?.artifact {
            Artifact::Rendered(contents) => Some(contents),
            Artifact::Copied(_) => None,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Replaces `dir` with the contents of this set.
    #[tracing::instrument(level = "trace", skip(self))]
    pub async fn write_to(self, dir: &Path) -> Result<usize> {
        if dir.exists() {
            fs::remove_dir_all(dir).await.into_diagnostic()?;
        }
        fs::create_dir_all(dir).await.into_diagnostic()?;

        let files: Vec<SaveFileParams> = self
            .entries
            .into_iter()
            .map(|(path, entry)| SaveFileParams {
                path: dir.join(path),
                contents: entry.artifact,
            })
            .collect();
        let count = files.len();
        SaveFile.parallel().process(files).await?;
        tracing::info!("wrote {count} files to {dir:?}");

        Ok(count)
    }
}
