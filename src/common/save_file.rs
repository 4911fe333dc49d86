use std::path::PathBuf;

use async_trait::async_trait;
use miette::{IntoDiagnostic, Result, WrapErr};
use tokio::fs;

use crate::pipeline::ProcessingStep;

/// contents of one output file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    /// produced by the build
    Rendered(Vec<u8>),
    /// copied verbatim from a source file
    Copied(PathBuf),
}

pub struct SaveFile;

pub struct SaveFileParams {
    pub path: PathBuf,
    pub contents: Artifact,
}

#[async_trait]
impl ProcessingStep for SaveFile {
    type Input = SaveFileParams;
    type Output = ();

    #[tracing::instrument(name = "save file", level = "trace", skip_all)]
    async fn process(
        &self,
        SaveFileParams { path, contents }: Self::Input,
    ) -> Result<Self::Output> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.into_diagnostic()?;
            }
        }

        match contents {
            Artifact::Rendered(bytes) => fs::write(&path, bytes)
                .await
                .into_diagnostic()
                .wrap_err_with(|| format!("writing {path:?}"))?,
            Artifact::Copied(source) => {
                fs::copy(&source, &path)
                    .await
                    .into_diagnostic()
                    .wrap_err_with(|| format!("copying {source:?} to {path:?}"))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_and_copies_into_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, "copied").unwrap();

        SaveFile
            .process(SaveFileParams {
                path: dir.path().join("out/a/b.html"),
                contents: Artifact::Rendered(b"rendered".to_vec()),
            })
            .await
            .unwrap();
        SaveFile
            .process(SaveFileParams {
                path: dir.path().join("out/c/d.txt"),
                contents: Artifact::Copied(source),
            })
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("out/a/b.html")).unwrap(), "rendered");
        assert_eq!(std::fs::read_to_string(dir.path().join("out/c/d.txt")).unwrap(), "copied");
    }
}
