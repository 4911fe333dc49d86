use std::path::{Path, PathBuf};

use crate::{
    data::{url::slash_path, Document},
    error::DocumentError,
};

/// Resolves asset references of documents against the files of the site
#[derive(Clone, Debug)]
pub struct AssetResolver {
    content_dir: PathBuf,
    /// lowest priority first
    static_roots: Vec<PathBuf>,
}

impl AssetResolver {
    pub fn new(content_dir: PathBuf, static_roots: Vec<PathBuf>) -> Self {
        Self {
            content_dir,
            static_roots,
        }
    }

    /// Checks a reference made by `doc`.
    ///
    /// Remote urls are not checked, `/path` is looked up in the static
    /// roots and the content dir, anything else next to the document.
    pub fn check(&self, doc: &Document, src: &str) -> Result<(), DocumentError> {
        self.locate(doc, src).map(|_| ())
    }

    /// Like [`AssetResolver::check`], returning the site relative url of the
    /// asset. Remote urls come back unchanged.
    pub fn locate(&self, doc: &Document, src: &str) -> Result<String, DocumentError> {
        if is_remote(src) {
            return Ok(src.to_owned());
        }
        let path = strip_query(src);
        let found = match path.strip_prefix('/') {
            Some(site_path) => self.exists_in_site(site_path).then(|| src.to_owned()),
            None => doc
                .source
                .parent()
                .is_some_and(|dir| dir.join(path).is_file())
                .then(|| {
                    // content resources are published under their content path
                    let dir = doc.rel_path.parent().map(slash_path).unwrap_or_default();
                    if dir.is_empty() {
                        format!("/{src}")
                    } else {
                        format!("/{dir}/{src}")
                    }
                }),
        };
        found.ok_or_else(|| self.missing(doc, src))
    }

    /// locates a path that is always relative to the site root
    pub fn locate_site_path(&self, doc: &Document, src: &str) -> Result<String, DocumentError> {
        if is_remote(src) {
            return Ok(src.to_owned());
        }
        let site_path = strip_query(src).trim_start_matches('/');
        if self.exists_in_site(site_path) {
            Ok(format!("/{}", src.trim_start_matches('/')))
        } else {
            Err(self.missing(doc, src))
        }
    }

    fn missing(&self, doc: &Document, src: &str) -> DocumentError {
        DocumentError::MissingAsset {
            path: doc.rel_path.clone(),
            asset: src.to_owned(),
        }
    }

    fn exists_in_site(&self, site_path: &str) -> bool {
        self.static_roots
            .iter()
            .chain(std::iter::once(&self.content_dir))
            .any(|root| root.join(Path::new(site_path)).is_file())
    }
}

fn is_remote(src: &str) -> bool {
    src.starts_with("//") || src.starts_with("data:") || src.contains("://")
}

fn strip_query(src: &str) -> &str {
    src.split(['?', '#']).next().unwrap_or(src)
}
