use std::path::{Path, PathBuf};

use crate::config::SiteConfig;

/// resolved locations of one site
#[derive(Clone, Debug)]
pub struct Dirs {
    pub site_dir: PathBuf,
    pub content_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    /// `themes/<name>` when a theme is configured
    pub theme_dir: Option<PathBuf>,
}

impl Dirs {
    pub fn resolve(site_dir: &Path, config: &SiteConfig, output: Option<PathBuf>) -> Self {
        let theme_dir = config
            .theme
            .as_ref()
            .map(|name| site_dir.join(&config.themes_dir).join(name));

        Self {
            site_dir: site_dir.to_owned(),
            content_dir: site_dir.join(&config.content_dir),
            static_dir: site_dir.join(&config.static_dir),
            output_dir: output.unwrap_or_else(|| site_dir.join(&config.publish_dir)),
            theme_dir,
        }
    }

    pub fn theme_template_dir(&self) -> Option<PathBuf> {
        self.theme_dir.as_ref().map(|d| d.join("templates"))
    }

    pub fn theme_style_dir(&self) -> Option<PathBuf> {
        self.theme_dir.as_ref().map(|d| d.join("styles"))
    }

    /// static roots ordered from lowest to highest priority
    pub fn static_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(2);
        if let Some(theme) = &self.theme_dir {
            roots.push(theme.join("static"));
        }
        roots.push(self.static_dir.clone());
        roots
    }
}

/// everything a build needs to know, immutable for its duration
#[derive(Clone, Debug)]
pub struct Context {
    pub dirs: Dirs,
    pub config: SiteConfig,
    pub build_drafts: bool,
}
