use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use miette::{miette, Result};
use tera::{Context as TeraContext, Tera};
use tokio::sync::Mutex;

use crate::{markup::describe_tera_error, pipeline::ProcessingStep};

use super::style::Stylesheets;

/// one template invocation
pub struct RenderJob {
    pub template: String,
    /// stylesheet embedded as `style`, html pages only
    pub style: Option<String>,
    pub context: TeraContext,
    /// path below the output dir
    pub output: PathBuf,
    /// what the file is rendered from, for error messages
    pub origin: String,
}

pub struct RenderedFile {
    pub output: PathBuf,
    pub origin: String,
    pub contents: Vec<u8>,
}

pub struct RenderPage {
    pub tera: Arc<Tera>,
    pub styles: Arc<Mutex<Stylesheets>>,
}

#[async_trait]
impl ProcessingStep for RenderPage {
    type Input = RenderJob;
    type Output = RenderedFile;

    #[tracing::instrument(name = "render page", level = "trace", skip_all)]
    async fn process(&self, job: Self::Input) -> Result<Self::Output> {
        let RenderJob {
            template,
            style,
            mut context,
            output,
            origin,
        } = job;

        if let Some(style_name) = style {
            let mut styles = self.styles.lock().await;
            let style_embed = styles.get_style_embed(&style_name)?;
            context.insert("style", &style_embed);
        }

        let html = self
            .tera
            .render(&template, &context)
            .map_err(|e| miette!("rendering {origin} with `{template}`: {}", describe_tera_error(&e)))?;
        tracing::debug!("{origin} -> {output:?}");

        Ok(RenderedFile {
            output,
            origin,
            contents: html.into_bytes(),
        })
    }
}
