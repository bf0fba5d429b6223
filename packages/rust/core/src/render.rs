//! External renderer invocation (combined markdown → PDF).
//!
//! The renderer is `pandoc` by default. It runs inside the topics directory so
//! relative image references in the combined file resolve.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{info, instrument};

use topicpress_shared::{RenderConfig, Result, TopicPressError};

/// Renderer styling and engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Renderer executable.
    pub command: String,
    /// Input markdown flavor.
    pub from: String,
    /// PDF engine.
    pub pdf_engine: String,
    /// Stylesheet path.
    pub stylesheet: Option<PathBuf>,
    /// Syntax highlighting style.
    pub highlight_style: Option<String>,
    /// Page size passed to the PDF engine.
    pub page_size: Option<String>,
    /// Page orientation passed to the PDF engine.
    pub orientation: Option<String>,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            command: config.command.clone(),
            from: config.from.clone(),
            pdf_engine: config.pdf_engine.clone(),
            stylesheet: config.stylesheet.as_ref().map(PathBuf::from),
            highlight_style: config.highlight_style.clone(),
            page_size: config.page_size.clone(),
            orientation: config.orientation.clone(),
        }
    }
}

/// One render job.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Combined markdown file.
    pub source: PathBuf,
    /// PDF destination.
    pub destination: PathBuf,
    /// Directory the renderer runs in.
    pub working_dir: PathBuf,
    /// Engine and styling options.
    pub options: RenderOptions,
}

impl RenderRequest {
    /// Make every path absolute against the current directory, since the
    /// renderer runs in `working_dir`.
    fn absolutize(&self) -> Result<Self> {
        let absolute = |p: &Path| {
            std::path::absolute(p).map_err(|e| TopicPressError::io(p, e))
        };

        let mut options = self.options.clone();
        options.stylesheet = options
            .stylesheet
            .as_deref()
            .map(absolute)
            .transpose()?;

        Ok(Self {
            source: absolute(&self.source)?,
            destination: absolute(&self.destination)?,
            working_dir: absolute(&self.working_dir)?,
            options,
        })
    }
}

/// Build the renderer's argument list.
pub fn pandoc_args(request: &RenderRequest) -> Vec<String> {
    let options = &request.options;
    let mut args = vec![
        request.source.display().to_string(),
        format!("--from={}", options.from),
        format!("--pdf-engine={}", options.pdf_engine),
        "--output".to_string(),
        request.destination.display().to_string(),
    ];

    if let Some(css) = &options.stylesheet {
        args.push("-c".to_string());
        args.push(css.display().to_string());
    }

    if let Some(style) = &options.highlight_style {
        args.push(format!("--highlight-style={style}"));
    }

    if let Some(size) = &options.page_size {
        args.push("--pdf-engine-opt=--page-size".to_string());
        args.push(format!("--pdf-engine-opt={size}"));
    }

    if let Some(orientation) = &options.orientation {
        args.push("--pdf-engine-opt=--orientation".to_string());
        args.push(format!("--pdf-engine-opt={orientation}"));
    }

    args
}

/// Run the renderer and wait for it to finish.
#[instrument(skip_all, fields(source = %request.source.display(), destination = %request.destination.display()))]
pub async fn render_pdf(request: &RenderRequest) -> Result<()> {
    let request = request.absolutize()?;

    if let Some(parent) = request.destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TopicPressError::write(parent, e))?;
    }

    let args = pandoc_args(&request);
    info!(command = %request.options.command, ?args, "starting renderer");

    let output = tokio::process::Command::new(&request.options.command)
        .args(&args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            TopicPressError::render(format!(
                "failed to spawn {}: {e}",
                request.options.command
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TopicPressError::render(format!(
            "{} exited with status {}: {}",
            request.options.command,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    info!(destination = %request.destination.display(), "PDF rendered");

    Ok(())
}
