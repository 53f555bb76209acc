// Renderers: pure functions from a ResumeRecord to one output byte format.
// HTML is the projection the PDF and image renderers lay out; DOCX is built
// structurally from the record and shares only the section projection.
// Every render is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod raster;
pub mod sections;
pub mod theme;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::resume::ResumeRecord;

pub use docx::DocxRenderer;
pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;
pub use raster::ImageRenderer;
pub use theme::ThemeAssets;

// ────────────────────────────────────────────────────────────────────────────
// Output formats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Pdf,
    Jpg,
    Docx,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Html,
        OutputFormat::Pdf,
        OutputFormat::Jpg,
        OutputFormat::Docx,
    ];

    /// Parses a path segment such as `pdf` or `jpeg`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "pdf" => Some(OutputFormat::Pdf),
            "jpg" | "jpeg" => Some(OutputFormat::Jpg),
            "docx" => Some(OutputFormat::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html; charset=utf-8",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// HTML is previewed in the browser; everything else downloads.
    pub fn is_attachment(self) -> bool {
        self != OutputFormat::Html
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutputFormat::Html => "HTML",
            OutputFormat::Pdf => "PDF",
            OutputFormat::Jpg => "JPEG",
            OutputFormat::Docx => "DOCX",
        };
        f.write_str(label)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Failures
// ────────────────────────────────────────────────────────────────────────────

/// Renderer-internal failure. Not user-correctable; carries the engine's
/// error class and message for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{format} rendering failed: {engine_class}: {message}")]
pub struct RenderFailure {
    pub format: OutputFormat,
    pub engine_class: String,
    pub message: String,
}

impl RenderFailure {
    pub fn from_engine<E: std::error::Error>(format: OutputFormat, err: E) -> Self {
        Self::with_class(format, std::any::type_name::<E>(), err.to_string())
    }

    pub fn with_class(
        format: OutputFormat,
        engine_class: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            format,
            engine_class: engine_class.into(),
            message: message.into(),
        }
    }
}

/// Layout grew past a hard output bound (pages or pixels).
#[derive(Debug, Clone, Error)]
#[error("{what} limit exceeded: {actual} > {limit}")]
pub struct LimitExceeded {
    pub what: &'static str,
    pub actual: usize,
    pub limit: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Dispatch
// ────────────────────────────────────────────────────────────────────────────

/// A renderer for one output format.
pub trait Renderer: Send + Sync {
    fn format(&self) -> OutputFormat;
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderFailure>;
}

/// Rendered bytes plus the metadata the boundary needs to serve them.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

/// All four renderers, sharing one HTML projection and one set of theme assets.
#[derive(Clone)]
pub struct RenderSet {
    html: Arc<HtmlRenderer>,
    pdf: Arc<PdfRenderer>,
    image: Arc<ImageRenderer>,
    docx: Arc<DocxRenderer>,
}

impl RenderSet {
    pub fn new(themes: ThemeAssets, template_dir: Option<&Path>) -> Self {
        let themes = Arc::new(themes);
        let html = Arc::new(HtmlRenderer::new(themes.clone(), template_dir));
        Self::from_html(html, themes)
    }

    pub fn from_html(html: Arc<HtmlRenderer>, themes: Arc<ThemeAssets>) -> Self {
        Self {
            pdf: Arc::new(PdfRenderer::new(html.clone(), themes.clone())),
            image: Arc::new(ImageRenderer::new(html.clone(), themes)),
            docx: Arc::new(DocxRenderer::new()),
            html,
        }
    }

    pub fn renderer(&self, format: OutputFormat) -> &dyn Renderer {
        match format {
            OutputFormat::Html => self.html.as_ref(),
            OutputFormat::Pdf => self.pdf.as_ref(),
            OutputFormat::Jpg => self.image.as_ref(),
            OutputFormat::Docx => self.docx.as_ref(),
        }
    }

    pub fn render(
        &self,
        format: OutputFormat,
        record: &ResumeRecord,
    ) -> Result<Artifact, RenderFailure> {
        let bytes = self.renderer(format).render(record)?;
        info!(%format, bytes = bytes.len(), "Rendered resume");
        Ok(Artifact { format, bytes })
    }
}
